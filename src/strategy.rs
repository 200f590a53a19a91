//! The Strategy Dispatcher: the seven execution strategies, and the
//! SI/ALP/AR tests they share.

use crate::config::SimOptions;
use crate::srea::SreaOracle;
use crate::stn::Stn;
use log::debug;
use std::str::FromStr;

/// One of the seven execution strategies named in the simulator's public
/// contract. The exact literal strings below are the only accepted spelling
/// — anything else is rejected by [`FromStr`] before a simulation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Early,
    Srea,
    Drea,
    DreaSi,
    DreaAlp,
    DreaAr,
    Arsi,
}

impl FromStr for Strategy {
    type Err = crate::error::SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "early" => Ok(Strategy::Early),
            "srea" => Ok(Strategy::Srea),
            "drea" => Ok(Strategy::Drea),
            "drea-si" => Ok(Strategy::DreaSi),
            "drea-alp" => Ok(Strategy::DreaAlp),
            "drea-ar" => Ok(Strategy::DreaAr),
            "arsi" => Ok(Strategy::Arsi),
            other => Err(crate::error::SimError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Number of received (contingent-target) timepoints in `stn` that have not
/// yet fired.
pub fn remaining_contingent_count(stn: &Stn) -> usize {
    stn.received_timepoints()
        .filter(|&&id| !stn.is_executed(id))
        .count()
}

/// Stochastic Improvement test: adopt the new guide iff the gain in
/// all-contingents-succeed probability exceeds `threshold`.
pub fn si_test(previous_alpha: f64, new_alpha: f64, remaining_contingents: usize, threshold: f64) -> bool {
    let k = remaining_contingents as i32;
    let p0 = (1.0 - previous_alpha).powi(k);
    let p1 = (1.0 - new_alpha).powi(k);
    p1 - p0 > threshold
}

/// Alpha-difference test: adopt iff the raw risk parameter moved by more
/// than `threshold`.
pub fn alp_test(previous_alpha: f64, new_alpha: f64, threshold: f64) -> bool {
    (new_alpha - previous_alpha).abs() > threshold
}

/// Allowable-Risk test: smallest `n >= 1` with `(1 - previous_alpha)^(n+1) <= threshold`,
/// capped at 100 iterations as a divergence guard (needed when `previous_alpha >= 1`,
/// where the search would otherwise never terminate).
pub fn ar_bound(previous_alpha: f64, threshold: f64) -> u32 {
    let mut n = 0u32;
    let mut attempts = 0u32;
    while (1.0 - previous_alpha).powi((n + 1) as i32) > threshold && attempts < 100 {
        n += 1;
        attempts += 1;
    }
    n
}

/// Owns the rescheduling counters and the SREA collaborator, and implements
/// `get_guide` for all seven strategies. Counters accumulate across calls;
/// read `num_reschedules`/`num_sent_schedules` back after a run completes.
pub struct StrategyDispatcher<'a> {
    oracle: &'a dyn SreaOracle,
    pub num_reschedules: u32,
    pub num_sent_schedules: u32,
    ar_contingent_event_counter: u32,
}

impl<'a> StrategyDispatcher<'a> {
    pub fn new(oracle: &'a dyn SreaOracle) -> Self {
        StrategyDispatcher {
            oracle,
            num_reschedules: 0,
            num_sent_schedules: 0,
            ar_contingent_event_counter: 0,
        }
    }

    /// Dispatch on `strategy`, consuming `working_stn` (the driver's current
    /// working network — SREA always runs against this, not the previous
    /// guide) and returning the new `(alpha, guide)` pair.
    pub fn get_guide(
        &mut self,
        strategy: Strategy,
        previous_alpha: f64,
        previous_guide: &Stn,
        working_stn: &Stn,
        first_run: bool,
        executed_contingent: bool,
        opts: &SimOptions,
    ) -> (f64, Stn) {
        match strategy {
            Strategy::Early => (1.0, working_stn.clone()),
            Strategy::Srea => self.srea_algorithm(previous_alpha, previous_guide, working_stn, first_run),
            Strategy::Drea => {
                self.drea_algorithm(previous_alpha, previous_guide, working_stn, first_run, executed_contingent)
            }
            Strategy::DreaSi => self.drea_si_algorithm(
                previous_alpha,
                previous_guide,
                working_stn,
                first_run,
                executed_contingent,
                opts.si_threshold,
            ),
            Strategy::DreaAlp => self.drea_alp_algorithm(
                previous_alpha,
                previous_guide,
                working_stn,
                first_run,
                executed_contingent,
                opts.alp_threshold,
            ),
            Strategy::DreaAr => {
                if executed_contingent {
                    self.ar_contingent_event_counter += 1;
                }
                let (alpha, guide, counter) = self.drea_ar_algorithm(
                    previous_alpha,
                    previous_guide,
                    working_stn,
                    first_run,
                    executed_contingent,
                    opts.ar_threshold,
                    self.ar_contingent_event_counter,
                );
                self.ar_contingent_event_counter = counter;
                (alpha, guide)
            }
            Strategy::Arsi => {
                if executed_contingent {
                    self.ar_contingent_event_counter += 1;
                }
                let (alpha, guide, counter) = self.arsi_algorithm(
                    previous_alpha,
                    previous_guide,
                    working_stn,
                    first_run,
                    executed_contingent,
                    self.ar_contingent_event_counter,
                    opts.ar_threshold,
                    opts.si_threshold,
                );
                self.ar_contingent_event_counter = counter;
                (alpha, guide)
            }
        }
    }

    /// Call SREA on `working_stn`; fall back to `(previous_alpha, previous_guide)`
    /// unchanged if it reports infeasibility.
    fn srea_wrapper(&self, previous_alpha: f64, previous_guide: &Stn, working_stn: &Stn) -> (f64, Stn) {
        match self.oracle.srea(working_stn) {
            Some((alpha, guide)) => (alpha, guide),
            None => (previous_alpha, previous_guide.clone()),
        }
    }

    fn srea_algorithm(&mut self, previous_alpha: f64, previous_guide: &Stn, working_stn: &Stn, first_run: bool) -> (f64, Stn) {
        if !first_run {
            return (previous_alpha, previous_guide.clone());
        }
        self.num_reschedules += 1;
        self.num_sent_schedules += 1;
        self.srea_wrapper(previous_alpha, previous_guide, working_stn)
    }

    fn drea_algorithm(
        &mut self,
        previous_alpha: f64,
        previous_guide: &Stn,
        working_stn: &Stn,
        first_run: bool,
        executed_contingent: bool,
    ) -> (f64, Stn) {
        if !(first_run || executed_contingent) {
            return (previous_alpha, previous_guide.clone());
        }
        self.num_reschedules += 1;
        self.num_sent_schedules += 1;
        let (alpha, guide) = self.srea_wrapper(previous_alpha, previous_guide, working_stn);
        debug!("drea: rescheduled, new alpha = {}", alpha);
        (alpha, guide)
    }

    fn drea_si_algorithm(
        &mut self,
        previous_alpha: f64,
        previous_guide: &Stn,
        working_stn: &Stn,
        first_run: bool,
        executed_contingent: bool,
        threshold: f64,
    ) -> (f64, Stn) {
        if first_run {
            let result = self.oracle.srea(working_stn);
            self.num_reschedules += 1;
            self.num_sent_schedules += 1;
            return match result {
                None => (previous_alpha, previous_guide.clone()),
                Some((alpha, guide)) => {
                    debug!("drea-si: adopting first-run guide (alpha = {})", alpha);
                    (alpha, guide)
                }
            };
        }
        if !executed_contingent {
            return (previous_alpha, previous_guide.clone());
        }
        let result = self.oracle.srea(working_stn);
        self.num_reschedules += 1;
        match result {
            None => (previous_alpha, previous_guide.clone()),
            Some((new_alpha, maybe_guide)) => {
                let k = remaining_contingent_count(&maybe_guide);
                if si_test(previous_alpha, new_alpha, k, threshold) {
                    self.num_sent_schedules += 1;
                    debug!("drea-si: adopting new guide (alpha = {})", new_alpha);
                    (new_alpha, maybe_guide)
                } else {
                    debug!("drea-si: suppressed reschedule (remaining_contingents = {})", k);
                    (previous_alpha, previous_guide.clone())
                }
            }
        }
    }

    fn drea_alp_algorithm(
        &mut self,
        previous_alpha: f64,
        previous_guide: &Stn,
        working_stn: &Stn,
        first_run: bool,
        executed_contingent: bool,
        threshold: f64,
    ) -> (f64, Stn) {
        if first_run {
            self.num_reschedules += 1;
            self.num_sent_schedules += 1;
            return match self.oracle.srea(working_stn) {
                None => (previous_alpha, previous_guide.clone()),
                Some((alpha, guide)) => {
                    debug!("drea-alp: adopting first-run guide (alpha = {})", alpha);
                    (alpha, guide)
                }
            };
        }
        if !executed_contingent {
            return (previous_alpha, previous_guide.clone());
        }
        let result = self.oracle.srea(working_stn);
        self.num_reschedules += 1;
        match result {
            None => (previous_alpha, previous_guide.clone()),
            Some((new_alpha, maybe_guide)) => {
                if alp_test(previous_alpha, new_alpha, threshold) {
                    self.num_sent_schedules += 1;
                    debug!("drea-alp: adopting new guide (alpha delta = {})", (new_alpha - previous_alpha).abs());
                    (new_alpha, maybe_guide)
                } else {
                    (previous_alpha, previous_guide.clone())
                }
            }
        }
    }

    fn drea_ar_algorithm(
        &mut self,
        previous_alpha: f64,
        previous_guide: &Stn,
        working_stn: &Stn,
        first_run: bool,
        executed_contingent: bool,
        threshold: f64,
        contingent_event_counter: u32,
    ) -> (f64, Stn, u32) {
        if first_run {
            if let Some((alpha, guide)) = self.oracle.srea(working_stn) {
                self.num_reschedules += 1;
                self.num_sent_schedules += 1;
                return (alpha, guide, contingent_event_counter);
            }
        }
        if !executed_contingent {
            return (previous_alpha, previous_guide.clone(), contingent_event_counter);
        }
        let n = ar_bound(previous_alpha, threshold);
        let mut new_counter = contingent_event_counter;
        if contingent_event_counter >= n || first_run {
            if let Some((new_alpha, maybe_guide)) = self.oracle.srea(working_stn) {
                new_counter = 0;
                self.num_reschedules += 1;
                self.num_sent_schedules += 1;
                debug!("drea-ar: rescheduled (alpha = {})", new_alpha);
                return (new_alpha, maybe_guide, new_counter);
            }
        }
        (previous_alpha, previous_guide.clone(), new_counter)
    }

    #[allow(clippy::too_many_arguments)]
    fn arsi_algorithm(
        &mut self,
        previous_alpha: f64,
        previous_guide: &Stn,
        working_stn: &Stn,
        first_run: bool,
        executed_contingent: bool,
        contingent_event_counter: u32,
        ar_threshold: f64,
        si_threshold: f64,
    ) -> (f64, Stn, u32) {
        if first_run {
            return match self.oracle.srea(working_stn) {
                Some((alpha, guide)) => {
                    self.num_reschedules += 1;
                    self.num_sent_schedules += 1;
                    (alpha, guide, contingent_event_counter)
                }
                None => (previous_alpha, previous_guide.clone(), contingent_event_counter),
            };
        }
        if !executed_contingent {
            return (previous_alpha, previous_guide.clone(), contingent_event_counter);
        }

        let n = ar_bound(previous_alpha, ar_threshold);
        let result = if contingent_event_counter >= n {
            debug!("arsi: attempting reschedule");
            let r = self.oracle.srea(working_stn);
            self.num_reschedules += 1;
            r
        } else {
            None
        };
        let (new_alpha, maybe_guide) = match result {
            Some(r) => r,
            None => return (previous_alpha, previous_guide.clone(), contingent_event_counter),
        };

        let k = remaining_contingent_count(&maybe_guide);
        if si_test(previous_alpha, new_alpha, k, si_threshold) {
            self.num_sent_schedules += 1;
            debug!("arsi: adopting new guide (alpha = {})", new_alpha);
            (new_alpha, maybe_guide, 0)
        } else {
            (previous_alpha, previous_guide.clone(), contingent_event_counter)
        }
    }
}
