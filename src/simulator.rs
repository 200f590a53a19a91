//! The Simulation Driver: the main dispatch loop tying every other component
//! together.

use crate::config::SimOptions;
use crate::dispatch;
use crate::error::SimError;
use crate::srea::SreaOracle;
use crate::stn::{Stn, VertexId};
use crate::strategy::{Strategy, StrategyDispatcher};
use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::str::FromStr;

/// The outcome of one `simulate` call.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// `false` iff the run ended on an inconsistency or a dead-end
    /// selection; `true` once every timepoint has fired.
    pub success: bool,
    /// Every vertex's firing time, or `None` if it never fired (only
    /// possible when `success` is `false`).
    pub assigned_times: HashMap<VertexId, Option<f64>>,
    pub num_reschedules: u32,
    pub num_sent_schedules: u32,
}

/// Owns the deterministic RNG used to resample contingent durations. Each
/// `simulate` call is a fully independent run: the three working STNs and
/// the rescheduling counters are local to the call, only the RNG persists
/// across calls on the same `Simulator`.
pub struct Simulator {
    rng: StdRng,
}

impl Simulator {
    /// `seed` fixes the RNG for reproducible runs. Without one, the
    /// simulator still runs, just non-deterministically.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Simulator { rng }
    }

    /// Run one simulation of `starting_stn` under `strategy`, consulting
    /// `oracle` for SREA calls.
    pub fn simulate(
        &mut self,
        starting_stn: &Stn,
        strategy: &str,
        oracle: &dyn SreaOracle,
        opts: &SimOptions,
    ) -> Result<SimulationReport, SimError> {
        let strategy = Strategy::from_str(strategy)?;

        let mut stn = starting_stn.clone();
        stn.resample_all(&mut self.rng);
        let mut assignment_stn = stn.clone();
        let mut guide_stn = stn.clone();

        // Consistency can fail before the first dispatch too, if the
        // starting network is already inconsistent.
        if !stn.clone().floyd_warshall() {
            warn!("starting network is already inconsistent");
            let assigned_times = assignment_stn
                .vertex_ids()
                .into_iter()
                .map(|id| (id, assignment_stn.get_assigned_time(id)))
                .collect();
            return Ok(SimulationReport {
                success: false,
                assigned_times,
                num_reschedules: 0,
                num_sent_schedules: 0,
            });
        }

        let mut current_time = 0.0f64;
        let mut current_alpha = 0.0f64;
        let mut first_run = true;
        let mut executed_contingent = false;

        let mut dispatcher = StrategyDispatcher::new(oracle);

        let success = loop {
            if stn.all_executed() {
                break true;
            }

            let (new_alpha, new_guide) = dispatcher.get_guide(
                strategy,
                current_alpha,
                &guide_stn,
                &stn,
                first_run,
                executed_contingent,
                opts,
            );
            current_alpha = new_alpha;
            guide_stn = new_guide;

            let selected = dispatch::select_next_timepoint(&stn, &guide_stn, current_time);
            let (v, t, was_contingent) = match selected {
                Some(x) => x,
                None => {
                    warn!("no selectable timepoint with unassigned vertices remaining; treating as inconsistency");
                    break false;
                }
            };
            executed_contingent = was_contingent;

            guide_stn.assign_timepoint(v, t);
            stn.assign_timepoint(v, t);
            assignment_stn.assign_timepoint(v, t);

            let mut propagated = stn.clone();
            if !propagated.floyd_warshall() {
                break false;
            }
            stn = propagated;
            stn.remove_old_timepoints();

            current_time = t;
            first_run = false;
        };

        let assigned_times = assignment_stn
            .vertex_ids()
            .into_iter()
            .map(|id| (id, assignment_stn.get_assigned_time(id)))
            .collect();

        Ok(SimulationReport {
            success,
            assigned_times,
            num_reschedules: dispatcher.num_reschedules,
            num_sent_schedules: dispatcher.num_sent_schedules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srea::ReferenceSrea;
    use crate::stn::{Distribution, Z};

    #[test]
    fn unknown_strategy_fails_fast() {
        let mut sim = Simulator::new(Some(1));
        let stn = Stn::new();
        let oracle = ReferenceSrea::new();
        let err = sim
            .simulate(&stn, "not-a-real-strategy", &oracle, &SimOptions::default())
            .unwrap_err();
        assert_eq!(err, SimError::UnknownStrategy("not-a-real-strategy".to_string()));
    }

    #[test]
    fn scenario_s1_trivial_early() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 5.0);
        stn.add_requirement_edge(1, Z, -5.0);

        let mut sim = Simulator::new(Some(1));
        let oracle = ReferenceSrea::new();
        let report = sim.simulate(&stn, "early", &oracle, &SimOptions::default()).unwrap();

        assert!(report.success);
        assert_eq!(report.assigned_times.get(&Z), Some(&Some(0.0)));
        assert_eq!(report.assigned_times.get(&1), Some(&Some(5.0)));
        assert_eq!(report.num_reschedules, 0);
    }

    #[test]
    fn scenario_s3_inconsistent_network_fails() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 1.0);
        stn.add_requirement_edge(1, Z, -5.0);

        let mut sim = Simulator::new(Some(1));
        let oracle = ReferenceSrea::new();
        let report = sim.simulate(&stn, "early", &oracle, &SimOptions::default()).unwrap();
        assert!(!report.success);
    }

    #[test]
    fn determinism_same_seed_same_outcome() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 0.0);
        stn.update_edge(1, Z, 0.0, true, true);
        stn.add_contingent_edge(1, 2, Distribution::Uniform { lo: 2.0, hi: 4.0 });

        let oracle = ReferenceSrea::new();
        let opts = SimOptions::default();

        let mut sim1 = Simulator::new(Some(7));
        let report1 = sim1.simulate(&stn, "srea", &oracle, &opts).unwrap();
        let mut sim2 = Simulator::new(Some(7));
        let report2 = sim2.simulate(&stn, "srea", &oracle, &opts).unwrap();

        assert_eq!(report1.assigned_times, report2.assigned_times);
        assert_eq!(report1.num_reschedules, report2.num_reschedules);
        assert_eq!(report1.num_sent_schedules, report2.num_sent_schedules);
    }

    #[test]
    fn counter_law_holds() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 0.0);
        stn.update_edge(1, Z, 0.0, true, true);
        stn.add_contingent_edge(1, 2, Distribution::Uniform { lo: 2.0, hi: 4.0 });
        stn.add_contingent_edge(1, 3, Distribution::Uniform { lo: 1.0, hi: 2.0 });

        let mut sim = Simulator::new(Some(3));
        let oracle = ReferenceSrea::new();
        let report = sim
            .simulate(&stn, "drea-ar", &oracle, &SimOptions::default())
            .unwrap();
        assert!(report.num_sent_schedules <= report.num_reschedules);
    }
}
