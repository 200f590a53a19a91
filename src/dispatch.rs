//! The Dispatch Selector: chooses the next enabled timepoint and its firing
//! time on the current guide STN.

use crate::stn::{Stn, Z};
use log::warn;

/// Select the next timepoint to fire.
///
/// Takes the *working* network (`working`) and the *guide* network
/// (`guide`) as separate parameters rather than one implicit field: the
/// non-contingent branch below intentionally reads predecessor assigned
/// times from `working`, not `guide`. This mirrors the source this core was
/// distilled from, which consults the simulator's own working STN rather
/// than the dispatch schedule it was just handed — preserved here rather
/// than "fixed", per the design notes' open question on this behavior.
///
/// Returns `(vertex, time, was_contingent)` for the earliest-firing enabled
/// vertex, or `None` if nothing is enabled.
pub fn select_next_timepoint(working: &Stn, guide: &Stn, _current_time: f64) -> Option<(u32, f64, bool)> {
    let mut best: Option<(u32, f64, bool)> = None;

    for v in guide.vertex_ids() {
        if v == Z || guide.is_executed(v) {
            continue;
        }

        let preds = guide.get_incoming(v);
        let enabled = preds.iter().all(|e| guide.is_executed(e.i));
        if !enabled {
            continue;
        }

        let (earliest, was_contingent) = match guide.get_incoming_contingent(v) {
            Some(cont_edge) => {
                let source = cont_edge.i;
                let duration = cont_edge.sampled_time().unwrap_or(0.0);
                match guide.get_assigned_time(source) {
                    Some(t) => (t + duration, true),
                    None => {
                        warn!(
                            "contingent source {} has no assigned time in the guide; recovering via upper bound",
                            source
                        );
                        let recovered = guide.get_edge_weight(Z, source).unwrap_or(f64::INFINITY);
                        (recovered, true)
                    }
                }
            }
            None => {
                if preds.is_empty() {
                    (0.0, false)
                } else {
                    let earliest = preds
                        .iter()
                        .filter_map(|e| working.get_assigned_time(e.i).map(|t| e.get_weight_min() + t))
                        .fold(f64::NEG_INFINITY, f64::max);
                    (earliest, false)
                }
            }
        };

        match &best {
            Some((_, best_t, _)) if *best_t <= earliest => {}
            _ => best = Some((v, earliest, was_contingent)),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stn::Distribution;
    use rand::SeedableRng;

    #[test]
    fn picks_earliest_requirement_successor() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 5.0);
        stn.add_requirement_edge(Z, 2, 2.0);
        let (v, t, was_contingent) = select_next_timepoint(&stn, &stn, 0.0).unwrap();
        assert_eq!(v, 2);
        assert_eq!(t, 2.0);
        assert!(!was_contingent);
    }

    #[test]
    fn skips_disabled_and_executed_vertices() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 5.0);
        stn.add_requirement_edge(1, 2, 3.0);
        // 2 is blocked behind 1, which has not fired yet.
        let (v, _, _) = select_next_timepoint(&stn, &stn, 0.0).unwrap();
        assert_eq!(v, 1);
    }

    #[test]
    fn contingent_successor_uses_sampled_duration() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 0.0);
        stn.update_edge(1, Z, 0.0, true, true);
        stn.mark_executed(1);
        stn.add_contingent_edge(1, 2, Distribution::Uniform { lo: 2.0, hi: 4.0 });
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        stn.contingent_edges_mut().next().unwrap().resample(&mut rng);
        let (v, t, was_contingent) = select_next_timepoint(&stn, &stn, 0.0).unwrap();
        assert_eq!(v, 2);
        assert!(was_contingent);
        assert!(t >= 2.0 && t <= 4.0);
    }
}
