//! The SREA oracle collaborator.
//!
//! The Static Robust Execution Algorithm itself is out of scope for this
//! crate: it is treated as a pluggable solver reached through the
//! [`SreaOracle`] trait. [`ReferenceSrea`] is a deterministic stand-in good
//! enough to drive the strategy dispatcher end to end and to make every
//! strategy runnable without an external solver; it is not a claim that it
//! computes a real robustness guarantee.

use crate::stn::Stn;

/// `srea(stn) -> (alpha, guide) | None`. `None` signals infeasibility.
pub trait SreaOracle {
    fn srea(&self, stn: &Stn) -> Option<(f64, Stn)>;
}

/// A deterministic reference oracle.
///
/// Declares the network infeasible iff it is temporally inconsistent
/// (`stn.floyd_warshall()` fails); otherwise returns the propagated network
/// as the guide, with `alpha` set to a risk estimate that decreases
/// monotonically as fewer contingent timepoints remain to fire — the same
/// qualitative shape as a real SREA's risk parameter (risk shrinks as the
/// plan nears completion) without attempting the real algorithm's
/// optimization over contingent-edge shrinking.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceSrea {
    /// Risk contributed by each still-unexecuted contingent timepoint.
    per_contingent_risk: f64,
}

impl ReferenceSrea {
    pub fn new() -> Self {
        ReferenceSrea {
            per_contingent_risk: 0.05,
        }
    }

    pub fn with_per_contingent_risk(per_contingent_risk: f64) -> Self {
        ReferenceSrea { per_contingent_risk }
    }
}

impl SreaOracle for ReferenceSrea {
    fn srea(&self, stn: &Stn) -> Option<(f64, Stn)> {
        let mut guide = stn.clone();
        if !guide.floyd_warshall() {
            return None;
        }
        let remaining = crate::strategy::remaining_contingent_count(&guide);
        let alpha = (self.per_contingent_risk * remaining as f64).min(1.0);
        Some((alpha, guide))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stn::{Distribution, Z};

    #[test]
    fn infeasible_on_inconsistent_network() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 1.0);
        stn.add_requirement_edge(1, Z, -5.0);
        assert!(ReferenceSrea::new().srea(&stn).is_none());
    }

    #[test]
    fn alpha_shrinks_as_contingents_fire() {
        let mut stn = Stn::new();
        stn.add_requirement_edge(Z, 1, 0.0);
        stn.add_contingent_edge(1, 2, Distribution::Uniform { lo: 2.0, hi: 4.0 });
        stn.add_contingent_edge(1, 3, Distribution::Uniform { lo: 1.0, hi: 2.0 });
        let oracle = ReferenceSrea::new();

        let (alpha_before, _) = oracle.srea(&stn).unwrap();
        stn.mark_executed(2);
        let (alpha_after, _) = oracle.srea(&stn).unwrap();
        assert!(alpha_after < alpha_before);
    }
}
