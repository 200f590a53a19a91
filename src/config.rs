//! Simulation configuration: the thresholds consulted by the rescheduling
//! strategies, as a serde-deserializable struct so a run can be configured
//! from a JSON file or CLI flags as well as built in Rust.

use serde::{Deserialize, Serialize};

/// Thresholds consulted by the `drea-si`/`drea-alp`/`drea-ar`/`arsi`
/// strategies. Defaults (`0.1` each) match the magnitude used by typical
/// experiment scripts for these algorithms (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    pub si_threshold: f64,
    pub ar_threshold: f64,
    pub alp_threshold: f64,
}

impl Default for SimOptions {
    fn default() -> Self {
        SimOptions {
            si_threshold: 0.1,
            ar_threshold: 0.1,
            alp_threshold: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stable() {
        let opts = SimOptions::default();
        assert_eq!(opts.si_threshold, 0.1);
        assert_eq!(opts.ar_threshold, 0.1);
        assert_eq!(opts.alp_threshold, 0.1);
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let opts: SimOptions = serde_json::from_str(r#"{"si_threshold": 0.99}"#).unwrap();
        assert_eq!(opts.si_threshold, 0.99);
        assert_eq!(opts.ar_threshold, 0.1);
    }
}
