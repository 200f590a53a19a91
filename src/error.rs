//! Error taxonomy for the simulator core.
//!
//! Most failure outcomes are not crate-level errors at all: an inconsistent
//! network or an infeasible SREA call are
//! *simulation outcomes*, reported via `SimulationReport::success == false`
//! from [`crate::Simulator::simulate`]'s `Ok` value, or recovered locally
//! with a `log::warn!` call. The only kind that is a genuine precondition
//! violation is an unknown strategy name, which is rejected before the
//! dispatch loop ever starts.

use thiserror::Error;

/// The one typed error the simulation core can return.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    /// A strategy string did not match any of the known literals.
    #[error("unknown execution strategy: {0:?}")]
    UnknownStrategy(String),
}
