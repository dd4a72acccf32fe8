//! # drover-bridge
//!
//! The movement command arbitration and plan-execution state machine.
//!
//! The bridge forwards single commands and ordered multi-step plans to an
//! external pathfinding/building engine that gives no reliable synchronous
//! completion signal, so acceptance, progress, goal-completion, and stuck
//! conditions are all inferred from periodic position sampling plus an
//! optional external status probe. A fixed-rate tick drives the whole
//! pipeline; inbound controller traffic is marshaled onto that tick context
//! by [`runtime::BridgeRuntime`].

pub mod bridge;
pub mod plan;
pub mod runtime;
pub mod sampler;
pub mod snapshot;
pub mod state;

mod acceptance;
mod detector;
mod dispatch;

pub use bridge::Bridge;
pub use plan::{FailurePolicy, PlanState, PlanStep};
pub use runtime::{BridgeHandle, BridgeOp, BridgeRuntime};
pub use sampler::PositionSampler;
pub use snapshot::{BridgeSnapshot, SnapshotTarget};
pub use state::{BridgingState, CommandArmState, CommandOutcome, GoalTarget, GoalTrackingState};

pub(crate) fn millis(ms: u64) -> chrono::Duration {
    chrono::Duration::milliseconds(ms as i64)
}
