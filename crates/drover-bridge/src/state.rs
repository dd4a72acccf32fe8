//! The explicit state records the tick pipeline owns. Keeping these in a
//! handful of structs (instead of loose fields) keeps the arm/clear pairing
//! invariants enforceable in one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use drover_core::BlockPos;

/// Coarse overall status of the bridge, derived each tick from acceptance
/// and motion signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgingState {
    Idle,
    Pathing,
    Stuck,
}

impl BridgingState {
    pub fn as_str(self) -> &'static str {
        match self {
            BridgingState::Idle => "IDLE",
            BridgingState::Pathing => "PATHING",
            BridgingState::Stuck => "STUCK",
        }
    }
}

/// Outcome of the most recently issued command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandOutcome {
    Pending,
    Success,
    Fail,
}

impl CommandOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandOutcome::Pending => "pending",
            CommandOutcome::Success => "success",
            CommandOutcome::Fail => "fail",
        }
    }
}

/// Tracking state for the single most recently issued command.
///
/// `awaiting_acceptance` and `accepted_emitted` are mutually exclusive
/// terminal flags for one arm-cycle: once acceptance has been emitted it
/// cannot re-fire until the next rearm.
#[derive(Debug, Clone)]
pub struct CommandArmState {
    pub last_cmd: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub outcome: CommandOutcome,
    pub reason: String,
    pub awaiting_acceptance: bool,
    pub accepted_emitted: bool,
    pub acceptance_deadline: Option<DateTime<Utc>>,
    pub moving_since: Option<DateTime<Utc>>,
}

impl CommandArmState {
    pub fn idle() -> Self {
        Self {
            last_cmd: None,
            issued_at: None,
            outcome: CommandOutcome::Pending,
            reason: "none".into(),
            awaiting_acceptance: false,
            accepted_emitted: false,
            acceptance_deadline: None,
            moving_since: None,
        }
    }

    /// Rearm for a freshly sent command. Replaces every field at once; the
    /// record is never partially updated.
    pub fn rearm(
        &mut self,
        cmd: &str,
        now: DateTime<Utc>,
        expect_movement: bool,
        accept_window: chrono::Duration,
    ) {
        *self = Self {
            last_cmd: Some(cmd.to_string()),
            issued_at: Some(now),
            outcome: CommandOutcome::Pending,
            reason: "none".into(),
            awaiting_acceptance: expect_movement,
            accepted_emitted: false,
            acceptance_deadline: expect_movement.then(|| now + accept_window),
            moving_since: None,
        };
    }

    /// Drop the armed command and its acceptance tracking. `outcome` and
    /// `reason` survive: they describe the last command even after its
    /// context is gone, and step completion checks read them afterwards.
    pub fn clear_command(&mut self) {
        self.last_cmd = None;
        self.issued_at = None;
        self.awaiting_acceptance = false;
        self.accepted_emitted = false;
        self.acceptance_deadline = None;
        self.moving_since = None;
    }
}

/// A goal target and its fingerprint; always set and cleared together.
#[derive(Debug, Clone)]
pub struct GoalTarget {
    pub pos: BlockPos,
    pub key: String,
}

impl GoalTarget {
    pub fn new(pos: BlockPos) -> Self {
        Self {
            key: pos.key(),
            pos,
        }
    }
}

/// Goal-reached and stuck detection state.
#[derive(Debug, Clone)]
pub struct GoalTrackingState {
    pub target: Option<GoalTarget>,
    /// Valid only while a target exists.
    pub distance_remaining: Option<f64>,
    pub within_goal_since: Option<DateTime<Utc>>,
    pub goal_emitted_for_target: bool,
    /// Debounce anchor shared across targets; survives target changes.
    pub last_goal_emit: Option<DateTime<Utc>>,
    pub last_horizontal_move: DateTime<Utc>,
}

impl GoalTrackingState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            target: None,
            distance_remaining: None,
            within_goal_since: None,
            goal_emitted_for_target: false,
            last_goal_emit: None,
            last_horizontal_move: now,
        }
    }

    /// Replace (or clear) the target, resetting everything scoped to it.
    pub fn set_target(&mut self, target: Option<BlockPos>) {
        self.target = target.map(GoalTarget::new);
        self.distance_remaining = None;
        self.within_goal_since = None;
        self.goal_emitted_for_target = false;
    }

    pub fn clear(&mut self) {
        self.set_target(None);
    }
}
