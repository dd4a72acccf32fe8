//! Acceptance inference for the armed command.
//!
//! The engine never confirms that it took a command, so acceptance of a
//! movement command is inferred: either the engine's own pathing flag goes
//! up, or measured speed stays above the movement threshold for the sustain
//! duration. Either way it fires at most once per arm-cycle; past the
//! acceptance window it is rejected instead, also at most once.

use chrono::{DateTime, Utc};
use tracing::debug;

use drover_core::BlockPos;

use crate::bridge::Bridge;
use crate::millis;
use crate::state::BridgingState;

impl Bridge {
    /// Atomically rearm tracking for a just-sent command.
    pub(crate) fn arm_new_command(
        &mut self,
        cmd: &str,
        target: Option<BlockPos>,
        expect_movement: bool,
        now: DateTime<Utc>,
    ) {
        debug!(cmd, expect_movement, target = ?target, "arming command");
        self.arm.rearm(cmd, now, expect_movement, self.accept_window());
        self.goal.set_target(target);
    }

    /// Per-tick acceptance tracking plus derivation of the overall bridging
    /// state from the engine flag and measured speed.
    pub(crate) fn update_acceptance_and_state(&mut self, now: DateTime<Utc>) {
        // Refresh distance-to-target; it is only meaningful while a target
        // exists and the agent is observable.
        self.goal.distance_remaining = match (&self.goal.target, self.world.position()) {
            (Some(target), Some(pos)) => Some(pos.horizontal_distance(&target.pos.center())),
            _ => None,
        };

        let pathing = self.engine.is_pathing();
        let speed = self.sampler.average_horizontal_speed();
        if speed >= self.cfg.horizontal_move_eps_mps {
            self.goal.last_horizontal_move = now;
        }
        let moving_fast = pathing || speed >= self.cfg.moving_speed_mps;

        if self.arm.awaiting_acceptance && moving_fast {
            let moving_since = *self.arm.moving_since.get_or_insert(now);
            let sustained = pathing || now - moving_since >= millis(self.cfg.accept_sustain_ms);
            if !self.arm.accepted_emitted && sustained {
                let cmd = self.arm.last_cmd.clone().unwrap_or_default();
                self.publish_base(now, "cmd_accepted", &cmd);
                self.arm.awaiting_acceptance = false;
                self.arm.accepted_emitted = true;
                self.state = BridgingState::Pathing;
            }
        } else {
            // Motion broke off (and the engine is not reporting for us):
            // the sustain clock starts over.
            self.arm.moving_since = None;
        }

        if self.arm.awaiting_acceptance
            && !self.arm.accepted_emitted
            && self.arm.acceptance_deadline.is_some_and(|d| now > d)
        {
            self.publish_base(now, "cmd_reject", "timeout_no_pathing");
            self.arm.awaiting_acceptance = false;
        }

        self.state = if pathing || speed >= self.cfg.moving_speed_mps {
            BridgingState::Pathing
        } else if self.state == BridgingState::Stuck {
            BridgingState::Stuck
        } else {
            BridgingState::Idle
        };
    }
}
