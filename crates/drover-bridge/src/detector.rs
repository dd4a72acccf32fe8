//! Goal-reached and stuck detection.
//!
//! Goal-reached needs the agent inside the goal radius for the full dwell,
//! once per target, debounced against the previous goal emission of any
//! target. Stuck means no horizontal movement for the threshold; it earns a
//! bounded number of automatic re-path attempts with a cooldown between
//! them, after which the command is marked failed and the agent sits idle
//! awaiting new instructions.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use drover_core::{Result, StepKind};

use crate::bridge::Bridge;
use crate::millis;
use crate::state::{BridgingState, CommandOutcome};

impl Bridge {
    pub(crate) fn detect_goal_or_stuck(&mut self, now: DateTime<Utc>) -> Result<()> {
        if let (Some(target), Some(dist)) = (self.goal.target.clone(), self.goal.distance_remaining)
        {
            let within = dist <= self.cfg.goal_eps_xz;
            if within && self.goal.within_goal_since.is_none() {
                self.goal.within_goal_since = Some(now);
            } else if !within {
                self.goal.within_goal_since = None;
            }

            let dwelled = self
                .goal
                .within_goal_since
                .is_some_and(|since| now - since >= millis(self.cfg.goal_stay_ms));
            let debounced = self
                .goal
                .last_goal_emit
                .is_none_or(|last| now - last >= millis(self.cfg.goal_reemit_debounce_ms));

            if self.goal.within_goal_since.is_some()
                && !self.goal.goal_emitted_for_target
                && dwelled
                && debounced
            {
                info!(target = %target.pos, distance = dist, "goal reached");
                self.arm.outcome = CommandOutcome::Success;
                self.arm.reason = "goal_reached".into();
                self.publish_base(now, "goal_reached", &target.pos.to_string());
                self.goal.goal_emitted_for_target = true;
                self.goal.last_goal_emit = Some(now);
                self.clear_goal_context();
                self.retries = 0;
                self.state = BridgingState::Idle;
                return Ok(());
            }
        }

        if now - self.goal.last_horizontal_move >= millis(self.cfg.stuck_idle_ms) {
            self.state = BridgingState::Stuck;
            self.arm.reason = "stuck".into();
            let rounded = self
                .goal
                .distance_remaining
                .unwrap_or(-1.0)
                .round() as i64;
            warn!(distance = rounded, retries = self.retries, "no horizontal movement, agent is stuck");
            self.publish_base(now, "stuck_detected", &rounded.to_string());

            let movement_cmd = self.arm.last_cmd.as_deref().is_some_and(|c| {
                let low = c.to_lowercase();
                low.starts_with("#goto") || low == "#path"
            });
            if self.cooldown_ticks == 0 && movement_cmd && self.retries < self.cfg.max_retries {
                self.send_typed(StepKind::Path, "#path", now)?;
                self.retries += 1;
                self.cooldown_ticks = self.cfg.retry_cooldown_ticks;
            } else if self.retries >= self.cfg.max_retries {
                self.arm.outcome = CommandOutcome::Fail;
            }
            // Refresh so the stuck branch does not fire again every tick
            // while the agent is still standing still.
            self.goal.last_horizontal_move = now;
        }
        Ok(())
    }
}
