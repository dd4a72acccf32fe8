//! Plan bookkeeping and the step-sequencing state machine.
//!
//! A plan is a FIFO queue of steps; the front of the queue is the current
//! step. Step completion is never signalled by the engine, so each step
//! class has its own polling heuristic: movement steps wait for the
//! goal-reached inference, build-like steps wait for the engine's processes
//! to settle, everything else waits out a short quiet period.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::{debug, info};

use drover_core::{Result, StepKind, parse_wait_ms};

use crate::bridge::Bridge;
use crate::millis;
use crate::state::BridgingState;

/// What to do with the rest of the plan when a step exhausts its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    Continue,
    Abort,
}

impl FailurePolicy {
    pub fn parse(s: &str) -> FailurePolicy {
        if s.eq_ignore_ascii_case("abort") {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailurePolicy::Continue => "continue",
            FailurePolicy::Abort => "abort",
        }
    }
}

/// One unit of a plan.
#[derive(Debug, Clone)]
pub struct PlanStep {
    pub kind: StepKind,
    pub cmd: String,
    /// Absolute deadline budget; `None` means the step never times out.
    pub timeout: Option<chrono::Duration>,
    /// Per-step override; `None` falls back to the plan default.
    pub max_retries: Option<u32>,
    pub retries_used: u32,
}

/// The active plan, if any. At most one exists at a time; starting a new
/// plan discards the running one.
#[derive(Debug)]
pub struct PlanState {
    pub id: Option<String>,
    pub queue: VecDeque<PlanStep>,
    pub current_index: i64,
    pub paused: bool,
    pub step_deadline: Option<DateTime<Utc>>,
    /// Whether the front step has actually been started (dispatched, or for
    /// wait steps, announced). Completion detection only applies to started
    /// steps; a paused plan must not quietly drain its queue.
    pub current_started: bool,
    pub on_fail: FailurePolicy,
    pub default_max_retries: u32,
}

impl PlanState {
    pub fn empty() -> Self {
        Self {
            id: None,
            queue: VecDeque::new(),
            current_index: -1,
            paused: false,
            step_deadline: None,
            current_started: false,
            on_fail: FailurePolicy::Continue,
            default_max_retries: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::empty();
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }
}

impl Bridge {
    /// Tick-driven advancement of the current plan.
    pub(crate) fn plan_tick(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.plan.id.is_none() {
            return Ok(());
        }
        let Some(front) = self.plan.queue.front() else {
            self.finish_plan("success", now);
            return Ok(());
        };
        let kind = front.kind;
        let cmd = front.cmd.clone();
        let timeout = front.timeout;
        let retry_cap = front.max_retries.unwrap_or(self.plan.default_max_retries);
        let retries_used = front.retries_used;

        // Wait steps never touch the environment; the deadline is computed
        // on the first tick the step is current.
        if kind == StepKind::Wait {
            if self.plan.step_deadline.is_none() {
                let wait_ms = parse_wait_ms(&cmd).max(0);
                self.plan.step_deadline = Some(now + chrono::Duration::milliseconds(wait_ms));
            }
            if self.plan.step_deadline.is_some_and(|d| now >= d) {
                self.advance_after("wait_done", now)?;
            }
            return Ok(());
        }

        // Step timeout: retry under the effective cap, otherwise apply the
        // plan's failure policy.
        if let (Some(step_timeout), Some(deadline)) = (timeout, self.plan.step_deadline) {
            if now > deadline {
                if retries_used < retry_cap {
                    if let Some(front) = self.plan.queue.front_mut() {
                        front.retries_used += 1;
                    }
                    debug!(cmd = %cmd, retry = retries_used + 1, cap = retry_cap, "step timed out, resending");
                    self.send_typed(kind, &cmd, now)?;
                    self.plan.step_deadline = Some(now + step_timeout);
                    return Ok(());
                }
                let meta = self.step_meta("timeout");
                self.emit_plan_event(now, "plan_step_finished", meta);
                if self.plan.on_fail == FailurePolicy::Abort {
                    self.finish_plan("partial", now);
                } else {
                    self.cancel_in_flight(now)?;
                    self.advance_after("timeout", now)?;
                }
                return Ok(());
            }
        }

        // Completion detection, per step class. Only a step that actually
        // started can complete; wait steps are handled above and run on
        // their own deadline regardless.
        let started = self.plan.current_started;
        let is_movement = kind.expects_movement();
        let goto_done = started
            && is_movement
            && !self.arm.awaiting_acceptance
            && self.state == BridgingState::Idle
            && self.arm.reason == "goal_reached";

        let build_like = kind == StepKind::Build
            || (kind == StepKind::Select && cmd.to_lowercase().contains("cleararea"));
        let non_goto_done = if !started {
            false
        } else if build_like {
            let builder_active = self.engine.is_builder_active(now);
            let settled = match self.engine.last_active_at() {
                Some(seen) => now - seen >= millis(self.cfg.process_settle_ms),
                None => true,
            };
            !builder_active
                && settled
                && !self.arm.awaiting_acceptance
                && self.state != BridgingState::Pathing
        } else {
            let quiet = match self.arm.issued_at {
                Some(issued) => now - issued >= millis(self.cfg.nongoto_quiet_ms),
                None => true,
            };
            !is_movement
                && quiet
                && self.state != BridgingState::Pathing
                && !self.arm.awaiting_acceptance
        };

        if goto_done || non_goto_done {
            self.advance_after(if goto_done { "goal_reached" } else { "done" }, now)?;
            return Ok(());
        }

        // Starting the next step is gated so dispatch never overlaps: no
        // pause, no scheduled deadline, bridge idle, no armed command still
        // waiting on acceptance.
        if !self.plan.paused
            && !self.plan.current_started
            && self.plan.step_deadline.is_none()
            && self.state == BridgingState::Idle
            && !self.arm.awaiting_acceptance
        {
            self.try_start_next_step(now)?;
        }
        Ok(())
    }

    pub(crate) fn try_start_next_step(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.plan.paused || self.plan.queue.is_empty() {
            return Ok(());
        }
        if self.state != BridgingState::Idle || self.arm.awaiting_acceptance {
            return Ok(());
        }
        let Some(front) = self.plan.queue.front() else {
            return Ok(());
        };
        let kind = front.kind;
        let cmd = front.cmd.clone();
        let timeout = front.timeout;

        self.plan.current_index += 1;
        self.plan.current_started = true;
        let meta = self.step_meta("start");
        self.emit_plan_event(now, "plan_step_started", meta);

        if kind == StepKind::Wait {
            self.plan.step_deadline = None;
            return Ok(());
        }

        self.send_typed(kind, &cmd, now)?;
        self.plan.step_deadline = timeout.map(|t| now + t);
        Ok(())
    }

    /// Pop the current step, report it, and move on (or finalize).
    pub(crate) fn advance_after(&mut self, reason: &str, now: DateTime<Utc>) -> Result<()> {
        if self.plan.queue.pop_front().is_some() {
            // The finished event's `cmd` field names the new queue front,
            // not the step that just ended.
            let meta = self.step_meta(reason);
            self.emit_plan_event(now, "plan_step_finished", meta);
        }
        self.plan.step_deadline = None;
        self.plan.current_started = false;
        if self.plan.queue.is_empty() {
            self.finish_plan("success", now);
        } else {
            self.try_start_next_step(now)?;
        }
        Ok(())
    }

    pub(crate) fn finish_plan(&mut self, status: &str, now: DateTime<Utc>) {
        info!(plan_id = ?self.plan.id, status, "plan finished");
        let mut meta = self.plan_meta();
        if let Some(map) = meta.as_object_mut() {
            map.insert("status".into(), status.into());
        }
        self.emit_plan_event(now, "plan_finished", meta);
        self.plan.reset();
    }

    /// Tell the engine to stand down whatever is in flight. The environment
    /// acknowledges (or times out) on its own; there is no cooperative
    /// interrupt to wait on.
    pub(crate) fn cancel_in_flight(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != BridgingState::Idle {
            self.send_typed(StepKind::RawCmd, "#cancel", now)?;
        }
        Ok(())
    }

    pub(crate) fn step_meta(&self, reason: &str) -> Value {
        json!({
            "plan_id": self.plan.id,
            "index": self.plan.current_index,
            "cmd": self.plan.queue.front().map(|s| s.cmd.as_str()).unwrap_or(""),
            "reason": reason,
        })
    }

    pub(crate) fn plan_meta(&self) -> Value {
        json!({
            "plan_id": self.plan.id,
            "size": self.plan.queue.len(),
            "index": self.plan.current_index,
        })
    }
}
