//! Inbound validation and routing: single commands, whole plans, plan
//! control, and locally observed command echoes.
//!
//! Nothing in here is allowed to panic or propagate past the dispatch
//! boundary; every parse failure becomes a structured rejection event.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use drover_core::{
    COMMAND_PREFIX, CommandOrigin, DroverError, MAX_COMMAND_LEN, Result, StepKind, is_cancel,
    parse_goto_target,
};

use crate::bridge::Bridge;
use crate::plan::{FailurePolicy, PlanStep};
use crate::state::BridgingState;

impl Bridge {
    /// Entry point for one raw JSON payload from the control bus.
    pub fn handle_inbound(&mut self, payload: &str, now: DateTime<Utc>) {
        if !self.allow {
            return;
        }
        let value: Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "unparsable inbound payload");
                self.publish_base(now, "error", "plan_parse_serialization");
                return;
            }
        };
        let msg_type = value.get("type").and_then(Value::as_str).unwrap_or("");
        let outcome = match msg_type {
            "baritone_cmd" => {
                self.handle_single_cmd(&value, now);
                Ok(())
            }
            "baritone_plan" => self.handle_plan_start(&value, now),
            "baritone_ctrl" => {
                let action = value.get("action").and_then(Value::as_str).unwrap_or("");
                self.handle_plan_ctrl(action, now)
            }
            // Unknown types are someone else's traffic on a shared topic.
            _ => Ok(()),
        };
        if let Err(e) = outcome {
            warn!(error = %e, msg_type, "inbound message rejected");
            self.publish_base(now, "error", &format!("plan_parse_{}", e.code()));
        }
    }

    /// A command line observed on the environment's own outbound channel,
    /// e.g. the controller driving itself through normal chat. Internal
    /// origin means the bridge sent it and already armed tracking.
    pub fn on_local_command(&mut self, raw: &str, origin: CommandOrigin, now: DateTime<Utc>) {
        if origin == CommandOrigin::Internal {
            return;
        }
        if !self.allow || !raw.starts_with(COMMAND_PREFIX) {
            return;
        }
        let low_owned = raw.to_lowercase();
        let low = low_owned.trim();
        let target = parse_goto_target(low);
        let kind = StepKind::infer(low);
        self.arm_new_command(raw, target, kind.expects_movement(), now);
        if is_cancel(low) {
            self.clear_goal_context();
            self.state = BridgingState::Idle;
        }
    }

    fn handle_single_cmd(&mut self, value: &Value, now: DateTime<Utc>) {
        let Some(cmd) = value.get("cmd").and_then(Value::as_str) else {
            self.publish_base(now, "cmd_reject", "bad_cmd");
            return;
        };
        if !cmd.starts_with(COMMAND_PREFIX) || cmd.len() > MAX_COMMAND_LEN {
            self.publish_base(now, "cmd_reject", "bad_cmd");
            return;
        }
        let low_owned = cmd.to_lowercase();
        let low = low_owned.trim();
        let target = parse_goto_target(low);
        let kind = StepKind::infer(low);

        if !self.world.has_agent() {
            self.publish_base(now, "cmd_reject", "no_agent");
            return;
        }
        if let Err(e) = self.world.send_command(cmd) {
            warn!(error = %e, cmd, "world refused the command");
            self.publish_base(now, "cmd_reject", "send_failed");
            return;
        }
        self.arm_new_command(cmd, target, kind.expects_movement(), now);
        if low == "#path" {
            // A manual re-path spends one unit of the automatic retry budget.
            self.retries += 1;
        }
        if is_cancel(low) {
            self.clear_goal_context();
            self.state = BridgingState::Idle;
        }
        self.publish_base(now, "accepted", cmd);
    }

    fn handle_plan_start(&mut self, value: &Value, now: DateTime<Utc>) -> Result<()> {
        // Parse everything before touching state: a malformed plan must not
        // tear down the one that is already running.
        let plan_id = value
            .get("plan_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let policy = value.get("policy");
        let on_fail = policy
            .and_then(|p| p.get("onFail"))
            .and_then(Value::as_str)
            .map(FailurePolicy::parse)
            .unwrap_or(FailurePolicy::Continue);
        let default_max_retries = policy
            .and_then(|p| p.get("maxRetriesPerStep"))
            .and_then(Value::as_i64)
            .map(|r| r.max(0) as u32)
            .unwrap_or(0);

        let mut steps = std::collections::VecDeque::new();
        if let Some(list) = value.get("steps").and_then(Value::as_array) {
            for s in list {
                let cmd = s
                    .get("cmd")
                    .and_then(Value::as_str)
                    .ok_or_else(|| DroverError::Malformed("plan step missing cmd".into()))?
                    .to_string();
                let timeout_ms = s
                    .get("timeoutMs")
                    .and_then(Value::as_i64)
                    .unwrap_or(self.cfg.default_step_timeout_ms as i64);
                let timeout = (timeout_ms > 0).then(|| chrono::Duration::milliseconds(timeout_ms));
                let max_retries = s
                    .get("maxRetries")
                    .and_then(Value::as_i64)
                    .map(|r| r.max(0) as u32);
                let kind = match s.get("type").and_then(Value::as_str) {
                    Some(t) => StepKind::parse(t),
                    None => StepKind::infer(cmd.to_lowercase().trim()),
                };
                steps.push_back(PlanStep {
                    kind,
                    cmd,
                    timeout,
                    max_retries,
                    retries_used: 0,
                });
            }
        }

        self.plan.reset();
        self.plan.id = Some(plan_id);
        self.plan.on_fail = on_fail;
        self.plan.default_max_retries = default_max_retries;
        self.plan.queue = steps;
        debug!(plan_id = ?self.plan.id, size = self.plan.queue.len(), "plan accepted");
        let meta = self.plan_meta();
        self.emit_plan_event(now, "plan_started", meta);
        self.try_start_next_step(now)
    }

    pub(crate) fn handle_plan_ctrl(&mut self, action: &str, now: DateTime<Utc>) -> Result<()> {
        debug!(action, plan_id = ?self.plan.id, "plan control");
        match action {
            "pause" => self.plan.paused = true,
            "resume" => {
                self.plan.paused = false;
                self.try_start_next_step(now)?;
            }
            "skip" => {
                self.cancel_in_flight(now)?;
                self.advance_after("skipped", now)?;
            }
            "cancel" => {
                self.cancel_in_flight(now)?;
                self.finish_plan("aborted", now);
            }
            "clear" => {
                self.cancel_in_flight(now)?;
                self.plan.reset();
            }
            _ => {}
        }
        Ok(())
    }
}
