//! Periodic `baritone_state` snapshot.
//!
//! Field names are wire-stable: controllers key on them, so they keep their
//! historical spellings even where they differ from the Rust names.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::bridge::Bridge;
use crate::millis;

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotTarget {
    pub x: i64,
    pub y: i64,
    pub z: i64,
    pub key: String,
}

/// One published state snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeSnapshot {
    pub ts: i64,
    pub state: &'static str,
    #[serde(rename = "lastCmd", skip_serializing_if = "Option::is_none")]
    pub last_cmd: Option<String>,
    #[serde(rename = "lastCmdOutcome")]
    pub last_cmd_outcome: &'static str,
    pub reason: String,
    #[serde(rename = "elapsedSec")]
    pub elapsed_sec: i64,
    pub retries: u32,
    #[serde(rename = "cooldownSec")]
    pub cooldown_sec: u32,
    #[serde(rename = "speedAvg")]
    pub speed_avg: f64,
    #[serde(rename = "distanceRemaining")]
    pub distance_remaining: f64,
    #[serde(rename = "awaitingAccept")]
    pub awaiting_accept: bool,
    #[serde(rename = "acceptedEmitted")]
    pub accepted_emitted: bool,
    #[serde(rename = "movingSinceMs")]
    pub moving_since_ms: i64,
    #[serde(rename = "withinGoalNow")]
    pub within_goal_now: bool,
    #[serde(rename = "withinGoalForMs")]
    pub within_goal_for_ms: i64,
    #[serde(rename = "lastGoalEmitMsAgo")]
    pub last_goal_emit_ms_ago: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<SnapshotTarget>,
    #[serde(rename = "planId")]
    pub plan_id: String,
    #[serde(rename = "planPaused")]
    pub plan_paused: bool,
    #[serde(rename = "planIndex")]
    pub plan_index: i64,
    #[serde(rename = "planRemaining")]
    pub plan_remaining: usize,
    #[serde(rename = "planOnFail")]
    pub plan_on_fail: &'static str,
    #[serde(rename = "planMaxRetriesPerStep")]
    pub plan_max_retries_per_step: u32,
    #[serde(rename = "stepDeadlineMs")]
    pub step_deadline_ms: i64,
    pub api_pathing: bool,
    #[serde(rename = "api_builderActive")]
    pub api_builder_active: bool,
    #[serde(rename = "api_lastProcessSeenMsAgo")]
    pub api_last_process_seen_ms_ago: i64,
}

impl Bridge {
    /// Publish a snapshot if the rate cap allows one.
    pub(crate) fn maybe_publish_snapshot(&mut self, now: DateTime<Utc>) {
        if self
            .last_publish
            .is_some_and(|last| now - last < millis(self.cfg.publish_interval_ms))
        {
            return;
        }
        self.publish_snapshot_now(now);
    }

    /// Publish a snapshot unconditionally (used by the shutdown flush).
    pub(crate) fn publish_snapshot_now(&mut self, now: DateTime<Utc>) {
        self.last_publish = Some(now);
        let snap = self.build_snapshot(now);
        let payload = match serde_json::to_value(&snap) {
            Ok(v) => v,
            Err(_) => return,
        };
        self.publisher
            .publish(&self.state_topic, self.envelope.wrap(now, "baritone_state", payload));
    }

    pub fn build_snapshot(&mut self, now: DateTime<Utc>) -> BridgeSnapshot {
        let speed = self.sampler.average_horizontal_speed();
        let elapsed_sec = self
            .arm
            .issued_at
            .map(|t| ((now - t).num_seconds()).max(0))
            .unwrap_or(0);

        BridgeSnapshot {
            ts: now.timestamp(),
            state: self.state.as_str(),
            last_cmd: self.arm.last_cmd.clone(),
            last_cmd_outcome: self.arm.outcome.as_str(),
            reason: self.arm.reason.clone(),
            elapsed_sec,
            retries: self.retries,
            cooldown_sec: self.cooldown_ticks / self.cfg.tick_hz.max(1),
            speed_avg: (speed * 100.0).round() / 100.0,
            distance_remaining: self.goal.distance_remaining.unwrap_or(-1.0),
            awaiting_accept: self.arm.awaiting_acceptance,
            accepted_emitted: self.arm.accepted_emitted,
            moving_since_ms: self
                .arm
                .moving_since
                .map(|t| t.timestamp_millis())
                .unwrap_or(0),
            within_goal_now: self.goal.within_goal_since.is_some(),
            within_goal_for_ms: self
                .goal
                .within_goal_since
                .map(|t| (now - t).num_milliseconds())
                .unwrap_or(0),
            last_goal_emit_ms_ago: self
                .goal
                .last_goal_emit
                .map(|t| (now - t).num_milliseconds())
                .unwrap_or(-1),
            target: self.goal.target.as_ref().map(|t| SnapshotTarget {
                x: t.pos.x,
                y: t.pos.y,
                z: t.pos.z,
                key: t.key.clone(),
            }),
            plan_id: self.plan.id.clone().unwrap_or_default(),
            plan_paused: self.plan.paused,
            plan_index: self.plan.current_index,
            plan_remaining: self.plan.queue.len(),
            plan_on_fail: self.plan.on_fail.as_str(),
            plan_max_retries_per_step: self.plan.default_max_retries,
            step_deadline_ms: self
                .plan
                .step_deadline
                .map(|t| t.timestamp_millis())
                .unwrap_or(0),
            api_pathing: self.engine.is_pathing(),
            api_builder_active: self.engine.is_builder_active(now),
            api_last_process_seen_ms_ago: self
                .engine
                .last_active_at()
                .map(|t| (now - t).num_milliseconds())
                .unwrap_or(-1),
        }
    }
}
