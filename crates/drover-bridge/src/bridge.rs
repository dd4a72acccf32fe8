use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use drover_config::{BridgeConfig, DroverConfig};
use drover_core::{BusPublisher, EventEnvelope, Result, StepKind, WorldLink, parse_goto_target};
use drover_engine::EngineFacade;

use crate::millis;
use crate::plan::PlanState;
use crate::sampler::PositionSampler;
use crate::state::{BridgingState, CommandArmState, GoalTrackingState};

/// The bridge controller.
///
/// All state is owned here and mutated only from the tick context; inbound
/// controller traffic reaches it through [`crate::runtime::BridgeRuntime`]'s
/// marshaling queue. One tick runs the pipeline in a fixed order: cooldown,
/// position sampling, engine refresh, acceptance tracking, goal/stuck
/// detection, plan advancement, snapshot publish.
pub struct Bridge {
    pub(crate) cfg: BridgeConfig,
    pub(crate) allow: bool,
    pub(crate) world: Arc<dyn WorldLink>,
    pub(crate) publisher: Arc<dyn BusPublisher>,
    pub(crate) engine: EngineFacade,
    pub(crate) envelope: EventEnvelope,
    pub(crate) evt_topic: String,
    pub(crate) state_topic: String,

    pub(crate) state: BridgingState,
    pub(crate) arm: CommandArmState,
    pub(crate) goal: GoalTrackingState,
    pub(crate) sampler: PositionSampler,
    pub(crate) plan: PlanState,
    pub(crate) retries: u32,
    pub(crate) cooldown_ticks: u32,
    pub(crate) last_publish: Option<DateTime<Utc>>,
}

impl Bridge {
    pub fn new(
        config: &DroverConfig,
        world: Arc<dyn WorldLink>,
        publisher: Arc<dyn BusPublisher>,
        engine: EngineFacade,
        now: DateTime<Utc>,
    ) -> Self {
        let mut envelope = EventEnvelope::new(config.bus.server_tag.clone());
        if let Some(sid) = &config.bus.session_id {
            envelope = envelope.with_session(sid.clone());
        }
        Self {
            cfg: config.bridge.clone(),
            allow: config.scopes.allow_bridge,
            world,
            publisher,
            engine,
            envelope,
            evt_topic: config.bus.evt_topic.clone(),
            state_topic: config.bus.state_topic_or_default(),
            state: BridgingState::Idle,
            arm: CommandArmState::idle(),
            goal: GoalTrackingState::new(now),
            sampler: PositionSampler::new(config.bridge.position_ring_max, config.bridge.tick_hz),
            plan: PlanState::empty(),
            retries: 0,
            cooldown_ticks: 0,
            last_publish: None,
        }
    }

    /// Run one tick of the pipeline. Faults are caught here: they produce a
    /// single `error` event and end the cycle early instead of taking the
    /// host loop down.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if let Err(e) = self.tick_inner(now) {
            warn!(error = %e, "tick aborted");
            self.publish_base(now, "error", e.code());
        }
    }

    fn tick_inner(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.cooldown_ticks > 0 {
            self.cooldown_ticks -= 1;
        }
        if let Some(pos) = self.world.position() {
            self.sampler.record(pos);
        }
        self.engine.tick(now);
        self.update_acceptance_and_state(now);
        self.detect_goal_or_stuck(now)?;
        self.plan_tick(now)?;
        self.maybe_publish_snapshot(now);
        Ok(())
    }

    /// External session restart: any running plan belongs to the previous
    /// session and is discarded.
    pub fn on_session_reset(&mut self) {
        self.plan.reset();
    }

    /// Drop the current target and armed command together. Outcome, reason,
    /// bridging state, and the retry budget are left alone.
    pub(crate) fn clear_goal_context(&mut self) {
        self.goal.clear();
        self.arm.clear_command();
    }

    /// Send a command whose kind is already known, arming tracking for it.
    /// With no agent session this is a silent no-op, mirroring the plan and
    /// retry paths that call it.
    pub(crate) fn send_typed(
        &mut self,
        kind: StepKind,
        cmd: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !self.world.has_agent() {
            return Ok(());
        }
        let low = cmd.to_lowercase();
        let target = if kind == StepKind::Goto {
            parse_goto_target(low.trim())
        } else {
            None
        };
        self.world.send_command(cmd)?;
        self.publish_base(now, "accepted", cmd);
        self.arm_new_command(cmd, target, kind.expects_movement(), now);
        Ok(())
    }

    pub(crate) fn publish_base(&self, now: DateTime<Utc>, event: &str, detail: &str) {
        self.publisher
            .publish(&self.evt_topic, self.envelope.base(now, event, detail));
    }

    pub(crate) fn emit_plan_event(&self, now: DateTime<Utc>, name: &str, payload: Value) {
        self.publisher
            .publish(&self.evt_topic, self.envelope.wrap(now, name, payload));
    }

    // ── Read-only views (used by the snapshot and by tests) ────

    pub fn bridging_state(&self) -> BridgingState {
        self.state
    }

    pub fn arm_state(&self) -> &CommandArmState {
        &self.arm
    }

    pub fn goal_state(&self) -> &GoalTrackingState {
        &self.goal
    }

    pub fn plan_state(&self) -> &PlanState {
        &self.plan
    }

    pub fn retry_count(&self) -> u32 {
        self.retries
    }

    pub fn cooldown_remaining_ticks(&self) -> u32 {
        self.cooldown_ticks
    }

    pub(crate) fn accept_window(&self) -> chrono::Duration {
        millis(self.cfg.accept_window_ms)
    }
}
