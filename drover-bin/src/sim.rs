//! Scripted kinematic stand-in for a live environment.
//!
//! The sim accepts the same command vocabulary as a real deployment and
//! walks the agent toward `#goto` targets at a fixed speed, which doubles
//! as the engine probe's pathing signal. It exists so the full command →
//! inference → event loop can be driven end to end from a terminal.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::RngExt;

use drover_core::{Position, Result, WorldLink, is_cancel, parse_goto_target};
use drover_engine::EngineProbe;

struct SimInner {
    pos: Position,
    target: Option<Position>,
}

pub struct SimWorld {
    inner: Mutex<SimInner>,
    speed_mps: f64,
}

impl SimWorld {
    pub fn new(start: Position, speed_mps: f64) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(SimInner {
                pos: start,
                target: None,
            }),
            speed_mps,
        })
    }

    /// Advance the simulation by `dt_secs` of walking.
    pub fn advance(&self, dt_secs: f64) {
        let mut inner = self.inner.lock();
        let Some(target) = inner.target else {
            return;
        };
        let dx = target.x - inner.pos.x;
        let dz = target.z - inner.pos.z;
        let dist = dx.hypot(dz);
        let step = self.speed_mps * dt_secs;
        if dist <= step {
            inner.pos = target;
            inner.target = None;
            return;
        }
        let mut rng = rand::rng();
        // A touch of lateral noise so the track reads like a real walk
        inner.pos.x += dx / dist * step + rng.random_range(-0.02..0.02);
        inner.pos.z += dz / dist * step + rng.random_range(-0.02..0.02);
    }

    pub fn is_moving(&self) -> bool {
        self.inner.lock().target.is_some()
    }
}

impl WorldLink for SimWorld {
    fn position(&self) -> Option<Position> {
        Some(self.inner.lock().pos)
    }

    fn has_agent(&self) -> bool {
        true
    }

    fn send_command(&self, cmd: &str) -> Result<()> {
        let low_owned = cmd.to_lowercase();
        let low = low_owned.trim();
        let mut inner = self.inner.lock();
        if let Some(target) = parse_goto_target(low) {
            inner.target = Some(target.center());
        } else if is_cancel(low) {
            inner.target = None;
        }
        Ok(())
    }
}

/// Engine probe backed by the sim: pathing while a walk is in progress.
pub struct SimProbe(pub Arc<SimWorld>);

impl EngineProbe for SimProbe {
    fn is_pathing(&self) -> Result<bool> {
        Ok(self.0.is_moving())
    }

    fn is_builder_active(&self) -> Result<bool> {
        Ok(false)
    }

    fn is_mining_active(&self) -> Result<bool> {
        Ok(false)
    }
}
