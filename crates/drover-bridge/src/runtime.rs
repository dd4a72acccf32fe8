//! The marshaling loop that owns a [`Bridge`].
//!
//! A single tokio task drives the fixed-rate tick and applies inbound
//! operations between ticks, so every state mutation happens on one
//! execution context. Bus consumers and echo observers never touch the
//! bridge directly; they go through a [`BridgeHandle`].

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use drover_core::CommandOrigin;

use crate::bridge::Bridge;

/// How long the shutdown path may wait for the final status publish.
const SHUTDOWN_FLUSH: Duration = Duration::from_millis(1_500);

/// Operations marshaled onto the bridge's tick context.
#[derive(Debug)]
pub enum BridgeOp {
    /// Raw JSON payload from the control bus.
    Inbound(String),
    /// A command line observed on the environment's outbound channel.
    CommandEcho {
        line: String,
        origin: CommandOrigin,
    },
    /// External session restart; discards any active plan.
    SessionReset,
    Shutdown,
}

/// Cloneable handle feeding the runtime's op queue from other contexts.
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<BridgeOp>,
}

impl BridgeHandle {
    pub async fn inbound(&self, payload: String) {
        self.send(BridgeOp::Inbound(payload)).await;
    }

    pub async fn command_echo(&self, line: String, origin: CommandOrigin) {
        self.send(BridgeOp::CommandEcho { line, origin }).await;
    }

    pub async fn session_reset(&self) {
        self.send(BridgeOp::SessionReset).await;
    }

    pub async fn shutdown(&self) {
        self.send(BridgeOp::Shutdown).await;
    }

    async fn send(&self, op: BridgeOp) {
        if self.tx.send(op).await.is_err() {
            warn!("bridge runtime is gone; op dropped");
        }
    }
}

/// Owns the bridge and its op queue; run it as a spawned task.
pub struct BridgeRuntime {
    bridge: Bridge,
    rx: mpsc::Receiver<BridgeOp>,
    tick_interval: Duration,
}

impl BridgeRuntime {
    pub fn new(bridge: Bridge, tick_hz: u32) -> (Self, BridgeHandle) {
        let (tx, rx) = mpsc::channel(256);
        let tick_interval = Duration::from_millis(1_000 / u64::from(tick_hz.max(1)));
        (
            Self {
                bridge,
                rx,
                tick_interval,
            },
            BridgeHandle { tx },
        )
    }

    /// Run until shutdown (or until every handle is dropped).
    pub async fn run(mut self) {
        info!(tick_ms = self.tick_interval.as_millis() as u64, "bridge runtime started");
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.bridge.tick(Utc::now());
                }
                op = self.rx.recv() => match op {
                    Some(BridgeOp::Inbound(payload)) => {
                        self.bridge.handle_inbound(&payload, Utc::now());
                    }
                    Some(BridgeOp::CommandEcho { line, origin }) => {
                        self.bridge.on_local_command(&line, origin, Utc::now());
                    }
                    Some(BridgeOp::SessionReset) => {
                        debug!("session reset");
                        self.bridge.on_session_reset();
                    }
                    Some(BridgeOp::Shutdown) | None => break,
                },
            }
        }

        // Final status publish, with a bounded wait for the transport to
        // drain. This is the only blocking the runtime ever does.
        let now = Utc::now();
        self.bridge.publish_snapshot_now(now);
        if !self.bridge.publisher.flush(SHUTDOWN_FLUSH) {
            warn!("final status publish may not have left the process");
        }
        info!("bridge runtime stopped");
    }
}
