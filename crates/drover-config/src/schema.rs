use serde::{Deserialize, Serialize};

/// Root configuration, mapping to `drover.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DroverConfig {
    pub bridge: BridgeConfig,
    pub bus: BusConfig,
    pub scopes: ScopesConfig,
    pub logging: LoggingConfig,
}

// ── Bridge heuristics ──────────────────────────────────────────

/// Tuning for the bridge's inference heuristics. Defaults are the stock
/// values; they interlock (e.g. the acceptance sustain must fit inside the
/// acceptance window), so treat changes as behavior changes, not cosmetics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Tick rate of the host environment's loop the bridge runs on.
    pub tick_hz: u32,
    /// Minimum interval between `baritone_state` snapshot publishes.
    pub publish_interval_ms: u64,
    /// Capacity of the recent-position ring used for speed estimation.
    pub position_ring_max: usize,
    /// How long a just-issued movement command may wait for observed motion
    /// before being rejected.
    pub accept_window_ms: u64,
    /// How long motion must be sustained before it counts as acceptance.
    pub accept_sustain_ms: u64,
    /// Speed above which the agent is considered actively moving.
    pub moving_speed_mps: f64,
    /// Speed above which any horizontal movement at all is registered.
    pub horizontal_move_eps_mps: f64,
    /// Horizontal distance within which a target counts as reached.
    pub goal_eps_xz: f64,
    /// Minimum continuous dwell inside the goal radius before firing.
    pub goal_stay_ms: u64,
    /// Minimum gap between any two goal-reached emissions.
    pub goal_reemit_debounce_ms: u64,
    /// No horizontal movement for this long classifies the agent as stuck.
    pub stuck_idle_ms: u64,
    /// Automatic re-path attempts before a movement command is failed.
    pub max_retries: u32,
    /// Ticks to wait between automatic re-path attempts.
    pub retry_cooldown_ticks: u32,
    /// Quiet period after which a non-movement command counts as done.
    pub nongoto_quiet_ms: u64,
    /// Grace period after the last active engine process observation before
    /// a build-like step counts as finished.
    pub process_settle_ms: u64,
    /// Step timeout applied when a plan step does not carry its own.
    pub default_step_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            tick_hz: 20,
            publish_interval_ms: 950,
            position_ring_max: 20,
            accept_window_ms: 15_000,
            accept_sustain_ms: 1_500,
            moving_speed_mps: 0.4,
            horizontal_move_eps_mps: 0.05,
            goal_eps_xz: 3.0,
            goal_stay_ms: 1_200,
            goal_reemit_debounce_ms: 10_000,
            stuck_idle_ms: 20_000,
            max_retries: 3,
            retry_cooldown_ticks: 160,
            nongoto_quiet_ms: 600,
            process_settle_ms: 1_500,
            default_step_timeout_ms: 180_000,
        }
    }
}

// ── Bus ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Broker URI for whatever transport sits behind the connector trait.
    pub broker_uri: String,
    /// Client identity on the bus; also the default topic namespace.
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Topic the controller publishes commands/plans/control messages on.
    pub cmd_topic: String,
    /// Topic the bridge publishes its events on.
    pub evt_topic: String,
    /// Where snapshots go. Defaults to `<evt_topic>/baritone_state`.
    pub state_topic: Option<String>,
    /// Environment identifier stamped into every event envelope.
    pub server_tag: String,
    /// Run identifier stamped into every event envelope, when set.
    pub session_id: Option<String>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            broker_uri: "tcp://localhost:1883".into(),
            client_id: "drover".into(),
            username: None,
            password: None,
            cmd_topic: "agents/drover/cmd".into(),
            evt_topic: "agents/drover/evt".into(),
            state_topic: None,
            server_tag: "local".into(),
            session_id: None,
        }
    }
}

impl BusConfig {
    pub fn state_topic_or_default(&self) -> String {
        match &self.state_topic {
            Some(t) if !t.trim().is_empty() => t.clone(),
            _ => format!("{}/baritone_state", self.evt_topic),
        }
    }
}

// ── Scopes ─────────────────────────────────────────────────────

/// Capability switches. Off means inbound traffic for that concern is
/// ignored entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopesConfig {
    /// Master switch for the command/plan bridge.
    pub allow_bridge: bool,
}

impl Default for ScopesConfig {
    fn default() -> Self {
        Self { allow_bridge: true }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty", "json", "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl DroverConfig {
    /// Validate the configuration. Hard errors come back as `Err`; everything
    /// else is a warning for the caller to log.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        if self.bridge.tick_hz == 0 {
            return Err("bridge.tick_hz must be at least 1".into());
        }
        if self.bridge.goal_eps_xz <= 0.0 {
            return Err("bridge.goal_eps_xz must be positive".into());
        }
        if self.bridge.position_ring_max < 2 {
            return Err("bridge.position_ring_max needs at least 2 samples".into());
        }

        if self.bridge.accept_sustain_ms >= self.bridge.accept_window_ms {
            warnings.push(ConfigWarning {
                field: "bridge.accept_sustain_ms".into(),
                message: "sustain duration does not fit inside the acceptance window; movement commands will always time out".into(),
                severity: WarningSeverity::Warning,
            });
        }
        if self.bridge.horizontal_move_eps_mps > self.bridge.moving_speed_mps {
            warnings.push(ConfigWarning {
                field: "bridge.horizontal_move_eps_mps".into(),
                message: "movement epsilon exceeds the moving-speed threshold".into(),
                severity: WarningSeverity::Warning,
            });
        }
        if self.bridge.publish_interval_ms < 100 {
            warnings.push(ConfigWarning {
                field: "bridge.publish_interval_ms".into(),
                message: "snapshot interval under 100ms will flood the bus".into(),
                severity: WarningSeverity::Warning,
            });
        }
        if self.bus.cmd_topic.trim().is_empty() || self.bus.evt_topic.trim().is_empty() {
            return Err("bus.cmd_topic and bus.evt_topic must be set".into());
        }

        Ok(warnings)
    }
}
