use thiserror::Error;

/// Unified error type for the Drover bridge runtime.
#[derive(Error, Debug)]
pub enum DroverError {
    // ── Dispatch errors ────────────────────────────────────────
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("command rejected: {reason}")]
    CommandRejected { reason: String },

    #[error("no agent session available")]
    NoAgent,

    // ── World errors ───────────────────────────────────────────
    #[error("world link error: {0}")]
    World(String),

    // ── Engine errors ──────────────────────────────────────────
    #[error("engine probe error: {0}")]
    Engine(String),

    // ── Bus errors ─────────────────────────────────────────────
    #[error("bus error: {0}")]
    Bus(String),

    #[error("bus not connected: {0}")]
    BusNotConnected(String),

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    #[error("config validation failed: {field}: {reason}")]
    ConfigValidation { field: String, reason: String },

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl DroverError {
    /// Short stable code for this error class, used as the `detail` field of
    /// outbound `error` events.
    pub fn code(&self) -> &'static str {
        match self {
            DroverError::Malformed(_) => "malformed",
            DroverError::CommandRejected { .. } => "cmd_rejected",
            DroverError::NoAgent => "no_agent",
            DroverError::World(_) => "world",
            DroverError::Engine(_) => "engine",
            DroverError::Bus(_) => "bus",
            DroverError::BusNotConnected(_) => "bus_disconnected",
            DroverError::Config(_) => "config",
            DroverError::ConfigValidation { .. } => "config",
            DroverError::Io(_) => "io",
            DroverError::Serialization(_) => "serialization",
            DroverError::Other(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, DroverError>;
