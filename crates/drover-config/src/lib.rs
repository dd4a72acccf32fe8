//! # drover-config
//!
//! Configuration system for the Drover bridge. Reads from `drover.toml`,
//! then applies environment variable overrides.
//!
//! Every heuristic the bridge's inference runs on (acceptance windows, goal
//! epsilon and dwell, stuck thresholds, settle and quiet periods) is a named
//! field here with the stock default. Changing one changes observable
//! behavior and is a compatibility-relevant change.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{
    BridgeConfig, BusConfig, ConfigWarning, DroverConfig, LoggingConfig, ScopesConfig,
    WarningSeverity,
};
