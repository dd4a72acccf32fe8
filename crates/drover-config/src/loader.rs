use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::schema::DroverConfig;

/// Loads the Drover configuration from disk with env-var overrides.
pub struct ConfigLoader {
    config: DroverConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > DROVER_CONFIG env >
    /// ~/.drover/drover.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("DROVER_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".drover")
            .join("drover.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> drover_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            toml::from_str::<DroverConfig>(&raw).map_err(|e| {
                drover_core::DroverError::Config(format!(
                    "failed to parse {}: {}",
                    config_path.display(),
                    e
                ))
            })?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            DroverConfig::default()
        };

        let config = Self::apply_env_overrides(config);

        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(drover_core::DroverError::Config(e));
            }
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Take a snapshot of the loaded config.
    pub fn get(&self) -> DroverConfig {
        self.config.clone()
    }

    /// Path the config was read from (or would have been).
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (DROVER_BUS_BROKER_URI, DROVER_LOG_LEVEL, …).
    fn apply_env_overrides(mut config: DroverConfig) -> DroverConfig {
        if let Ok(v) = std::env::var("DROVER_BUS_BROKER_URI") {
            config.bus.broker_uri = v;
        }
        if let Ok(v) = std::env::var("DROVER_BUS_CLIENT_ID") {
            config.bus.client_id = v;
        }
        if let Ok(v) = std::env::var("DROVER_BUS_USERNAME") {
            config.bus.username = Some(v);
        }
        if let Ok(v) = std::env::var("DROVER_BUS_PASSWORD") {
            config.bus.password = Some(v);
        }
        if let Ok(v) = std::env::var("DROVER_SESSION_ID") {
            config.bus.session_id = Some(v);
        }
        if let Ok(v) = std::env::var("DROVER_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Ok(v) = std::env::var("DROVER_ALLOW_BRIDGE") {
            if let Ok(allow) = v.parse::<bool>() {
                config.scopes.allow_bridge = allow;
            }
        }
        config
    }
}
