use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs, io};
use thiserror::Error;

/// Bridge settings.
///
/// Missing keys fall back to [`BridgeConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Panic on thread violations instead of recording them. Defaults to on in debug builds.
    pub strict_thread_checks: bool,
    /// The first surface id handed out. Must be positive.
    pub first_surface_id: i32,
    /// Distance between consecutive surface ids.
    pub surface_id_step: i32,
    /// How many error records the diagnostics ring keeps.
    pub diagnostics_capacity: usize,
    pub event_thread_name: String,
    /// Warn when a synchronous update touches layout-affecting props.
    pub warn_on_layout_props: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            strict_thread_checks: cfg!(debug_assertions),
            first_surface_id: 1,
            // root ids always end in 1
            surface_id_step: 10,
            diagnostics_capacity: 64,
            event_thread_name: "surface-bridge-events".into(),
            warn_on_layout_props: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid bridge config")]
    Parse(#[from] toml::de::Error),
    #[error("first_surface_id must be positive, got {0}")]
    InvalidFirstSurfaceId(i32),
    #[error("surface_id_step must be positive, got {0}")]
    InvalidStep(i32),
}

impl BridgeConfig {
    pub fn from_toml_str(raw: &str) -> Result<BridgeConfig, ConfigError> {
        let config: BridgeConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<BridgeConfig, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        BridgeConfig::from_toml_str(&raw)
    }

    /// Applies `SURFACE_BRIDGE_*` environment variables on top of this config.
    ///
    /// Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> BridgeConfig {
        if let Some(v) = env_flag("SURFACE_BRIDGE_STRICT_THREAD_CHECKS") {
            self.strict_thread_checks = v;
        }
        if let Some(v) = env_flag("SURFACE_BRIDGE_WARN_ON_LAYOUT_PROPS") {
            self.warn_on_layout_props = v;
        }
        if let Some(v) = env::var("SURFACE_BRIDGE_DIAGNOSTICS_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.diagnostics_capacity = v;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_surface_id <= 0 {
            return Err(ConfigError::InvalidFirstSurfaceId(self.first_surface_id));
        }
        if self.surface_id_step <= 0 {
            return Err(ConfigError::InvalidStep(self.surface_id_step));
        }
        Ok(())
    }
}

fn env_flag(key: &str) -> Option<bool> {
    match env::var(key).ok()?.trim() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}
