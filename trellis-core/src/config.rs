//! Engine and effect configuration.
//!
//! Both types deserialize from any serde format, so hosts can keep engine
//! settings alongside the rest of their configuration:
//!
//! ```rust
//! use trellis_core::{EngineConfig, TriggerMode};
//!
//! let config: EngineConfig = serde_json::from_str(r#"{ "default_trigger_mode": "sync" }"#).unwrap();
//! assert_eq!(config.default_trigger_mode, TriggerMode::Sync);
//! ```

use serde::{Deserialize, Serialize};

use crate::reactive::TriggerMode;

/// Settings for one [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mode used by effects that do not pick one explicitly.
    pub default_trigger_mode: TriggerMode,
}

/// Per-effect options passed to [`Engine::effect_with`](crate::Engine::effect_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectOptions {
    /// Overrides the engine's default trigger mode.
    pub trigger_mode: Option<TriggerMode>,
}

impl EffectOptions {
    /// Options selecting the given trigger mode.
    pub fn mode(trigger_mode: TriggerMode) -> Self {
        Self {
            trigger_mode: Some(trigger_mode),
        }
    }

    /// Shorthand for [`TriggerMode::Sync`].
    pub fn sync() -> Self {
        Self::mode(TriggerMode::Sync)
    }

    /// Resolve the mode against an engine configuration.
    pub fn resolve(&self, config: &EngineConfig) -> TriggerMode {
        self.trigger_mode.unwrap_or(config.default_trigger_mode)
    }
}
