//! Rune Motion configuration system
//!
//! This crate provides centralized configuration for the motion runtime,
//! loading settings from `rune-motion.toml` with environment variable
//! overrides layered on top.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default configuration file name, resolved against the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "rune-motion.toml";

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is outside its allowed range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Main configuration structure for the motion runtime
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    /// Navigation gate settings
    pub gate: GateConfig,
    /// Default transition timing applied when an element leaves a field unset
    pub transition: TransitionDefaults,
    /// Interaction (hover/tap/focus) settings
    pub interaction: InteractionConfig,
    /// Diagnostics
    pub debug: DebugConfig,
}

/// How the gate resolves a navigation requested while another is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Cancel the in-flight request and proceed with the newer one.
    #[default]
    Supersede,
    /// Hold the newer request until the in-flight one commits.
    Queue,
    /// Refuse the newer request.
    Reject,
}

impl CollisionPolicy {
    /// Parse a policy name as used in config files and env overrides.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "supersede" => Some(Self::Supersede),
            "queue" => Some(Self::Queue),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Navigation gate configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Lower bound of the barrier window in milliseconds
    pub fallback_timeout_ms: f64,
    /// Longest declared exit that may stretch the barrier past the fallback.
    /// Scopes declaring a longer exit are held for the fallback only.
    pub max_exit_window_ms: f64,
    /// Policy for colliding navigation requests
    pub collision_policy: CollisionPolicy,
    /// Ask the retention adapter to keep the outgoing view alive
    pub detain_outgoing: bool,
    /// Number of finished navigation requests kept for inspection
    pub history_limit: usize,
}

/// Default transition timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransitionDefaults {
    pub duration_ms: f64,
    pub delay_ms: f64,
    /// Easing name (`linear`, `ease`, `ease-in`, `ease-out`, `ease-in-out`)
    pub easing: String,
    pub repeat_delay_ms: f64,
}

/// Interaction configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InteractionConfig {
    /// Debounce before a hover excursion is restored on pointer leave
    pub hover_leave_delay_ms: f64,
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DebugConfig {
    /// Emit debug-level lifecycle logs from the gate and registry
    pub enabled: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            fallback_timeout_ms: 1500.0,
            max_exit_window_ms: 10_000.0,
            collision_policy: CollisionPolicy::Supersede,
            detain_outgoing: true,
            history_limit: 32,
        }
    }
}

impl Default for TransitionDefaults {
    fn default() -> Self {
        Self {
            duration_ms: 300.0,
            delay_ms: 0.0,
            easing: "ease".to_string(),
            repeat_delay_ms: 0.0,
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hover_leave_delay_ms: 100.0,
        }
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a finite, non-negative number, got {value}"),
        })
    }
}

impl MotionConfig {
    /// Load configuration from a TOML file
    ///
    /// The parsed configuration is validated before it is returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location or return defaults if
    /// the file is missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_FILE).unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    /// Unparsable values are ignored.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("RUNE_MOTION_FALLBACK_MS") {
            if let Ok(ms) = val.parse::<f64>() {
                if ms.is_finite() && ms >= 0.0 {
                    self.gate.fallback_timeout_ms = ms;
                }
            }
        }
        if let Ok(val) = std::env::var("RUNE_MOTION_COLLISION") {
            if let Some(policy) = CollisionPolicy::from_name(&val) {
                self.gate.collision_policy = policy;
            }
        }
        if let Ok(val) = std::env::var("RUNE_MOTION_DEBUG") {
            self.debug.enabled = env_flag(&val);
        }
        if let Ok(val) = std::env::var("RUNE_MOTION_DURATION_MS") {
            if let Ok(ms) = val.parse::<f64>() {
                if ms.is_finite() && ms >= 0.0 {
                    self.transition.duration_ms = ms;
                }
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from rune-motion.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }

    /// Check numeric ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("gate.fallback_timeout_ms", self.gate.fallback_timeout_ms)?;
        non_negative("gate.max_exit_window_ms", self.gate.max_exit_window_ms)?;
        non_negative("transition.duration_ms", self.transition.duration_ms)?;
        non_negative("transition.delay_ms", self.transition.delay_ms)?;
        non_negative("transition.repeat_delay_ms", self.transition.repeat_delay_ms)?;
        non_negative(
            "interaction.hover_leave_delay_ms",
            self.interaction.hover_leave_delay_ms,
        )?;
        if self.transition.easing.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "transition.easing",
                reason: "easing name is empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MotionConfig::default();
        assert_eq!(config.gate.fallback_timeout_ms, 1500.0);
        assert_eq!(config.gate.max_exit_window_ms, 10_000.0);
        assert_eq!(config.gate.collision_policy, CollisionPolicy::Supersede);
        assert!(config.gate.detain_outgoing);
        assert_eq!(config.transition.duration_ms, 300.0);
        assert_eq!(config.interaction.hover_leave_delay_ms, 100.0);
        assert!(!config.debug.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_serialization() {
        let config = MotionConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: MotionConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = MotionConfig::from_toml_str(
            r#"
            [gate]
            fallback_timeout_ms = 1000
            collision_policy = "reject"
            "#,
        )
        .unwrap();
        assert_eq!(config.gate.fallback_timeout_ms, 1000.0);
        assert_eq!(config.gate.collision_policy, CollisionPolicy::Reject);
        assert_eq!(config.gate.history_limit, 32);
        assert_eq!(config.transition.easing, "ease");
    }

    #[test]
    fn test_exit_window_parses_and_validates() {
        let config = MotionConfig::from_toml_str("[gate]\nmax_exit_window_ms = 2500\n").unwrap();
        assert_eq!(config.gate.max_exit_window_ms, 2500.0);
        assert_eq!(config.gate.fallback_timeout_ms, 1500.0);

        let err = MotionConfig::from_toml_str("[gate]\nmax_exit_window_ms = -1\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "gate.max_exit_window_ms",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = MotionConfig::from_toml_str("[gate]\nfallback_timeout_ms = -5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "gate.fallback_timeout_ms",
                ..
            }
        ));

        let err = MotionConfig::from_toml_str("[gate]\ncollision_policy = \"sometimes\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_or_default() {
        let config = MotionConfig::load_or_default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_collision_policy_names() {
        assert_eq!(CollisionPolicy::from_name("Queue"), Some(CollisionPolicy::Queue));
        assert_eq!(CollisionPolicy::from_name(" reject "), Some(CollisionPolicy::Reject));
        assert_eq!(CollisionPolicy::from_name("drop"), None);
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("RUNE_MOTION_FALLBACK_MS", "750");
            std::env::set_var("RUNE_MOTION_COLLISION", "queue");
            std::env::set_var("RUNE_MOTION_DEBUG", "true");
        }

        let mut config = MotionConfig::default();
        config.merge_with_env();

        assert_eq!(config.gate.fallback_timeout_ms, 750.0);
        assert_eq!(config.gate.collision_policy, CollisionPolicy::Queue);
        assert!(config.debug.enabled);

        unsafe {
            std::env::remove_var("RUNE_MOTION_FALLBACK_MS");
            std::env::remove_var("RUNE_MOTION_COLLISION");
            std::env::remove_var("RUNE_MOTION_DEBUG");
        }
    }
}
