//! # Engine Configuration
//!
//! Configuration for the availability orchestrator.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SEATWISE_SLOT_GRANULARITY_MINUTES=15                               │
//! │     SEATWISE_HOLD_TTL_SECS=600                                         │
//! │                                                                         │
//! │  2. TOML Config File (path supplied by the host application)           │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     30-min slots, 2.0 oversize ratio, 5-min holds, 5-sec deadlines     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # seatwise.toml
//! [search]
//! slot_granularity_minutes = 30
//! max_oversize_ratio = 2.0
//! type_preference = ["booth", "window"]
//!
//! [holds]
//! ttl_secs = 300
//!
//! [deadlines]
//! call_deadline_ms = 5000
//!
//! [cache]
//! ttl_secs = 30   # omit the section to disable caching
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use seatwise_core::{TableType, DEFAULT_MAX_OVERSIZE_RATIO, DEFAULT_SLOT_GRANULARITY_MINUTES};

use crate::error::{OrchestratorError, OrchestratorResult};

// =============================================================================
// Search Settings
// =============================================================================

/// Slot-search behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Distance between consecutive probed slots (minutes).
    #[serde(default = "default_granularity")]
    pub slot_granularity_minutes: u32,

    /// Upper bound on combination size relative to the party:
    /// `combined_capacity <= party_size * max_oversize_ratio`.
    #[serde(default = "default_oversize_ratio")]
    pub max_oversize_ratio: f64,

    /// Preferred table types, best first. Candidates of preferred types
    /// rank earlier at equal wasted capacity. Empty = no preference.
    #[serde(default)]
    pub type_preference: Vec<TableType>,
}

fn default_granularity() -> u32 {
    DEFAULT_SLOT_GRANULARITY_MINUTES
}

fn default_oversize_ratio() -> f64 {
    DEFAULT_MAX_OVERSIZE_RATIO
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            slot_granularity_minutes: default_granularity(),
            max_oversize_ratio: default_oversize_ratio(),
            type_preference: Vec::new(),
        }
    }
}

// =============================================================================
// Hold Settings
// =============================================================================

/// Hold lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldSettings {
    /// How long a proposed hold occupies its tables before expiring (seconds).
    #[serde(default = "default_hold_ttl")]
    pub ttl_secs: u64,
}

fn default_hold_ttl() -> u64 {
    300
}

impl Default for HoldSettings {
    fn default() -> Self {
        HoldSettings {
            ttl_secs: default_hold_ttl(),
        }
    }
}

// =============================================================================
// Deadline Settings
// =============================================================================

/// Per-call deadline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineSettings {
    /// Deadline applied to every collaborator call (milliseconds).
    #[serde(default = "default_call_deadline")]
    pub call_deadline_ms: u64,
}

fn default_call_deadline() -> u64 {
    5_000
}

impl Default for DeadlineSettings {
    fn default() -> Self {
        DeadlineSettings {
            call_deadline_ms: default_call_deadline(),
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Search-result cache settings. Absent section = caching disabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// How long a cached search result stays fresh (seconds).
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_ttl() -> u64 {
    30
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Slot-search behavior.
    #[serde(default)]
    pub search: SearchSettings,

    /// Hold lifecycle.
    #[serde(default)]
    pub holds: HoldSettings,

    /// Collaborator call deadlines.
    #[serde(default)]
    pub deadlines: DeadlineSettings,

    /// Search-result caching. `None` disables the cache.
    #[serde(default)]
    pub cache: Option<CacheSettings>,
}

impl EngineConfig {
    /// Creates a config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (seatwise.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> OrchestratorResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| OrchestratorError::Config(e.to_string()))?;
                config = toml::from_str(&contents)
                    .map_err(|e| OrchestratorError::Config(e.to_string()))?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.search.slot_granularity_minutes == 0 {
            return Err(OrchestratorError::Config(
                "slot_granularity_minutes must be greater than 0".into(),
            ));
        }

        if self.search.max_oversize_ratio < 1.0 {
            return Err(OrchestratorError::Config(
                "max_oversize_ratio must be at least 1.0".into(),
            ));
        }

        if self.holds.ttl_secs == 0 {
            return Err(OrchestratorError::Config(
                "holds.ttl_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SEATWISE_SLOT_GRANULARITY_MINUTES") {
            if let Ok(mins) = v.parse::<u32>() {
                debug!(minutes = mins, "Overriding slot granularity from environment");
                self.search.slot_granularity_minutes = mins;
            }
        }

        if let Ok(v) = std::env::var("SEATWISE_MAX_OVERSIZE_RATIO") {
            if let Ok(ratio) = v.parse::<f64>() {
                self.search.max_oversize_ratio = ratio;
            }
        }

        if let Ok(v) = std::env::var("SEATWISE_HOLD_TTL_SECS") {
            if let Ok(secs) = v.parse::<u64>() {
                debug!(secs, "Overriding hold TTL from environment");
                self.holds.ttl_secs = secs;
            }
        }

        if let Ok(v) = std::env::var("SEATWISE_CALL_DEADLINE_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                self.deadlines.call_deadline_ms = ms;
            }
        }
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Hold TTL as a chrono duration.
    pub fn hold_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.holds.ttl_secs as i64)
    }

    /// Collaborator call deadline as a std duration.
    pub fn call_deadline(&self) -> Duration {
        Duration::from_millis(self.deadlines.call_deadline_ms)
    }

    /// Cache TTL, when caching is enabled.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache.as_ref().map(|c| Duration::from_secs(c.ttl_secs))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
