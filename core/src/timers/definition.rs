//! Timer definition types
//!
//! Definitions are templates loaded from TOML config files that describe
//! timers to register: how often they fire, whether they loop, and the
//! delay before the first firing. Callbacks are supplied at instantiation;
//! config files only carry scheduling parameters.

use serde::{Deserialize, Serialize};

/// Definition of a timer (loaded from config)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerDefinition {
    /// Unique identifier for this timer
    pub id: String,

    /// Whether this definition may be instantiated
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between firings; must be positive
    pub rate_secs: f64,

    /// Whether the timer rearms after firing
    #[serde(default)]
    pub looping: bool,

    /// Delay before the first firing (None = use `rate_secs`)
    #[serde(default)]
    pub first_delay_secs: Option<f64>,
}

/// A config file's worth of timer definitions, as `[[timer]]` tables
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default, rename = "timer")]
    pub timers: Vec<TimerDefinition>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Serde Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn default_true() -> bool {
    true
}
