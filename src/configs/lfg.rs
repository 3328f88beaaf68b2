use serde::{Deserialize, Serialize};

/// Timing knobs of the session lifecycle. All deadlines are re-derived from
/// stored timestamps by the sweep, so changing them affects live sessions.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LfgConfig {
    /// How long a full team has to confirm before unconfirmed players drop.
    pub confirm_timeout_secs: u64,
    /// How long a session may sit with only its creator before expiring.
    pub no_joiner_timeout_secs: u64,
    /// Interval of the deadline sweep.
    pub sweep_interval_secs: u64,
    /// How long an active (fully confirmed) session is kept before cleanup.
    pub active_ttl_secs: u64,
}

impl Default for LfgConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: 120,
            no_joiner_timeout_secs: 1200,
            sweep_interval_secs: 60,
            active_ttl_secs: 7200,
        }
    }
}

impl LfgConfig {
    pub fn confirm_timeout_ms(&self) -> u64 {
        self.confirm_timeout_secs * 1000
    }

    pub fn no_joiner_timeout_ms(&self) -> u64 {
        self.no_joiner_timeout_secs * 1000
    }

    pub fn active_ttl_ms(&self) -> u64 {
        self.active_ttl_secs * 1000
    }
}
