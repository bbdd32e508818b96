//! Threshold and alert models

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Reading;

/// Alert limits and polling cadence, fixed for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// CPU percentage that must be exceeded to alert
    pub cpu_threshold: f64,

    /// Memory percentage that must be exceeded to alert
    pub memory_threshold: f64,

    /// Seconds to sleep between iterations
    pub interval_seconds: u64,
}

impl ThresholdConfig {
    /// Pause between the end of one iteration and the start of the next
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Compare a reading against both limits.
    ///
    /// Comparison is strict: a reading equal to its limit is not a breach.
    pub fn check(&self, reading: &Reading) -> Breach {
        Breach {
            cpu: reading.cpu_percent > self.cpu_threshold,
            memory: reading.memory_percent > self.memory_threshold,
        }
    }
}

/// Which limits a reading exceeded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breach {
    /// CPU limit exceeded
    pub cpu: bool,
    /// Memory limit exceeded
    pub memory: bool,
}

impl Breach {
    /// True when at least one limit was exceeded
    pub fn any(&self) -> bool {
        self.cpu || self.memory
    }
}

/// A notification ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub body: String,
}
