//! Resource reading models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sample of host utilization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Global CPU utilization, 0-100
    pub cpu_percent: f64,

    /// Physical memory in use, 0-100
    pub memory_percent: f64,

    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    /// Create a reading stamped with the current time
    pub fn new(cpu_percent: f64, memory_percent: f64) -> Self {
        Self::at(cpu_percent, memory_percent, Utc::now())
    }

    /// Create a reading with an explicit timestamp
    pub fn at(cpu_percent: f64, memory_percent: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            cpu_percent,
            memory_percent,
            timestamp,
        }
    }
}
