//! CPU and memory sampling.
//!
//! [`SystemSampler`] wraps a `sysinfo::System` limited to CPU usage and RAM.
//! CPU usage is a delta between two refreshes, so every sample waits out a
//! short measurement window before the reading is produced.

use async_trait::async_trait;
use std::time::Duration;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tracing::debug;

use crate::models::Reading;

/// Errors produced while sampling
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// The OS could not provide a usable value
    #[error("{metric} metric unavailable: {reason}")]
    MetricUnavailable {
        /// Which metric failed ("cpu" or "memory")
        metric: &'static str,
        /// What went wrong
        reason: String,
    },
}

impl SampleError {
    /// Create a metric unavailable error
    pub fn unavailable(metric: &'static str, reason: impl Into<String>) -> Self {
        Self::MetricUnavailable {
            metric,
            reason: reason.into(),
        }
    }
}

/// Source of [`Reading`]s
#[async_trait]
pub trait Sampler: Send {
    /// Take one reading. Returns only after any measurement window has elapsed.
    async fn sample(&mut self) -> Result<Reading, SampleError>;
}

/// Samples the local host through `sysinfo`
pub struct SystemSampler {
    system: System,
    window: Duration,
}

impl SystemSampler {
    /// Create a sampler that averages CPU usage over `window`.
    ///
    /// Windows shorter than `sysinfo::MINIMUM_CPU_UPDATE_INTERVAL` are raised
    /// to it, since shorter deltas are meaningless.
    pub fn new(window: Duration) -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
            .with_memory(MemoryRefreshKind::nothing().with_ram());

        Self {
            system: System::new_with_specifics(refresh_kind),
            window: window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    /// The effective CPU measurement window
    pub fn window(&self) -> Duration {
        self.window
    }
}

#[async_trait]
impl Sampler for SystemSampler {
    async fn sample(&mut self) -> Result<Reading, SampleError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(SampleError::unavailable(
                "cpu",
                "platform is not supported by sysinfo",
            ));
        }

        self.system.refresh_cpu_usage();
        tokio::time::sleep(self.window).await;
        self.system.refresh_cpu_usage();
        self.system
            .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());

        let total = self.system.total_memory();
        if total == 0 {
            return Err(SampleError::unavailable(
                "memory",
                "total memory reported as zero",
            ));
        }

        #[allow(clippy::cast_precision_loss)]
        let memory = self.system.used_memory() as f64 / total as f64 * 100.0;
        let cpu = f64::from(self.system.global_cpu_usage());

        debug!(window_ms = self.window.as_millis(), "Sampled system metrics");

        Ok(Reading::new(
            normalize("cpu", cpu)?,
            normalize("memory", memory)?,
        ))
    }
}

/// Host name used in alert bodies
pub fn host_name() -> String {
    System::host_name().unwrap_or_else(|| "unknown-host".to_string())
}

/// Clamp a percentage into [0, 100]; non-finite values are unusable.
pub fn normalize(metric: &'static str, value: f64) -> Result<f64, SampleError> {
    if !value.is_finite() {
        return Err(SampleError::unavailable(
            metric,
            format!("non-finite value {value}"),
        ));
    }
    Ok(value.clamp(0.0, 100.0))
}
