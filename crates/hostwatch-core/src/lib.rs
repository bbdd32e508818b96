//! # Hostwatch
//!
//! Lightweight host-local resource watchdog.
//!
//! Hostwatch samples CPU and memory utilization on a fixed interval and emails
//! an alert whenever either reading exceeds its configured threshold.
//!
//! ## Architecture
//!
//! - **Sampler**: reads instantaneous CPU and memory percentages from the OS
//! - **Monitor**: the poll, evaluate, notify, sleep loop
//! - **Alerting**: breach evaluation, message composition, and SMTP delivery
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the watchdog in the foreground
//! HOSTWATCH__SMTP__PASSWORD=... hostwatch --config hostwatch.toml run
//!
//! # Take one reading without sending anything
//! hostwatch check
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerting;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod sampler;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::{AlertEvaluator, Notifier, NotifyError, SmtpNotifier};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::monitor::{Monitor, MonitorStats};
    pub use crate::sampler::{SampleError, Sampler, SystemSampler};
}
