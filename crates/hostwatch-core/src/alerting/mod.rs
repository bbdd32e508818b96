//! Alerting system for Hostwatch
//!
//! Provides threshold breach evaluation, alert composition, and email delivery.

mod evaluator;
mod notifier;

pub use evaluator::{Alert, AlertEvaluator, ALERT_SUBJECT};
pub use notifier::{Notifier, NotifyError, SmtpNotifier};
