//! Threshold evaluation and alert composition

use crate::models::{AlertMessage, Breach, Reading, ThresholdConfig};

/// Subject line for every threshold alert
pub const ALERT_SUBJECT: &str = "Server Alert: High Usage";

/// A breach together with the message describing it
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Which limits were exceeded
    pub breach: Breach,
    /// Message to deliver
    pub message: AlertMessage,
}

/// Turns readings into alerts.
///
/// Holds no state between readings: the same reading always yields the same
/// decision.
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    thresholds: ThresholdConfig,
    hostname: String,
}

impl AlertEvaluator {
    /// Create an evaluator for the given limits
    pub fn new(thresholds: ThresholdConfig, hostname: impl Into<String>) -> Self {
        Self {
            thresholds,
            hostname: hostname.into(),
        }
    }

    /// The limits this evaluator applies
    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    /// Returns an alert when either limit is exceeded
    pub fn evaluate(&self, reading: &Reading) -> Option<Alert> {
        let breach = self.thresholds.check(reading);
        if !breach.any() {
            return None;
        }

        Some(Alert {
            breach,
            message: self.compose(ALERT_SUBJECT, reading),
        })
    }

    /// Build a message naming both readings and both limits
    pub fn compose(&self, subject: &str, reading: &Reading) -> AlertMessage {
        let body = format!(
            "⚠️ High resource usage detected on {host}!\n\
             \n\
             CPU Usage: {cpu:.1}% (Limit: {cpu_limit}%)\n\
             Memory Usage: {memory:.1}% (Limit: {memory_limit}%)\n\
             \n\
             Sampled at: {at}",
            host = self.hostname,
            cpu = reading.cpu_percent,
            cpu_limit = self.thresholds.cpu_threshold,
            memory = reading.memory_percent,
            memory_limit = self.thresholds.memory_threshold,
            at = reading.timestamp.to_rfc3339(),
        );

        AlertMessage {
            subject: subject.to_string(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn evaluator() -> AlertEvaluator {
        AlertEvaluator::new(
            ThresholdConfig {
                cpu_threshold: 50.0,
                memory_threshold: 50.0,
                interval_seconds: 60,
            },
            "web-01",
        )
    }

    #[test]
    fn test_high_cpu_alerts() {
        let alert = evaluator()
            .evaluate(&Reading::new(75.0, 30.0))
            .expect("cpu above limit should alert");

        assert!(alert.breach.cpu);
        assert!(!alert.breach.memory);
        assert!(alert.message.subject.contains("High Usage"));
        assert!(alert.message.body.contains("75.0"));
        assert!(alert.message.body.contains("50"));
    }

    #[test]
    fn test_below_limits_is_quiet() {
        assert!(evaluator().evaluate(&Reading::new(10.0, 20.0)).is_none());
    }

    #[test]
    fn test_equal_to_limit_is_quiet() {
        assert!(evaluator().evaluate(&Reading::new(50.0, 50.0)).is_none());
    }

    #[test]
    fn test_same_reading_same_decision() {
        let evaluator = evaluator();
        let reading = Reading::new(20.0, 88.8);

        assert_eq!(evaluator.evaluate(&reading), evaluator.evaluate(&reading));
    }

    #[test]
    fn test_message_layout() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let message = evaluator().compose(ALERT_SUBJECT, &Reading::at(75.0, 30.4, at));

        assert_eq!(message.subject, "Server Alert: High Usage");
        assert_eq!(
            message.body,
            "⚠️ High resource usage detected on web-01!\n\
             \n\
             CPU Usage: 75.0% (Limit: 50%)\n\
             Memory Usage: 30.4% (Limit: 50%)\n\
             \n\
             Sampled at: 2026-03-01T12:00:00+00:00"
        );
    }
}
