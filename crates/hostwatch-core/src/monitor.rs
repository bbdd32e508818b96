//! The poll, evaluate, notify, sleep loop.
//!
//! Iterations are strictly sequential. Nothing that goes wrong inside an
//! iteration ends the loop; only the cancellation token does.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::alerting::{AlertEvaluator, Notifier};
use crate::error::Result;
use crate::models::{Breach, Reading, ThresholdConfig};
use crate::sampler::Sampler;

/// Counters accumulated over a monitor run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Iterations started
    pub iterations: u64,
    /// Samples that failed
    pub sample_failures: u64,
    /// Alerts delivered
    pub alerts_sent: u64,
    /// Alerts that could not be delivered
    pub alert_failures: u64,
}

/// What a single iteration did
#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome {
    /// Sampling failed; no evaluation took place
    SampleFailed,
    /// Reading within limits
    Healthy(Reading),
    /// Limits exceeded and the alert was delivered
    Alerted(Reading),
    /// Limits exceeded but delivery failed
    AlertFailed(Reading),
}

/// Drives sampling and alerting for one host
pub struct Monitor<S, N> {
    evaluator: AlertEvaluator,
    sampler: S,
    notifier: N,
}

impl<S: Sampler, N: Notifier> Monitor<S, N> {
    /// Create a new monitor
    pub fn new(
        thresholds: ThresholdConfig,
        sampler: S,
        notifier: N,
        hostname: impl Into<String>,
    ) -> Self {
        Self {
            evaluator: AlertEvaluator::new(thresholds, hostname),
            sampler,
            notifier,
        }
    }

    /// Run until `cancel` fires, returning the accumulated counters.
    ///
    /// Cancellation is observed at the top of each iteration and during the
    /// sleep between iterations. The sleep starts when an iteration finishes,
    /// so slow sampling or delivery pushes later samples back.
    pub async fn run_forever(&mut self, cancel: CancellationToken) -> MonitorStats {
        let thresholds = *self.evaluator.thresholds();
        let interval = thresholds.interval();

        info!(
            cpu_threshold = thresholds.cpu_threshold,
            memory_threshold = thresholds.memory_threshold,
            interval_seconds = thresholds.interval_seconds,
            "Monitoring started"
        );

        let mut stats = MonitorStats::default();

        while !cancel.is_cancelled() {
            self.run_once(&mut stats).await;

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }

        info!(
            iterations = stats.iterations,
            sample_failures = stats.sample_failures,
            alerts_sent = stats.alerts_sent,
            alert_failures = stats.alert_failures,
            "Monitoring stopped"
        );

        stats
    }

    /// Sample once, evaluate, and notify on breach
    pub async fn run_once(&mut self, stats: &mut MonitorStats) -> IterationOutcome {
        stats.iterations += 1;

        let reading = match self.sampler.sample().await {
            Ok(reading) => reading,
            Err(e) => {
                stats.sample_failures += 1;
                error!(error = %e, "Failed to sample system metrics");
                return IterationOutcome::SampleFailed;
            }
        };

        info!(
            cpu_percent = reading.cpu_percent,
            memory_percent = reading.memory_percent,
            "CPU: {:.1}%, Memory: {:.1}%",
            reading.cpu_percent,
            reading.memory_percent
        );

        let Some(alert) = self.evaluator.evaluate(&reading) else {
            return IterationOutcome::Healthy(reading);
        };

        warn!(
            cpu_breached = alert.breach.cpu,
            memory_breached = alert.breach.memory,
            "Resource threshold exceeded"
        );

        match self.notifier.send(alert.message).await {
            Ok(()) => {
                stats.alerts_sent += 1;
                IterationOutcome::Alerted(reading)
            }
            Err(e) => {
                stats.alert_failures += 1;
                error!(error = %e, "Email failed");
                IterationOutcome::AlertFailed(reading)
            }
        }
    }

    /// The limits this monitor applies
    pub fn thresholds(&self) -> &ThresholdConfig {
        self.evaluator.thresholds()
    }

    /// Take one reading and evaluate it without notifying
    pub async fn check(&mut self) -> Result<(Reading, Breach)> {
        let reading = self.sampler.sample().await?;
        let breach = self.evaluator.thresholds().check(&reading);
        Ok((reading, breach))
    }

    /// Deliver a message built from a fresh reading, whatever its values.
    ///
    /// Notifier configuration is checked before sampling.
    pub async fn send_test_alert(&mut self, subject: &str) -> Result<Reading> {
        self.notifier.check_config()?;
        let reading = self.sampler.sample().await?;
        self.notifier
            .send(self.evaluator.compose(subject, &reading))
            .await?;
        Ok(reading)
    }
}
