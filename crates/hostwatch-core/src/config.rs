//! Configuration management for Hostwatch
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `HOSTWATCH__<SECTION>__<KEY>` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::ThresholdConfig;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "HOSTWATCH";

const REDACTED: &str = "********";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sampling and threshold configuration
    pub monitor: MonitorConfig,

    /// Email delivery configuration
    pub smtp: SmtpConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an optional file plus the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env = ::config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true);
        Self::load_with_env(path, env)
    }

    fn load_with_env(path: Option<&Path>, env: ::config::Environment) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let config: Config = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the monitor cannot run with
    pub fn validate(&self) -> Result<()> {
        let monitor = &self.monitor;
        for (name, value) in [
            ("cpu_threshold", monitor.cpu_threshold),
            ("memory_threshold", monitor.memory_threshold),
        ] {
            if !(value > 0.0 && value <= 100.0) {
                return Err(Error::config(format!(
                    "monitor.{name} must be above 0 and at most 100, got {value}"
                )));
            }
        }

        if monitor.interval_seconds == 0 {
            return Err(Error::config("monitor.interval_seconds must be positive"));
        }

        if self.smtp.timeout_seconds == 0 {
            return Err(Error::config("smtp.timeout_seconds must be positive"));
        }

        Ok(())
    }

    /// The immutable thresholds handed to the monitor loop
    pub fn thresholds(&self) -> ThresholdConfig {
        ThresholdConfig {
            cpu_threshold: self.monitor.cpu_threshold,
            memory_threshold: self.monitor.memory_threshold,
            interval_seconds: self.monitor.interval_seconds,
        }
    }

    /// Copy safe for display, with the SMTP password masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.smtp.password.is_some() {
            config.smtp.password = Some(REDACTED.to_string());
        }
        config
    }
}

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// CPU alert threshold in percent
    pub cpu_threshold: f64,
    /// Memory alert threshold in percent
    pub memory_threshold: f64,
    /// Seconds between iterations
    pub interval_seconds: u64,
    /// CPU measurement window in milliseconds
    pub cpu_sample_window_ms: u64,
}

impl MonitorConfig {
    /// CPU measurement window
    pub fn cpu_sample_window(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_window_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cpu_threshold: 50.0,
            memory_threshold: 50.0,
            interval_seconds: 60,
            cpu_sample_window_ms: 1000,
        }
    }
}

/// SMTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// SMTP server hostname
    pub host: String,
    /// SMTP server port (STARTTLS)
    pub port: u16,
    /// Login name; the sender address is used when unset
    pub username: Option<String>,
    /// Login secret, usually an app password
    pub password: Option<String>,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Connection and command timeout in seconds
    pub timeout_seconds: u64,
}

impl SmtpConfig {
    /// Login name, falling back to the sender address
    pub fn login(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.from)
    }

    /// Connection and command timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            username: None,
            password: None,
            from: String::new(),
            to: String::new(),
            timeout_seconds: 30,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: LogFormat,
    /// Append-only log file; console only when unset
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: Some(PathBuf::from("hostwatch.log")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> ::config::Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ::config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(Some(source))
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_with_env(None, env(&[])).unwrap();

        assert_eq!(config.monitor.cpu_threshold, 50.0);
        assert_eq!(config.monitor.memory_threshold, 50.0);
        assert_eq!(config.monitor.interval_seconds, 60);
        assert_eq!(config.smtp.port, 587);
        assert!(config.smtp.password.is_none());
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_file_then_env() {
        let file = toml_file(
            r#"
[monitor]
cpu_threshold = 80.0
interval_seconds = 15

[smtp]
host = "smtp.example.com"
from = "watch@example.com"
to = "ops@example.com"

[logging]
format = "json"
"#,
        );

        let config = Config::load_with_env(
            Some(file.path()),
            env(&[
                ("HOSTWATCH__MONITOR__INTERVAL_SECONDS", "30"),
                ("HOSTWATCH__SMTP__PASSWORD", "app-secret"),
            ]),
        )
        .unwrap();

        assert_eq!(config.monitor.cpu_threshold, 80.0);
        assert_eq!(config.monitor.memory_threshold, 50.0);
        assert_eq!(config.monitor.interval_seconds, 30);
        assert_eq!(config.smtp.host, "smtp.example.com");
        assert_eq!(config.smtp.password.as_deref(), Some("app-secret"));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Config::load_with_env(Some(Path::new("/nonexistent/hostwatch.toml")), env(&[]));
        assert!(matches!(result, Err(Error::ConfigSource(_))));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = Config::load_with_env(
            None,
            env(&[("HOSTWATCH__MONITOR__INTERVAL_SECONDS", "0")]),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[rstest]
    #[case("cpu_threshold", 0.0)]
    #[case("cpu_threshold", -5.0)]
    #[case("cpu_threshold", f64::NAN)]
    #[case("memory_threshold", 120.0)]
    #[case("memory_threshold", 0.0)]
    fn test_rejects_threshold_out_of_range(#[case] name: &str, #[case] value: f64) {
        let mut config = Config::default();
        match name {
            "cpu_threshold" => config.monitor.cpu_threshold = value,
            _ => config.monitor.memory_threshold = value,
        }

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(name));
    }

    #[rstest]
    #[case(0.5)]
    #[case(100.0)]
    fn test_accepts_threshold_in_range(#[case] value: f64) {
        let mut config = Config::default();
        config.monitor.cpu_threshold = value;
        config.monitor.memory_threshold = value;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_thresholds() {
        let config = Config::default();
        let thresholds = config.thresholds();

        assert_eq!(thresholds.cpu_threshold, 50.0);
        assert_eq!(thresholds.interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_redacted_masks_password() {
        let mut config = Config::default();
        config.smtp.password = Some("hunter2".to_string());

        let shown = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains(REDACTED));
    }

    #[test]
    fn test_login_falls_back_to_sender() {
        let mut smtp = SmtpConfig {
            from: "watch@example.com".to_string(),
            ..SmtpConfig::default()
        };
        assert_eq!(smtp.login(), "watch@example.com");

        smtp.username = Some("relay-user".to_string());
        assert_eq!(smtp.login(), "relay-user");
    }
}
