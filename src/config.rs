// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the intake service.
//!
//! Values come from an optional config file (path in `INTAKE_CONFIG`) and
//! are overridden by `INTAKE__*` environment variables, e.g.
//! `INTAKE__RATE_LIMIT__WINDOW_SECS=300` or `INTAKE__NOTIFY__TO=office@example.org`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for the intake service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Take the client address from the first `X-Forwarded-For` entry.
    /// Enable only behind a reverse proxy that sets it (default: false)
    #[serde(default)]
    pub trust_forwarded_for: bool,

    /// Directory holding the JSON record files (default: ./data)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub cors: CorsConfig,
}

/// Per-origin submission throttling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum seconds between two submissions of one form from one origin (default: 300)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// How often expired records are swept from memory (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Submission log retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Records kept per form before the oldest are evicted (default: 500)
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

/// Which transport delivers operator notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Write notifications to the service log only
    Log,
    /// POST notifications to an HTTP mail relay
    Relay,
}

/// Operator notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Parish office address receiving every notification
    #[serde(default = "default_notify_to")]
    pub to: String,

    /// Envelope sender
    #[serde(default = "default_notify_from")]
    pub from: String,

    /// Upper bound on a single send attempt (default: 10)
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_transport")]
    pub transport: Transport,

    /// Relay endpoint, required when `transport = "relay"`
    #[serde(default)]
    pub relay_url: Option<String>,
}

/// Announcement administration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Argon2 PHC string of the admin password. Admin login is disabled when unset.
    #[serde(default)]
    pub password_hash: Option<String>,

    /// Session lifetime in seconds (default: 8 hours)
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

/// Cross-origin access for the static site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to post forms. Empty means same-origin only.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_window_secs() -> u64 {
    300
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_max_records() -> usize {
    500
}

fn default_notify_to() -> String {
    "Info@stpatrickigbogilaipaja.com".to_string()
}

fn default_notify_from() -> String {
    "noreply@stpatrickigbogilaipaja.com".to_string()
}

fn default_notify_timeout_secs() -> u64 {
    10
}

fn default_transport() -> Transport {
    Transport::Log
}

fn default_session_ttl_secs() -> u64 {
    8 * 60 * 60
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            trust_forwarded_for: false,
            data_dir: default_data_dir(),
            rate_limit: RateLimitConfig::default(),
            store: StoreConfig::default(),
            notify: NotifyConfig::default(),
            admin: AdminConfig::default(),
            metrics: MetricsConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            to: default_notify_to(),
            from: default_notify_from(),
            timeout_secs: default_notify_timeout_secs(),
            transport: default_transport(),
            relay_url: None,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password_hash: None,
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Load configuration from the optional file named by `INTAKE_CONFIG`
    /// and `INTAKE__*` environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var("INTAKE_CONFIG") {
            builder = builder.add_source(config::File::with_name(&path).required(false));
        }

        builder
            .add_source(
                config::Environment::with_prefix("INTAKE")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins"),
            )
            .build()?
            .try_deserialize()
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the cleanup sweep interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl NotifyConfig {
    /// Get the per-send timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AdminConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
