//! Configuration for mise, read from `.mise/mise.toml`.
//!
//! Layered as file → environment → CLI. Every section and key is optional.
//!
//! # Configuration File Format
//!
//! ```toml
//! [sync]
//! response_ordering = "last_resolved_wins"   # or "latest_issued_wins"
//!
//! [auth]
//! signup_max_attempts = 4
//! signup_base_delay_ms = 1000
//!
//! [logging]
//! level = "warn"
//! json = false
//!
//! [report]
//! timezone = "local"                         # "utc" or a fixed offset like "-05:00"
//! ```
//!
//! Environment overrides: `MISE_LOG` (a tracing filter directive),
//! `MISE_RESPONSE_ORDERING`, `MISE_SIGNUP_MAX_ATTEMPTS`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::RetryPolicy;
use crate::sync::ResponseOrdering;

pub const CONFIG_DIR: &str = ".mise";
pub const CONFIG_FILE: &str = "mise.toml";

pub const ENV_LOG: &str = "MISE_LOG";
pub const ENV_RESPONSE_ORDERING: &str = "MISE_RESPONSE_ORDERING";
pub const ENV_SIGNUP_MAX_ATTEMPTS: &str = "MISE_SIGNUP_MAX_ATTEMPTS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => anyhow::bail!(
                "Invalid log level '{}'. Valid values: error, warn, info, debug, trace",
                s
            ),
        }
    }
}

/// Zone used to decide which calendar day a timestamp belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReportZone {
    /// The machine's zone, daylight-saving changes included.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl ReportZone {
    /// Offset in effect on `day` (at its UTC midnight).
    pub fn offset_on(&self, day: NaiveDate) -> FixedOffset {
        match self {
            ReportZone::Local => Local.offset_from_utc_date(&day).fix(),
            ReportZone::Utc => Utc.fix(),
            ReportZone::Fixed(offset) => *offset,
        }
    }
}

impl std::fmt::Display for ReportZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportZone::Local => f.write_str("local"),
            ReportZone::Utc => f.write_str("utc"),
            ReportZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl FromStr for ReportZone {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "local" => return Ok(ReportZone::Local),
            "utc" | "z" => return Ok(ReportZone::Utc),
            _ => {}
        }
        parse_offset(s)
            .map(ReportZone::Fixed)
            .with_context(|| {
                format!(
                    "Invalid timezone '{}'. Valid values: local, utc, or an offset like +05:30",
                    s
                )
            })
    }
}

impl TryFrom<String> for ReportZone {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReportZone> for String {
    fn from(zone: ReportZone) -> Self {
        zone.to_string()
    }
}

/// Parse `+HH:MM` / `-HH:MM`.
fn parse_offset(s: &str) -> Result<FixedOffset> {
    let (sign, rest) = match s.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => anyhow::bail!("offset must start with + or -"),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .context("offset must look like HH:MM")?;
    let hours: i32 = hours.parse().context("invalid offset hours")?;
    let minutes: i32 = minutes.parse().context("invalid offset minutes")?;
    if !(0..60).contains(&minutes) {
        anyhow::bail!("offset minutes out of range");
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .context("offset out of range")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSection {
    /// How overlapping loads of one domain settle
    #[serde(default)]
    pub response_ordering: ResponseOrdering,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSection {
    /// Sign-up attempts, including the first, while rate limited
    #[serde(default = "default_signup_max_attempts")]
    pub signup_max_attempts: u32,
    /// First backoff delay; doubles on each retry
    #[serde(default = "default_signup_base_delay_ms")]
    pub signup_base_delay_ms: u64,
}

fn default_signup_max_attempts() -> u32 {
    4
}

fn default_signup_base_delay_ms() -> u64 {
    1000
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            signup_max_attempts: default_signup_max_attempts(),
            signup_base_delay_ms: default_signup_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: LogLevel,
    /// Emit JSON lines instead of the compact format
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    #[serde(default)]
    pub timezone: ReportZone,
}

/// Contents of `mise.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiseToml {
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub report: ReportSection,
}

impl MiseToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse mise.toml")
    }

    /// Load `<mise_dir>/mise.toml`, or defaults if it does not exist.
    pub fn load_or_default(mise_dir: &Path) -> Result<Self> {
        let config_path = mise_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize mise.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Response ordering (env → file).
    pub fn response_ordering(&self) -> ResponseOrdering {
        if let Ok(value) = std::env::var(ENV_RESPONSE_ORDERING) {
            match value.parse() {
                Ok(ordering) => return ordering,
                Err(e) => warn!(error = %e, "ignoring {}", ENV_RESPONSE_ORDERING),
            }
        }
        self.sync.response_ordering
    }

    /// Sign-up attempts (env → file).
    pub fn signup_max_attempts(&self) -> u32 {
        if let Ok(value) = std::env::var(ENV_SIGNUP_MAX_ATTEMPTS) {
            match value.trim().parse::<u32>() {
                Ok(attempts) if attempts > 0 => return attempts,
                _ => warn!(value = %value, "ignoring {}", ENV_SIGNUP_MAX_ATTEMPTS),
            }
        }
        self.auth.signup_max_attempts
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.signup_max_attempts().max(1),
            base_delay: Duration::from_millis(self.auth.signup_base_delay_ms),
        }
    }

    /// Tracing filter directive (env → file).
    pub fn log_filter(&self) -> String {
        std::env::var(ENV_LOG)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.logging.level.to_string())
    }

    /// Check for settings that parse but make no sense.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.auth.signup_max_attempts == 0 {
            warnings.push(
                "auth.signup_max_attempts is 0: sign-up will still be attempted once".to_string(),
            );
        } else if self.auth.signup_max_attempts > 8 {
            warnings.push(format!(
                "auth.signup_max_attempts = {} may keep a sign-up waiting for minutes",
                self.auth.signup_max_attempts
            ));
        }

        if self.auth.signup_base_delay_ms == 0 {
            warnings.push("auth.signup_base_delay_ms is 0: retries will not back off".to_string());
        } else if self.auth.signup_base_delay_ms > 60_000 {
            warnings.push(format!(
                "auth.signup_base_delay_ms = {} is over a minute",
                self.auth.signup_base_delay_ms
            ));
        }

        warnings
    }
}

/// Configuration merged from `mise.toml`, the environment and CLI flags.
#[derive(Debug, Clone)]
pub struct MiseConfig {
    pub project_dir: PathBuf,
    pub mise_dir: PathBuf,
    pub toml: MiseToml,
    /// CLI override: debug logging
    pub verbose: bool,
}

impl MiseConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let mise_dir = project_dir.join(CONFIG_DIR);
        let toml = MiseToml::load_or_default(&mise_dir)?;

        Ok(Self {
            project_dir,
            mise_dir,
            toml,
            verbose: false,
        })
    }

    pub fn with_cli_args(project_dir: PathBuf, verbose: bool) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        Ok(config)
    }

    pub fn config_file(&self) -> PathBuf {
        self.mise_dir.join(CONFIG_FILE)
    }

    pub fn response_ordering(&self) -> ResponseOrdering {
        self.toml.response_ordering()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.toml.retry_policy()
    }

    /// Tracing filter (CLI → env → file).
    pub fn log_filter(&self) -> String {
        if self.verbose {
            "debug".to_string()
        } else {
            self.toml.log_filter()
        }
    }

    pub fn log_json(&self) -> bool {
        self.toml.logging.json
    }

    pub fn report_zone(&self) -> ReportZone {
        self.toml.report.timezone
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
