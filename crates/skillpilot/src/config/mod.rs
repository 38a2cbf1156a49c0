use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use chrono::{Duration as DateSpan, NaiveDate};

use crate::workflows::placement::{DeadlineOrderError, RankingDeadlines};
use crate::workflows::ranking::{CoveragePolicy, PolicyParseError};

/// Distinguishes runtime behavior for different stages of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the coordinator and the placement service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub portal: PortalConfig,
    pub ranking: RankingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let base_url =
            env::var("PORTAL_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl { value: base_url });
        }

        let timeout_secs = env::var("PORTAL_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidTimeout)?;

        let student_policy = load_policy("STUDENT_RANK_POLICY", "fixed:5")?;
        let opportunity_policy = load_policy("OPPORTUNITY_RANK_POLICY", "fraction:0.5")?;
        let deadlines = load_deadlines()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            portal: PortalConfig {
                base_url,
                request_timeout: Duration::from_secs(timeout_secs),
            },
            ranking: RankingConfig {
                student_policy,
                opportunity_policy,
                deadlines,
            },
        })
    }
}

/// Deadlines are off unless `DETAILS_DEADLINE` is set. Later deadlines default to a week
/// after the one before.
fn load_deadlines() -> Result<Option<RankingDeadlines>, ConfigError> {
    let Some(details) = load_date("DETAILS_DEADLINE")? else {
        return Ok(None);
    };
    let student_ranking =
        load_date("STUDENT_RANKING_DEADLINE")?.unwrap_or(details + DateSpan::weeks(1));
    let opportunity_ranking = load_date("OPPORTUNITY_RANKING_DEADLINE")?
        .unwrap_or(student_ranking + DateSpan::weeks(1));

    RankingDeadlines::new(details, student_ranking, opportunity_ranking)
        .map(Some)
        .map_err(ConfigError::DeadlineOrder)
}

fn load_date(key: &'static str) -> Result<Option<NaiveDate>, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ConfigError::InvalidDeadline { key, value: raw }),
        _ => Ok(None),
    }
}

fn load_policy(key: &'static str, default: &str) -> Result<CoveragePolicy, ConfigError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|source| ConfigError::InvalidRankPolicy { key, source })
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the coordinator sends its requests and how long it waits for each one.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

/// Coverage thresholds, one per ranking screen. The two screens historically disagreed, so
/// they stay separate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingConfig {
    pub student_policy: CoveragePolicy,
    pub opportunity_policy: CoveragePolicy,
    pub deadlines: Option<RankingDeadlines>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidBaseUrl {
        value: String,
    },
    InvalidTimeout,
    InvalidRankPolicy {
        key: &'static str,
        source: PolicyParseError,
    },
    InvalidDeadline {
        key: &'static str,
        value: String,
    },
    DeadlineOrder(DeadlineOrderError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBaseUrl { value } => {
                write!(f, "PORTAL_BASE_URL must be an http(s) URL, got '{value}'")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "PORTAL_REQUEST_TIMEOUT_SECS must be a positive integer")
            }
            ConfigError::InvalidRankPolicy { key, source } => write!(f, "{key}: {source}"),
            ConfigError::InvalidDeadline { key, value } => {
                write!(f, "{key} must be a YYYY-MM-DD date, got '{value}'")
            }
            ConfigError::DeadlineOrder(source) => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidRankPolicy { source, .. } => Some(source),
            ConfigError::DeadlineOrder(source) => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidBaseUrl { .. }
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidDeadline { .. } => None,
        }
    }
}
