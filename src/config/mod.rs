use crate::awards::{AwardThresholds, DateRangePolicy, ThresholdError};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub awards: AwardConfig,
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

        let catalog_path = env::var("AWARD_CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("summits.csv"));
        let summary_path = env::var("AWARD_SUMMARY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("awards_summary.json"));

        let tiers = match env::var("AWARD_TIERS") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.parse::<AwardThresholds>()
                    .map_err(|source| ConfigError::InvalidTiers { source })?,
            ),
            _ => None,
        };

        let date_range = match env::var("AWARD_DATE_RANGE") {
            Ok(raw) => raw
                .parse::<DateRangePolicy>()
                .map_err(ConfigError::InvalidDateRange)?,
            Err(_) => DateRangePolicy::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            awards: AwardConfig {
                catalog_path,
                summary_path,
                tiers,
                date_range,
            },
        })
    }
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

/// Input locations and award rules.
#[derive(Debug, Clone)]
pub struct AwardConfig {
    pub catalog_path: PathBuf,
    pub summary_path: PathBuf,
    /// Explicit tier table; `None` means the standard ladder for the catalog.
    pub tiers: Option<AwardThresholds>,
    pub date_range: DateRangePolicy,
}

impl AwardConfig {
    pub fn thresholds_for(&self, total_summits: usize) -> AwardThresholds {
        self.tiers
            .clone()
            .unwrap_or_else(|| AwardThresholds::standard(total_summits))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTiers { source: ThresholdError },
    InvalidDateRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16 port number"),
            ConfigError::InvalidHost { source } => {
                write!(f, "APP_HOST must be a valid IP address ({source})")
            }
            ConfigError::InvalidTiers { source } => {
                write!(f, "AWARD_TIERS is not a valid tier table ({source})")
            }
            ConfigError::InvalidDateRange(reason) => {
                write!(f, "AWARD_DATE_RANGE is invalid ({reason})")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidDateRange(_) => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidTiers { source } => Some(source),
        }
    }
}
