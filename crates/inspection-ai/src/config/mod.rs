use crate::workflows::inspection::{ReadinessPolicy, Trade, UnknownTrade};
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
    pub inspection: InspectionConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            inspection: InspectionConfig::from_env()?,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Mapping persistence and readiness policy.
#[derive(Debug, Clone)]
pub struct InspectionConfig {
    /// CSV mapping store; the service keeps mappings in memory when unset.
    pub mapping_path: Option<PathBuf>,
    pub policy: ReadinessPolicy,
}

impl InspectionConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mapping_path = non_empty_var("INSPECTION_MAPPING_PATH").map(PathBuf::from);

        let mut policy = ReadinessPolicy::default();
        if let Some(value) = non_empty_var("INSPECTION_MAJOR_THRESHOLD") {
            let threshold = value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|threshold| *threshold >= 1)
                .ok_or(ConfigError::InvalidMajorThreshold { value })?;
            policy = policy.with_major_finding_threshold(threshold);
        }
        if let Some(value) = non_empty_var("INSPECTION_EXPECTED_TRADES") {
            for (jurisdiction, trades) in parse_expected_trades(&value)? {
                policy = policy.with_expectation(&jurisdiction, trades);
            }
        }
        if let Some(value) = non_empty_var("INSPECTION_DEFAULT_JURISDICTION") {
            policy = policy.with_default_jurisdiction(&value);
        }

        Ok(Self {
            mapping_path,
            policy,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Parse `VIC=electrical,plumbing;NSW=painting` into per-jurisdiction trade lists.
pub fn parse_expected_trades(value: &str) -> Result<Vec<(String, Vec<Trade>)>, ConfigError> {
    let mut expectations = Vec::new();
    for clause in value.split(';').map(str::trim).filter(|clause| !clause.is_empty()) {
        let (jurisdiction, trades) = clause
            .split_once('=')
            .filter(|(jurisdiction, _)| !jurisdiction.trim().is_empty())
            .ok_or_else(|| ConfigError::InvalidExpectation {
                clause: clause.to_string(),
            })?;

        let trades = trades
            .split(',')
            .map(str::trim)
            .filter(|trade| !trade.is_empty())
            .map(|trade| trade.parse::<Trade>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ConfigError::UnknownTrade { source })?;

        expectations.push((jurisdiction.trim().to_string(), trades));
    }
    Ok(expectations)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidMajorThreshold { value: String },
    InvalidExpectation { clause: String },
    UnknownTrade { source: UnknownTrade },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidMajorThreshold { value } => write!(
                f,
                "INSPECTION_MAJOR_THRESHOLD must be a whole number of at least 1, got '{value}'"
            ),
            ConfigError::InvalidExpectation { clause } => write!(
                f,
                "INSPECTION_EXPECTED_TRADES entry '{clause}' must look like JURISDICTION=trade,trade"
            ),
            ConfigError::UnknownTrade { source } => {
                write!(f, "INSPECTION_EXPECTED_TRADES: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::UnknownTrade { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidMajorThreshold { .. }
            | ConfigError::InvalidExpectation { .. } => None,
        }
    }
}
