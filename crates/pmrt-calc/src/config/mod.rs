use crate::calculator::{FormVariant, SentinelMode};
use std::collections::BTreeMap;
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

/// Top-level configuration for the calculator binaries.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub calculator: CalculatorConfig,
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
        let format = match env::var("APP_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw)?,
            Err(_) => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            calculator: CalculatorConfig::from_env()?,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidLogFormat(raw.to_string())),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

/// Where the model tables live and how the form behaves.
#[derive(Debug, Clone)]
pub struct CalculatorConfig {
    pub data_dir: PathBuf,
    pub model: String,
    pub variant: FormVariant,
}

impl CalculatorConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let data_dir = PathBuf::from(env::var("PMRT_DATA_DIR").unwrap_or_else(|_| "data".into()));
        let model = env::var("PMRT_MODEL").unwrap_or_else(|_| "Logistic Lasso".to_string());

        let mut variant = FormVariant::default();
        if let Ok(raw) = env::var("PMRT_ROUNDING_BASE") {
            variant.rounding_base = parse_rounding_base(&raw)?;
        }
        if let Ok(raw) = env::var("PMRT_SENTINEL_MODE") {
            variant.sentinel_mode = parse_sentinel_mode(&raw)?;
        }
        if let Ok(raw) = env::var("PMRT_FIXED_FEATURES") {
            variant.fixed_values = parse_fixed_values(&raw)?;
        }
        if let Ok(raw) = env::var("PMRT_OUTCOME_LABEL") {
            if !raw.trim().is_empty() {
                variant.outcome_label = raw.trim().to_string();
            }
        }

        Ok(Self {
            data_dir,
            model,
            variant,
        })
    }
}

pub fn parse_rounding_base(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(base) if base.is_finite() && base > 0.0 => Ok(base),
        _ => Err(ConfigError::InvalidRoundingBase(raw.to_string())),
    }
}

pub fn parse_sentinel_mode(raw: &str) -> Result<SentinelMode, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "sentinel" | "missing" => Ok(SentinelMode::Sentinel),
        "fallback" | "average" => Ok(SentinelMode::Fallback),
        _ => Err(ConfigError::InvalidSentinelMode(raw.to_string())),
    }
}

/// Parse `feature=value` pairs separated by commas.
pub fn parse_fixed_values(raw: &str) -> Result<BTreeMap<String, f64>, ConfigError> {
    let mut values = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (feature, value) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidFixedValue(pair.to_string()))?;
        let feature = feature.trim();
        let value = value
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidFixedValue(pair.to_string()))?;
        if feature.is_empty() || !value.is_finite() {
            return Err(ConfigError::InvalidFixedValue(pair.to_string()));
        }
        values.insert(feature.to_string(), value);
    }
    Ok(values)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat(String),
    InvalidRoundingBase(String),
    InvalidSentinelMode(String),
    InvalidFixedValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat(value) => {
                write!(f, "APP_LOG_FORMAT must be 'compact' or 'json', got '{value}'")
            }
            ConfigError::InvalidRoundingBase(value) => {
                write!(f, "PMRT_ROUNDING_BASE must be a positive number, got '{value}'")
            }
            ConfigError::InvalidSentinelMode(value) => write!(
                f,
                "PMRT_SENTINEL_MODE must be 'sentinel' or 'fallback', got '{value}'"
            ),
            ConfigError::InvalidFixedValue(pair) => write!(
                f,
                "PMRT_FIXED_FEATURES entries must look like feature=number, got '{pair}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
