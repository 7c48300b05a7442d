use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::pipeline::{Actor, MetricsPolicy, PipelineSettings, Stage, StageCapacity};

const DEFAULT_ACTOR: &str = "pipeline-operator";
const DEFAULT_TREND_WINDOW_DAYS: i64 = 7;

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
    pub pipeline: PipelineConfig,
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
            pipeline: PipelineConfig::from_env()?,
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

/// Pipeline policy plus the optional seed and snapshot files.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub default_actor: String,
    pub trend_window_days: i64,
    pub capacity: StageCapacity,
    pub seed_path: Option<PathBuf>,
    pub snapshot_path: Option<PathBuf>,
}

impl PipelineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let default_actor = env::var("PIPELINE_DEFAULT_ACTOR")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_ACTOR.to_string());

        let trend_window_days = match env::var("PIPELINE_TREND_WINDOW_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or(ConfigError::InvalidTrendWindow)?,
            Err(_) => DEFAULT_TREND_WINDOW_DAYS,
        };

        let mut capacity = StageCapacity::new();
        for stage in Stage::ordered() {
            let key = capacity_var(stage);
            if let Ok(raw) = env::var(&key) {
                let max = raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidCapacity { variable: key })?;
                capacity.set_limit(stage, max);
            }
        }

        Ok(Self {
            default_actor,
            trend_window_days,
            capacity,
            seed_path: path_var("PIPELINE_SEED_PATH"),
            snapshot_path: path_var("PIPELINE_SNAPSHOT_PATH"),
        })
    }

    pub fn default_actor(&self) -> Actor {
        Actor::new(self.default_actor.clone())
    }

    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            capacity: self.capacity.clone(),
            metrics: MetricsPolicy::with_trend_window_days(self.trend_window_days),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_actor: DEFAULT_ACTOR.to_string(),
            trend_window_days: DEFAULT_TREND_WINDOW_DAYS,
            capacity: StageCapacity::new(),
            seed_path: None,
            snapshot_path: None,
        }
    }
}

fn path_var(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

fn capacity_var(stage: Stage) -> String {
    format!("PIPELINE_CAPACITY_{}", stage.as_str().to_ascii_uppercase())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTrendWindow,
    InvalidCapacity { variable: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTrendWindow => {
                write!(f, "PIPELINE_TREND_WINDOW_DAYS must be a positive number of days")
            }
            ConfigError::InvalidCapacity { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTrendWindow
            | ConfigError::InvalidCapacity { .. } => None,
        }
    }
}
