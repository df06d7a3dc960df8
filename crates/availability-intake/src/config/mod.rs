use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::intake::domain::{CheckerConfig, ResetPolicy, DEFAULT_PLAUSIBLE_ADDRESS_MIN_LEN};
use crate::intake::gateway::{SimulatedPolicy, DEFAULT_SIMULATED_LATENCY};
use crate::intake::service::DEFAULT_SESSION_IDLE_SECS;

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
    pub intake: IntakeConfig,
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
            intake: IntakeConfig::from_env()?,
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

/// Checker tunables and the simulated gateway behind it.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub checker: CheckerConfig,
    pub gateway_latency: Duration,
    pub gateway_policy: SimulatedPolicy,
    pub session_idle_timeout: chrono::Duration,
}

impl IntakeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let plausible_address_min_len = match env::var("INTAKE_MIN_ADDRESS_LEN") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidAddressThreshold)?,
            Err(_) => DEFAULT_PLAUSIBLE_ADDRESS_MIN_LEN,
        };

        let reset_policy = match env::var("INTAKE_RESET_POLICY") {
            Ok(raw) => raw
                .parse::<ResetPolicy>()
                .map_err(|err| ConfigError::InvalidResetPolicy { value: err.0 })?,
            Err(_) => ResetPolicy::default(),
        };

        let gateway_latency = match env::var("INTAKE_GATEWAY_LATENCY_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidGatewayLatency)?,
            Err(_) => DEFAULT_SIMULATED_LATENCY,
        };

        let gateway_policy = match env::var("INTAKE_GATEWAY_POLICY") {
            Ok(raw) => raw
                .parse::<SimulatedPolicy>()
                .map_err(|err| ConfigError::InvalidGatewayPolicy { value: err.0 })?,
            Err(_) => SimulatedPolicy::default(),
        };

        let idle_secs = match env::var("INTAKE_SESSION_IDLE_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidSessionIdleTimeout)?,
            Err(_) => DEFAULT_SESSION_IDLE_SECS,
        };

        Ok(Self {
            checker: CheckerConfig {
                plausible_address_min_len,
                reset_policy,
            },
            gateway_latency,
            gateway_policy,
            session_idle_timeout: chrono::Duration::seconds(i64::from(idle_secs)),
        })
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            checker: CheckerConfig::default(),
            gateway_latency: DEFAULT_SIMULATED_LATENCY,
            gateway_policy: SimulatedPolicy::default(),
            session_idle_timeout: chrono::Duration::seconds(i64::from(DEFAULT_SESSION_IDLE_SECS)),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAddressThreshold,
    InvalidGatewayLatency,
    InvalidGatewayPolicy { value: String },
    InvalidResetPolicy { value: String },
    InvalidSessionIdleTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAddressThreshold => {
                write!(f, "INTAKE_MIN_ADDRESS_LEN must be a non-negative integer")
            }
            ConfigError::InvalidGatewayLatency => {
                write!(f, "INTAKE_GATEWAY_LATENCY_MS must be a whole number of milliseconds")
            }
            ConfigError::InvalidGatewayPolicy { value } => write!(
                f,
                "INTAKE_GATEWAY_POLICY '{}' must be one of random, eligible, not_eligible, fail",
                value
            ),
            ConfigError::InvalidResetPolicy { value } => write!(
                f,
                "INTAKE_RESET_POLICY '{}' must be keep or clear",
                value
            ),
            ConfigError::InvalidSessionIdleTimeout => {
                write!(f, "INTAKE_SESSION_IDLE_SECS must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidAddressThreshold
            | ConfigError::InvalidGatewayLatency
            | ConfigError::InvalidGatewayPolicy { .. }
            | ConfigError::InvalidResetPolicy { .. }
            | ConfigError::InvalidSessionIdleTimeout => None,
        }
    }
}
