use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::workflows::approvals::{EscalationPolicy, TransitionTable};
use crate::workflows::prenomina::PayrollRates;

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
    pub escalation: EscalationConfig,
    pub payroll: PayrollRates,
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

        let escalation = EscalationConfig {
            threshold_hours: parsed_var("ESCALATION_THRESHOLD_HOURS", 24)?,
            sweep_interval_secs: parsed_var("ESCALATION_SWEEP_INTERVAL_SECS", 900)?,
            blue_gray_skip_general_manager: flag_var("ESCALATION_BLUE_GRAY_SKIP_GM", true)?,
        };
        if escalation.threshold_hours == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ESCALATION_THRESHOLD_HOURS",
                value: "0".to_string(),
            });
        }
        if escalation.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ESCALATION_SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let defaults = PayrollRates::default();
        let payroll = PayrollRates {
            overtime_rate_pct: parsed_var("PAYROLL_OVERTIME_RATE_PCT", defaults.overtime_rate_pct)?,
            double_overtime_rate_pct: parsed_var(
                "PAYROLL_DOUBLE_OVERTIME_RATE_PCT",
                defaults.double_overtime_rate_pct,
            )?,
            aguinaldo_days: parsed_var("PAYROLL_AGUINALDO_DAYS", defaults.aguinaldo_days)?,
            vacation_days: parsed_var("PAYROLL_VACATION_DAYS", defaults.vacation_days)?,
            vacation_premium_pct: parsed_var(
                "PAYROLL_VACATION_PREMIUM_PCT",
                defaults.vacation_premium_pct,
            )?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            escalation,
            payroll,
        })
    }
}

fn parsed_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        _ => Ok(default),
    }
}

fn flag_var(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue { key, value }),
            }
        }
        _ => Ok(default),
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

/// Escalation sweep scheduling and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationConfig {
    pub threshold_hours: u32,
    pub sweep_interval_secs: u64,
    pub blue_gray_skip_general_manager: bool,
}

impl EscalationConfig {
    pub fn policy(&self) -> EscalationPolicy {
        EscalationPolicy {
            threshold: chrono::Duration::hours(i64::from(self.threshold_hours)),
            table: TransitionTable::with_blue_gray_skip_general_manager(
                self.blue_gray_skip_general_manager,
            ),
        }
    }

    pub fn sweep_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{} has an invalid value '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
