use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Weight of the personal score in a standardized vote.
pub const PERSONAL_WEIGHT: f64 = 0.8;
/// Weight of the technical score in a standardized vote.
pub const TECH_WEIGHT: f64 = 0.2;
/// Grant handed out when the reimbursement table has no row for a country.
pub const DEFAULT_REIMBURSEMENT: u32 = 100;
/// Inclusive bounds for reviewer scores.
pub const MIN_VOTE: u8 = 1;
pub const MAX_VOTE: u8 = 10;

/// Mail template identifiers understood by the mail provider.
pub mod templates {
    pub const INVITE: &str = "513b4761-9c40-4f54-9e76-225c2835b529";
    pub const LAST_REMINDER: &str = "4295b92e-b71d-4b6d-89ec-a4c5fe75a5f6";
    pub const CONFIRMATION: &str = "c4d4d758-974f-437b-af9a-d8532f96d670";
    pub const REIMBURSEMENT: &str = "06d613dd-cf70-427b-ae19-6cfe7931c193";
}

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
    pub registration: RegistrationConfig,
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

        let defaults = RegistrationConfig::default();
        let base_url = env::var("APP_BASE_URL").unwrap_or(defaults.base_url);
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl { value: base_url });
        }

        let registration = RegistrationConfig {
            hackathon_name: env::var("HACKATHON_NAME").unwrap_or(defaults.hackathon_name),
            base_url: base_url.trim_end_matches('/').to_string(),
            mailing_list_id: env::var("MAILING_LIST_ID").unwrap_or(defaults.mailing_list_id),
            reimbursement_csv: env::var("REIMBURSEMENT_CSV")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            reimbursement_sender: env::var("REIMBURSEMENT_FROM_EMAIL")
                .unwrap_or(defaults.reimbursement_sender),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            registration,
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

/// Event-specific settings used when building links and mails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationConfig {
    pub hackathon_name: String,
    /// Public origin used for confirmation and cancellation links, without trailing slash.
    pub base_url: String,
    pub mailing_list_id: String,
    pub reimbursement_csv: Option<PathBuf>,
    pub reimbursement_sender: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            hackathon_name: "HackUPC".to_string(),
            base_url: "http://localhost:3000".to_string(),
            mailing_list_id: "general".to_string(),
            reimbursement_csv: None,
            reimbursement_sender: "HackUPC Reimbursements Team <reimbursements@hackupc.com>"
                .to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBaseUrl { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBaseUrl { value } => {
                write!(f, "APP_BASE_URL must be an http(s) origin, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidBaseUrl { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_BASE_URL",
            "HACKATHON_NAME",
            "MAILING_LIST_ID",
            "REIMBURSEMENT_CSV",
            "REIMBURSEMENT_FROM_EMAIL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.registration, RegistrationConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn registration_settings_follow_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("HACKATHON_NAME", "HackBCN");
        env::set_var("APP_BASE_URL", "https://my.hackbcn.org/");
        env::set_var("REIMBURSEMENT_CSV", "/srv/reimbursements.csv");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.registration.hackathon_name, "HackBCN");
        assert_eq!(config.registration.base_url, "https://my.hackbcn.org");
        assert_eq!(
            config.registration.reimbursement_csv,
            Some(PathBuf::from("/srv/reimbursements.csv"))
        );
        reset_env();
    }

    #[test]
    fn rejects_base_url_without_scheme() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_BASE_URL", "my.hackbcn.org");
        let err = AppConfig::load().expect_err("scheme required");
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
        reset_env();
    }
}
