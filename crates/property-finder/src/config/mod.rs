use secrecy::SecretString;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_ATTOM_BASE_URL: &str = "https://api.gateway.attomdata.com/propertyapi/v1.0.0/";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";

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

/// Top-level configuration for the application, built once at startup and
/// handed to every component that needs it.
#[derive(Debug)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub attom: AttomConfig,
    pub narrative: NarrativeConfig,
    pub http: HttpConfig,
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

        let attom = AttomConfig {
            api_key: required_secret("ATTOM_API_KEY")?,
            base_url: env::var("ATTOM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ATTOM_BASE_URL.to_string()),
            page_size: numeric_var("ATTOM_PAGE_SIZE", 10)?,
        };

        let narrative = NarrativeConfig {
            api_key: required_secret("ANTHROPIC_API_KEY")?,
            base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_MODEL.to_string()),
            max_tokens: numeric_var("ANTHROPIC_MAX_TOKENS", 1000)?,
        };

        let http = HttpConfig {
            timeout: Duration::from_secs(numeric_var("HTTP_TIMEOUT_SECS", 30)?),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            attom,
            narrative,
            http,
        })
    }
}

fn required_secret(name: &'static str) -> Result<SecretString, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value.trim().to_string())),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn numeric_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var: name }),
        Err(_) => Ok(default),
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

/// Credentials and paging for the ATTOM property API.
#[derive(Debug)]
pub struct AttomConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub page_size: u32,
}

/// Credentials and limits for the hosted text-completion API.
#[derive(Debug)]
pub struct NarrativeConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

/// Shared settings for every outbound HTTP call.
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingVar(&'static str),
    InvalidNumber { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingVar(name) => {
                write!(f, "{name} must be set (check your environment or .env file)")
            }
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::MissingVar(_)
            | ConfigError::InvalidNumber { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "ATTOM_API_KEY",
            "ATTOM_BASE_URL",
            "ATTOM_PAGE_SIZE",
            "ANTHROPIC_API_KEY",
            "ANTHROPIC_BASE_URL",
            "ANTHROPIC_MODEL",
            "ANTHROPIC_MAX_TOKENS",
            "HTTP_TIMEOUT_SECS",
        ] {
            env::remove_var(name);
        }
    }

    fn set_keys() {
        env::set_var("ATTOM_API_KEY", "attom-test-key");
        env::set_var("ANTHROPIC_API_KEY", "anthropic-test-key");
    }

    #[test]
    fn load_uses_defaults_when_optional_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_keys();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.attom.page_size, 10);
        assert_eq!(config.attom.base_url, DEFAULT_ATTOM_BASE_URL);
        assert_eq!(config.narrative.max_tokens, 1000);
        assert_eq!(config.narrative.model, DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(config.http.timeout, Duration::from_secs(30));
        assert_eq!(config.attom.api_key.expose_secret(), "attom-test-key");
    }

    #[test]
    fn missing_attom_key_fails_fast() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ANTHROPIC_API_KEY", "anthropic-test-key");
        let err = AppConfig::load().expect_err("attom key required");
        assert!(matches!(err, ConfigError::MissingVar("ATTOM_API_KEY")));
    }

    #[test]
    fn blank_anthropic_key_is_treated_as_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ATTOM_API_KEY", "attom-test-key");
        env::set_var("ANTHROPIC_API_KEY", "   ");
        let err = AppConfig::load().expect_err("anthropic key required");
        assert!(matches!(err, ConfigError::MissingVar("ANTHROPIC_API_KEY")));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_keys();
        env::set_var("HTTP_TIMEOUT_SECS", "soon");
        let err = AppConfig::load().expect_err("timeout must be numeric");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                var: "HTTP_TIMEOUT_SECS"
            }
        ));
    }

    #[test]
    fn debug_output_redacts_api_keys() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_keys();
        let config = AppConfig::load().expect("config loads");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("attom-test-key"));
        assert!(!rendered.contains("anthropic-test-key"));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_keys();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }
}
