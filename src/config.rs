use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub session_expiration_days: i64,
    pub provider_url: String,
    /// Upper bound on a single question provider call
    pub provider_timeout: Duration,
    /// Buffer size of each room/match broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            jwt_secret: "your-secret-key-change-in-production".to_string(),
            session_expiration_days: 30,
            provider_url: "https://opentdb.com/api.php".to_string(),
            provider_timeout: Duration::from_secs(10),
            event_channel_capacity: 100,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            session_expiration_days: env_or(
                "SESSION_EXPIRATION_DAYS",
                defaults.session_expiration_days,
            ),
            provider_url: std::env::var("TRIVIA_PROVIDER_URL").unwrap_or(defaults.provider_url),
            provider_timeout: Duration::from_secs(env_or(
                "TRIVIA_PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout.as_secs(),
            )),
            event_channel_capacity: env_or(
                "EVENT_CHANNEL_CAPACITY",
                defaults.event_channel_capacity,
            ),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key = %key, value = %raw, "Ignoring unparsable config value");
                default
            }
        },
        Err(_) => default,
    }
}
