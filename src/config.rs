use crate::error::{config_error, env_error, AgendaResult, Error};
use chrono::DateTime;
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Name the service identifies itself with towards Google
pub const DEFAULT_APPLICATION_NAME: &str = "HealthMoney";
/// The signed-in user's default calendar
pub const PRIMARY_CALENDAR: &str = "primary";
/// Timezone label attached to every event
pub const DEFAULT_EVENT_TIMEZONE: &str = "America/Sao_Paulo";
/// Offset literal appended to every event timestamp
pub const DEFAULT_EVENT_UTC_OFFSET: &str = "-03:00";
pub const DEFAULT_OAUTH_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_OAUTH_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
pub const DEFAULT_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOCALE: &str = "pt-BR";
/// Where the security overrides are read from
pub const SECURITY_CONFIG_PATH: &str = "config/security.toml";

/// How gateway outcomes are mapped onto HTTP status codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    /// 401 for authentication problems, 502 or the upstream 4xx for calendar failures
    #[default]
    Mapped,
    /// Every outcome is answered with 200 and a descriptive body
    Legacy,
}

/// Security settings handed to the router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Require the session's CSRF token on state-changing agenda requests
    pub csrf_enabled: bool,
    /// Where a successful login lands
    pub default_success_url: String,
    /// Ignore any requested return path after login
    pub always_use_default_success_url: bool,
    /// Answer delete requests without a session with the not-logged-in message
    pub require_login_for_delete: bool,
    pub status_policy: StatusPolicy,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            csrf_enabled: false,
            default_success_url: "/loginGoogle".to_string(),
            always_use_default_success_url: true,
            require_login_for_delete: false,
            status_policy: StatusPolicy::Mapped,
        }
    }
}

impl SecurityConfig {
    /// Load overrides from a TOML file, keeping the defaults when it is absent
    pub fn load_from(path: impl AsRef<Path>) -> AgendaResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => {
                let security = Self::from_toml(&content)?;
                info!("Loaded security overrides from {}", path.display());
                Ok(security)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No security overrides at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => {
                error!("Failed to read security overrides from {}: {}", path.display(), e);
                Err(Error::from(e))
            }
        }
    }

    /// Parse overrides from TOML text; missing keys keep their defaults
    pub fn from_toml(content: &str) -> AgendaResult<Self> {
        let security: SecurityConfig = toml::from_str(content)?;
        if !security.default_success_url.starts_with('/') {
            return Err(config_error("default_success_url must be an absolute path"));
        }
        Ok(security)
    }
}

/// Main configuration structure for the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google OAuth2 client ID
    pub google_client_id: String,
    /// Google OAuth2 client secret
    pub google_client_secret: String,
    /// Callback registered with Google for the authorization-code flow
    pub oauth_redirect_uri: String,
    /// Google's consent page
    pub oauth_auth_url: String,
    /// Endpoint exchanging authorization codes for tokens
    pub oauth_token_url: String,
    /// Endpoint naming the user behind an access token
    pub oauth_userinfo_url: String,
    pub bind_addr: String,
    pub port: u16,
    /// Base URL of the Google Calendar v3 API
    pub calendar_api_base: String,
    pub application_name: String,
    pub calendar_id: String,
    pub event_timezone: String,
    pub event_utc_offset: String,
    pub http_timeout_secs: u64,
    /// Locale of the response texts
    pub locale: String,
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AgendaResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Self::from_lookup(|key| env::var(key).ok())?;
        config.security = SecurityConfig::load_from(SECURITY_CONFIG_PATH)?;
        Ok(config)
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> AgendaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Required variables
        let google_client_id = lookup("GOOGLE_CLIENT_ID").ok_or_else(|| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            lookup("GOOGLE_CLIENT_SECRET").ok_or_else(|| env_error("GOOGLE_CLIENT_SECRET"))?;

        let port = match lookup("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| config_error("Invalid PORT format"))?,
            None => DEFAULT_PORT,
        };

        let http_timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse::<u64>()
                .map_err(|_| config_error("Invalid HTTP_TIMEOUT_SECS format"))?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let oauth_redirect_uri = lookup("OAUTH_REDIRECT_URI")
            .unwrap_or_else(|| format!("http://localhost:{}/login/oauth2/code/google", port));

        let config = Config {
            google_client_id,
            google_client_secret,
            oauth_redirect_uri,
            oauth_auth_url: lookup("GOOGLE_OAUTH_AUTH_URL")
                .unwrap_or_else(|| DEFAULT_OAUTH_AUTH_URL.to_string()),
            oauth_token_url: lookup("GOOGLE_OAUTH_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_OAUTH_TOKEN_URL.to_string()),
            oauth_userinfo_url: lookup("GOOGLE_USERINFO_URL")
                .unwrap_or_else(|| DEFAULT_OAUTH_USERINFO_URL.to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
            calendar_api_base: lookup("GOOGLE_CALENDAR_API_BASE")
                .unwrap_or_else(|| DEFAULT_CALENDAR_API_BASE.to_string()),
            application_name: lookup("APPLICATION_NAME")
                .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string()),
            calendar_id: lookup("CALENDAR_ID").unwrap_or_else(|| PRIMARY_CALENDAR.to_string()),
            event_timezone: lookup("EVENT_TIMEZONE")
                .unwrap_or_else(|| DEFAULT_EVENT_TIMEZONE.to_string()),
            event_utc_offset: lookup("EVENT_UTC_OFFSET")
                .unwrap_or_else(|| DEFAULT_EVENT_UTC_OFFSET.to_string()),
            http_timeout_secs,
            locale: lookup("APP_LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            security: SecurityConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject timezone labels and offsets Google would not understand
    fn validate(&self) -> AgendaResult<()> {
        if self.event_timezone.parse::<Tz>().is_err() {
            return Err(config_error(&format!(
                "Unknown EVENT_TIMEZONE '{}'",
                self.event_timezone
            )));
        }

        let sample = format!("2000-01-01T00:00:00{}", self.event_utc_offset);
        if DateTime::parse_from_rfc3339(&sample).is_err() {
            return Err(config_error(&format!(
                "Invalid EVENT_UTC_OFFSET '{}', expected something like -03:00",
                self.event_utc_offset
            )));
        }

        if self.event_timezone != DEFAULT_EVENT_TIMEZONE
            && self.event_utc_offset == DEFAULT_EVENT_UTC_OFFSET
        {
            warn!(
                "EVENT_TIMEZONE is {} but EVENT_UTC_OFFSET is still the default {}",
                self.event_timezone, self.event_utc_offset
            );
        }

        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn socket_addr(&self) -> AgendaResult<SocketAddr> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse::<SocketAddr>()
            .map_err(|e| config_error(&format!("Invalid bind address: {}", e)))
    }
}
