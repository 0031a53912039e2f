use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(agenda::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(agenda::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(agenda::auth))]
    Auth(#[from] AuthError),

    #[error(transparent)]
    #[diagnostic(code(agenda::google_calendar))]
    CalendarApi(#[from] CalendarApiError),

    #[error("OAuth2 login error: {0}")]
    #[diagnostic(code(agenda::oauth))]
    OAuth(String),

    #[error(transparent)]
    #[diagnostic(code(agenda::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(agenda::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(agenda::other))]
    Other(String),
}

/// Failures while turning a session into an access token
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no authenticated principal in the session")]
    NotAuthenticated,

    #[error("no authorized client on file for registration '{registration_id}' and principal '{principal}'")]
    NoAuthorizedClient {
        registration_id: String,
        principal: String,
    },
}

/// Failures reported by the Google Calendar API or on the way to it
#[derive(Debug, Error)]
pub enum CalendarApiError {
    #[error("request to Google Calendar failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Google Calendar returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected Google Calendar response: {0}")]
    InvalidResponse(String),
}

impl CalendarApiError {
    /// HTTP status reported by Google, if the call got that far
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            CalendarApiError::Status { status, .. } => Some(*status),
            CalendarApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            CalendarApiError::InvalidResponse(_) => None,
        }
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AgendaResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create OAuth2 login errors
pub fn oauth_error(message: &str) -> Error {
    Error::OAuth(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
