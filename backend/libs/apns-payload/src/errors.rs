use thiserror::Error;

/// Payload construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("alert must be a string, an alert object or null, not a '{found}'")]
    UnsupportedAlert { found: &'static str },

    #[error("Invalid alert object: {0}")]
    InvalidAlert(String),
}

/// Notification envelope errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Invalid value for header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Unknown APNs priority: {0}")]
    UnknownPriority(String),

    #[error("Unknown APNs push type: {0}")]
    UnknownPushType(String),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read APNs configuration from environment: {0}")]
    Env(#[from] envy::Error),
}

impl From<PayloadError> for String {
    fn from(err: PayloadError) -> Self {
        err.to_string()
    }
}

impl From<NotificationError> for String {
    fn from(err: NotificationError) -> Self {
        err.to_string()
    }
}
