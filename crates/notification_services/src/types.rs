use serde::{Deserialize, Serialize};

/// Errors raised while publishing notifications.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The broker could not be reached.
    #[error("Message broker connection error: {0}")]
    Connection(String),

    /// The broker refused or failed to accept a message.
    #[error("Failed to publish message: {0}")]
    Publish(String),

    /// The event could not be encoded.
    #[error("Failed to encode event: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Kind of email the mailer should send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailEventType {
    /// A user asked for a password reset token.
    UserPasswordResetRequested,
    /// A user finished a password reset.
    UserPasswordResetCompleted,
}

/// Message published for the mailer, one per email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailEvent {
    /// Kind of email
    #[serde(rename = "type")]
    pub event_type: EmailEventType,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Message body
    pub message: String,
}
