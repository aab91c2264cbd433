use std::sync::Arc;

use crate::publisher::EmailPublisher;
use crate::types::{EmailEvent, EmailEventType, NotificationError};

/// Notification service for announcing account events by email.
#[derive(Clone)]
pub struct NotificationService {
    publisher: Arc<dyn EmailPublisher>,
}

impl NotificationService {
    /// Creates a new notification service on top of a publisher.
    pub fn new(publisher: Arc<dyn EmailPublisher>) -> Self {
        Self { publisher }
    }

    /// Sends the reset token to the account owner.
    pub async fn send_password_reset_requested(
        &self,
        to: &str,
        reset_token: &str,
    ) -> Result<(), NotificationError> {
        self.publish(EmailEvent {
            event_type: EmailEventType::UserPasswordResetRequested,
            to: to.to_string(),
            subject: "Reset your Retail Tractors password".to_string(),
            message: format!("Your reset token is: {}", reset_token),
        })
        .await
    }

    /// Confirms a completed reset to the account owner.
    pub async fn send_password_reset_completed(&self, to: &str) -> Result<(), NotificationError> {
        self.publish(EmailEvent {
            event_type: EmailEventType::UserPasswordResetCompleted,
            to: to.to_string(),
            subject: "Your Retail Tractors password has been reset".to_string(),
            message: "Your password has been successfully reset.".to_string(),
        })
        .await
    }

    /// Publishes an arbitrary email event.
    pub async fn publish(&self, event: EmailEvent) -> Result<(), NotificationError> {
        match self.publisher.publish(&event).await {
            Ok(()) => {
                log::info!("Email event published: {:?} to {}", event.event_type, event.to);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to publish email event to {}: {}", event.to, e);
                Err(e)
            }
        }
    }
}
