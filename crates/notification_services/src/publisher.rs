use std::sync::Mutex;

use async_trait::async_trait;

use crate::types::{EmailEvent, NotificationError};

/// Destination for email events.
#[async_trait]
pub trait EmailPublisher: Send + Sync {
    /// Publishes one event; returns once the destination has accepted it.
    async fn publish(&self, event: &EmailEvent) -> Result<(), NotificationError>;
}

/// Keeps published events in memory, for tests and local runs without a broker.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<EmailEvent>>,
    fail: bool,
}

impl RecordingPublisher {
    /// Creates a publisher that accepts every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a publisher that rejects every event.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Events accepted so far, oldest first.
    pub fn events(&self) -> Vec<EmailEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailPublisher for RecordingPublisher {
    async fn publish(&self, event: &EmailEvent) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Publish("publisher unavailable".to_string()));
        }

        log::debug!("Recorded {:?} event for {}", event.event_type, event.to);
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
