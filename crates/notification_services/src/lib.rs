//! # Notification Services
//!
//! This crate announces account events to the mailer.
//! Email events are published as JSON to a RabbitMQ topic exchange; a separate
//! consumer turns them into actual emails.

/// Publisher trait and the in-memory publisher.
pub mod publisher;
/// RabbitMQ implementation of the publisher.
pub mod rabbitmq;
/// Service building and sending the account emails.
pub mod service;
/// Types and structures used in notification services.
pub mod types;

pub use publisher::{EmailPublisher, RecordingPublisher};
pub use rabbitmq::RabbitMqPublisher;
pub use service::NotificationService;
pub use types::{EmailEvent, EmailEventType, NotificationError};
