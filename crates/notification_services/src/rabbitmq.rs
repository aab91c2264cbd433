//! RabbitMQ publisher for email events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tokio::sync::Mutex;

use crate::publisher::EmailPublisher;
use crate::types::{EmailEvent, NotificationError};

/// Topic exchange the mailer consumes from.
pub const EMAIL_EXCHANGE: &str = "email.events";
/// Routing key of outgoing email events.
pub const EMAIL_ROUTING_KEY: &str = "email.send";
/// Pause between connection attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);
/// Connection attempts before a publish fails.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 12;

const PERSISTENT_DELIVERY: u8 = 2;

struct Link {
    // Held so the connection outlives the channel.
    _connection: Connection,
    channel: Channel,
}

/// Publishes email events to a durable topic exchange on a confirm channel.
///
/// The connection is opened on first use and reopened after it drops. Only one
/// caller runs the retry loop at a time; publishes arriving meanwhile fail
/// straight away with [`NotificationError::Connection`].
pub struct RabbitMqPublisher {
    url: String,
    connect_attempts: u32,
    retry_interval: Duration,
    link: Mutex<Option<Link>>,
    connecting: AtomicBool,
}

/// Clears the connecting flag when the connect attempt ends or is dropped.
struct ConnectingGuard<'a>(&'a AtomicBool);

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RabbitMqPublisher {
    /// Creates a publisher for the broker at `url` without connecting yet.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            link: Mutex::new(None),
            connecting: AtomicBool::new(false),
        }
    }

    /// Overrides how many times and how often a connection is attempted.
    pub fn with_retry(mut self, attempts: u32, interval: Duration) -> Self {
        self.connect_attempts = attempts.max(1);
        self.retry_interval = interval;
        self
    }

    /// Connects eagerly so that startup logs show the broker state.
    pub async fn connect(&self) -> Result<(), NotificationError> {
        self.channel().await.map(|_| ())
    }

    async fn channel(&self) -> Result<Channel, NotificationError> {
        if let Some(existing) = self.link.lock().await.as_ref() {
            if existing.channel.status().connected() {
                return Ok(existing.channel.clone());
            }
            log::warn!("RabbitMQ channel closed, reconnecting");
        }

        if self.connecting.swap(true, Ordering::AcqRel) {
            return Err(NotificationError::Connection(
                "connection to the broker is being established".to_string(),
            ));
        }
        let _guard = ConnectingGuard(&self.connecting);

        // Another caller may have finished connecting since the first check.
        if let Some(existing) = self.link.lock().await.as_ref() {
            if existing.channel.status().connected() {
                return Ok(existing.channel.clone());
            }
        }

        let fresh = self.connect_with_retry().await?;
        let channel = fresh.channel.clone();
        *self.link.lock().await = Some(fresh);
        Ok(channel)
    }

    async fn connect_with_retry(&self) -> Result<Link, NotificationError> {
        let mut attempt = 1;
        loop {
            match self.open_link().await {
                Ok(link) => {
                    log::info!("RabbitMQ publisher connected");
                    return Ok(link);
                }
                Err(e) if attempt < self.connect_attempts => {
                    log::warn!(
                        "RabbitMQ not ready ({}), retrying in {:?} [{}/{}]",
                        e,
                        self.retry_interval,
                        attempt,
                        self.connect_attempts
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry_interval).await;
                }
                Err(e) => {
                    log::error!("Giving up on RabbitMQ after {} attempts: {}", attempt, e);
                    return Err(NotificationError::Connection(e.to_string()));
                }
            }
        }
    }

    async fn open_link(&self) -> Result<Link, lapin::Error> {
        let connection = Connection::connect(&self.url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;
        channel
            .exchange_declare(
                EMAIL_EXCHANGE,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;

        Ok(Link {
            _connection: connection,
            channel,
        })
    }
}

#[async_trait]
impl EmailPublisher for RabbitMqPublisher {
    async fn publish(&self, event: &EmailEvent) -> Result<(), NotificationError> {
        let payload = serde_json::to_vec(event)?;
        let channel = self.channel().await?;

        let confirmation = channel
            .basic_publish(
                EMAIL_EXCHANGE,
                EMAIL_ROUTING_KEY,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_delivery_mode(PERSISTENT_DELIVERY),
            )
            .await
            .map_err(|e| NotificationError::Publish(e.to_string()))?
            .await
            .map_err(|e| NotificationError::Publish(e.to_string()))?;

        if confirmation.is_nack() {
            log::error!("Broker rejected {:?} event for {}", event.event_type, event.to);
            return Err(NotificationError::Publish(
                "message was not acknowledged by the broker".to_string(),
            ));
        }

        Ok(())
    }
}
