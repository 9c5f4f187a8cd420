//! Broker transport abstractions.
//!
//! The bus treats the message broker as an opaque collaborator reached
//! through two traits:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ Broker                                                    │
//! │  open_channel() -> Channel                                │
//! └───────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │ Channel (owned by exactly one publisher or consumer loop) │
//! │  declare_queue(name, options)                             │
//! │  publish(queue, payload)                                  │
//! │  consume(queue, timeout) -> Option<Delivery>              │
//! └───────────────────────────────────────────────────────────┘
//!          │                                    │
//!          ▼                                    ▼
//! ┌─────────────────┐              ┌──────────────────────────┐
//! │ InMemoryBroker  │              │ AMQP / NATS / ... client │
//! │ (included)      │              │ (external)               │
//! └─────────────────┘              └──────────────────────────┘
//! ```
//!
//! Messages travel on the default exchange: the routing key is the queue
//! name, and deliveries are acknowledged automatically.

mod in_memory;

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub use in_memory::{InMemoryBroker, InMemoryChannel};

/// Queue declaration flags.
///
/// The default is non-durable, non-exclusive and non-auto-delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueueOptions {
    pub durable: bool,
    pub exclusive: bool,
    pub auto_delete: bool,
}

/// A message handed out by `Channel::consume`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Routing key the message was published with (the queue name).
    pub routing_key: String,
    /// Raw payload bytes.
    pub body: Vec<u8>,
}

impl Delivery {
    pub fn new(routing_key: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            routing_key: routing_key.into(),
            body,
        }
    }

    /// Get the body as a string (if valid UTF-8).
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// Errors reported by a broker transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("queue not found: {0}")]
    QueueNotFound(String),

    #[error("channel closed")]
    ChannelClosed,

    #[error("malformed delivery: {0}")]
    MalformedDelivery(String),

    #[error("transport error: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Whether the channel that produced this error is unusable and must be
    /// reopened.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionLost(_)
                | TransportError::ChannelClosed
                | TransportError::QueueNotFound(_)
        )
    }
}

/// A connection factory for one broker endpoint.
///
/// Each publisher and each consumer loop opens its own channel; channels are
/// never shared between them.
pub trait Broker: Send + Sync + 'static {
    type Channel: Channel;

    /// Open a fresh channel to the broker.
    fn open_channel(&self) -> Result<Self::Channel, TransportError>;
}

/// A single broker channel.
pub trait Channel: Send + 'static {
    /// Declare a queue. Declaring an existing queue is a no-op.
    fn declare_queue(&mut self, queue: &str, options: QueueOptions) -> Result<(), TransportError>;

    /// Publish a payload to a queue through the default exchange.
    ///
    /// No broker acknowledgement is awaited.
    fn publish(&mut self, queue: &str, payload: &[u8]) -> Result<(), TransportError>;

    /// Wait for the next delivery on a queue, blocking until one arrives or
    /// the timeout expires. Deliveries are auto-acknowledged.
    fn consume(&mut self, queue: &str, timeout: Duration) -> Result<Option<Delivery>, TransportError>;
}
