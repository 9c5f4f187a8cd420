use thiserror::Error;

use crate::broker::TransportError;

/// Errors raised by the bus.
///
/// `MalformedEvent`, `HandlerFailure` and `Transport` describe failures on
/// the consume path. They are logged and counted by the consumer loop and
/// never returned to a caller.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("handler {handler} is already subscribed to {event}")]
    DuplicateSubscription {
        event: &'static str,
        handler: &'static str,
    },

    #[error("event name {name} is already bound to {existing}, cannot bind {requested}")]
    EventNameCollision {
        name: &'static str,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("failed to encode {event}: {source}")]
    Encode {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to publish {event}: {source}")]
    PublishFailed {
        event: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("malformed {event} payload: {source}")]
    MalformedEvent {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("handler {handler} failed on {event}: {reason}")]
    HandlerFailure {
        event: String,
        handler: &'static str,
        reason: String,
    },

    #[error("transport error on queue {queue}: {source}")]
    Transport {
        queue: String,
        #[source]
        source: TransportError,
    },

    #[error("failed to start consumer loop for {queue}: {source}")]
    ConsumerStart {
        queue: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("bus is shut down")]
    ShutDown,

    #[error("bus lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

pub type Result<T> = std::result::Result<T, BusError>;
