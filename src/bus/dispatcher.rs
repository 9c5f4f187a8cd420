//! Turns a raw delivery into calls on every registered handler.
//!
//! Nothing that goes wrong in here escapes: unknown event names, payloads
//! that do not decode, and handlers that fail or panic are all logged and
//! reported through `DispatchOutcome`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use super::handler::HandlerEntry;
use super::registry::TypeRegistry;
use crate::error::BusError;

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchOutcome {
    /// No event type is registered under the routing key; dropped.
    UnknownEvent,
    /// The payload did not decode into the registered event type; dropped.
    Malformed,
    /// Every registered handler was attempted once.
    Handled { succeeded: usize, failed: usize },
}

#[derive(Clone)]
pub(crate) struct Dispatcher {
    registry: Arc<TypeRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// Decode `raw` as the event registered under `event_name` and run every
    /// handler subscribed to it, each on a freshly built instance.
    pub fn process_message(&self, event_name: &str, raw: &[u8]) -> DispatchOutcome {
        let descriptor = match self.registry.resolve_event_type(event_name) {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => {
                debug!(event = event_name, "no event type registered, dropping message");
                return DispatchOutcome::UnknownEvent;
            }
            Err(error) => {
                warn!(event = event_name, %error, "registry unavailable, dropping message");
                return DispatchOutcome::UnknownEvent;
            }
        };

        let event = match descriptor.decode(raw) {
            Ok(event) => event,
            Err(source) => {
                let error = BusError::MalformedEvent {
                    event: event_name.to_string(),
                    source,
                };
                warn!(event = event_name, %error, "dropping malformed message");
                return DispatchOutcome::Malformed;
            }
        };

        // Snapshot; the lock is released before any handler runs
        let handlers = match self.registry.resolve_handlers(event_name) {
            Ok(handlers) => handlers,
            Err(error) => {
                warn!(event = event_name, %error, "registry unavailable, dropping message");
                return DispatchOutcome::UnknownEvent;
            }
        };

        let mut succeeded = 0;
        let mut failed = 0;

        for handler in &handlers {
            match invoke_isolated(handler, event.as_ref()) {
                Ok(()) => succeeded += 1,
                Err(reason) => {
                    failed += 1;
                    let error = BusError::HandlerFailure {
                        event: event_name.to_string(),
                        handler: handler.name,
                        reason,
                    };
                    warn!(event = event_name, handler = handler.name, %error, "handler failed");
                }
            }
        }

        debug!(event = event_name, succeeded, failed, "message dispatched");
        DispatchOutcome::Handled { succeeded, failed }
    }
}

/// Run one handler, turning both errors and panics into a failure reason.
fn invoke_isolated(handler: &HandlerEntry, event: &(dyn Any + Send + Sync)) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(event))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(error.to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
