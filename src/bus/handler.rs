//! Event handler contract and its type-erased registry form.

use std::any::{self, Any, TypeId};
use std::error::Error;

use thiserror::Error;

use crate::message::Event;

/// Logic invoked with one delivered event.
///
/// A fresh handler is built for every delivery, either through `Default`
/// (`Bus::subscribe`) or through the factory given to `Bus::subscribe_with`,
/// so implementations carry no state between messages beyond what their
/// factory injects.
///
/// ## Example
///
/// ```
/// use microbus::{Event, EventHandler, HandlerError};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize, Event)]
/// pub struct OrderCreated {
///     pub order_id: String,
/// }
///
/// #[derive(Default)]
/// pub struct SendConfirmation;
///
/// impl EventHandler<OrderCreated> for SendConfirmation {
///     fn handle(&self, event: &OrderCreated) -> Result<(), HandlerError> {
///         if event.order_id.is_empty() {
///             return Err(HandlerError::Rejected("missing order id".into()));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait EventHandler<E: Event>: Send + 'static {
    fn handle(&self, event: &E) -> Result<(), HandlerError>;
}

/// Error returned by an event handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler refused the event (validation, invariant violation).
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("handler error: {0}")]
    Other(#[from] Box<dyn Error + Send + Sync>),
}

/// A decoded event whose concrete type is known only to its descriptor.
pub(crate) type AnyEvent = Box<dyn Any + Send + Sync>;

type DecodeFn = fn(&[u8]) -> Result<AnyEvent, serde_json::Error>;

/// Registry-side description of an event type.
#[derive(Clone, Copy)]
pub(crate) struct EventDescriptor {
    pub name: &'static str,
    pub type_id: TypeId,
    pub type_name: &'static str,
    decode: DecodeFn,
}

impl EventDescriptor {
    pub fn of<E: Event>() -> Self {
        Self {
            name: E::NAME,
            type_id: TypeId::of::<E>(),
            type_name: any::type_name::<E>(),
            decode: decode_as::<E>,
        }
    }

    /// Deserialize a raw payload into this event type.
    pub fn decode(&self, raw: &[u8]) -> Result<AnyEvent, serde_json::Error> {
        (self.decode)(raw)
    }
}

fn decode_as<E: Event>(raw: &[u8]) -> Result<AnyEvent, serde_json::Error> {
    let event: E = serde_json::from_slice(raw)?;
    Ok(Box::new(event))
}

type InvokeFn = dyn Fn(&(dyn Any + Send + Sync)) -> Result<(), HandlerError> + Send + Sync;

/// A subscribed handler type: its identity plus a closure that builds an
/// instance and calls it.
pub(crate) struct HandlerEntry {
    pub type_id: TypeId,
    pub name: &'static str,
    invoke: Box<InvokeFn>,
}

impl HandlerEntry {
    pub fn new<E, H, F>(factory: F) -> Self
    where
        E: Event,
        H: EventHandler<E>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<H>(),
            name: any::type_name::<H>(),
            invoke: Box::new(move |event: &(dyn Any + Send + Sync)| {
                let event = event.downcast_ref::<E>().ok_or_else(|| {
                    HandlerError::Rejected(format!("expected {}", any::type_name::<E>()))
                })?;
                factory().handle(event)
            }),
        }
    }

    /// Build a fresh handler instance and run it against a decoded event.
    pub fn invoke(&self, event: &(dyn Any + Send + Sync)) -> Result<(), HandlerError> {
        (self.invoke)(event)
    }
}
