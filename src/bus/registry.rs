//! Type registry: event name → event descriptor + subscribed handlers.
//!
//! Shared between the subscription path (writes) and every consumer loop
//! (reads), so all access goes through one `RwLock`.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::handler::{EventDescriptor, HandlerEntry};
use crate::error::{BusError, Result};

/// A snapshot of one event type's subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Event name (and queue name).
    pub event: &'static str,
    /// Handler type names, in registration order.
    pub handlers: Vec<&'static str>,
}

struct Entry {
    descriptor: EventDescriptor,
    handlers: Vec<Arc<HandlerEntry>>,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Registered {
    /// The event type had no handlers before this one.
    FirstForEvent,
    /// The handler joined an already-known event type.
    Added,
}

#[derive(Default)]
pub(crate) struct TypeRegistry {
    entries: RwLock<HashMap<&'static str, Entry>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, HashMap<&'static str, Entry>>> {
        self.entries
            .read()
            .map_err(|_| BusError::LockPoisoned(operation))
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, HashMap<&'static str, Entry>>> {
        self.entries
            .write()
            .map_err(|_| BusError::LockPoisoned(operation))
    }

    /// Record `handler` as a consumer of the described event type.
    ///
    /// `on_first` runs under the registry write lock when the event type is
    /// new, before anything is recorded; if it fails, the registry is left
    /// untouched and its error is returned. Duplicate handlers and name
    /// collisions fail the same way.
    pub fn register<F>(&self, descriptor: EventDescriptor, handler: HandlerEntry, on_first: F) -> Result<Registered>
    where
        F: FnOnce() -> Result<()>,
    {
        let mut entries = self.write("subscribe")?;

        match entries.get_mut(descriptor.name) {
            Some(entry) => {
                if entry.descriptor.type_id != descriptor.type_id {
                    return Err(BusError::EventNameCollision {
                        name: descriptor.name,
                        existing: entry.descriptor.type_name,
                        requested: descriptor.type_name,
                    });
                }
                if entry.handlers.iter().any(|h| h.type_id == handler.type_id) {
                    return Err(BusError::DuplicateSubscription {
                        event: descriptor.name,
                        handler: handler.name,
                    });
                }
                entry.handlers.push(Arc::new(handler));
                Ok(Registered::Added)
            }
            None => {
                on_first()?;
                entries.insert(
                    descriptor.name,
                    Entry {
                        descriptor,
                        handlers: vec![Arc::new(handler)],
                    },
                );
                Ok(Registered::FirstForEvent)
            }
        }
    }

    /// Descriptor for an event name, if any handler was ever registered.
    pub fn resolve_event_type(&self, name: &str) -> Result<Option<EventDescriptor>> {
        Ok(self.read("resolve event type")?.get(name).map(|e| e.descriptor))
    }

    /// Handlers currently registered for an event name (possibly empty).
    pub fn resolve_handlers(&self, name: &str) -> Result<Vec<Arc<HandlerEntry>>> {
        Ok(self
            .read("resolve handlers")?
            .get(name)
            .map(|e| e.handlers.clone())
            .unwrap_or_default())
    }

    pub fn contains(&self, name: &str, handler: TypeId) -> Result<bool> {
        Ok(self
            .read("has subscription")?
            .get(name)
            .is_some_and(|e| e.handlers.iter().any(|h| h.type_id == handler)))
    }

    /// All subscriptions, sorted by event name.
    pub fn subscriptions(&self) -> Result<Vec<Subscription>> {
        let mut subscriptions: Vec<Subscription> = self
            .read("list subscriptions")?
            .values()
            .map(|e| Subscription {
                event: e.descriptor.name,
                handlers: e.handlers.iter().map(|h| h.name).collect(),
            })
            .collect();
        subscriptions.sort_by_key(|s| s.event);
        Ok(subscriptions)
    }
}
