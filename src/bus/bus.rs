//! Bus facade: publish events, subscribe handlers, forward commands.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use super::consumer::{self, ConsumerHandle, ConsumerStats};
use super::dispatcher::Dispatcher;
use super::handler::{EventDescriptor, EventHandler, HandlerEntry};
use super::publisher::Publisher;
use super::registry::{Registered, Subscription, TypeRegistry};
use crate::broker::Broker;
use crate::command::{CommandError, Mediator};
use crate::config::BusConfig;
use crate::error::{BusError, Result};
use crate::message::{Command, Event};

/// In-process event/command bus over a message broker.
///
/// Events fan out: `publish` sends to the queue named after the event type,
/// and every handler subscribed to that type runs once per delivery on the
/// event's consumer thread. Commands are point-to-point: `send_command`
/// hands them to the mediator and returns its single response.
///
/// ## Example
///
/// ```ignore
/// let bus = Bus::new(InMemoryBroker::new(), router);
///
/// bus.subscribe::<OrderCreated, SendConfirmation>()?;
/// bus.publish(&OrderCreated { order_id: "A1".into() })?;
///
/// let reserved = bus.send_command(ReserveStock { sku: "X-1".into(), quantity: 2 })?;
///
/// let stats = bus.shutdown();
/// ```
pub struct Bus<B: Broker> {
    broker: Arc<B>,
    mediator: Arc<dyn Mediator>,
    config: BusConfig,
    registry: Arc<TypeRegistry>,
    publisher: Publisher<B>,
    consumers: Mutex<Consumers>,
}

#[derive(Default)]
struct Consumers {
    handles: Vec<ConsumerHandle>,
    shut_down: bool,
}

impl<B: Broker> Bus<B> {
    /// Create a bus with the default configuration.
    pub fn new(broker: B, mediator: impl Mediator + 'static) -> Self {
        Self::with_config(broker, mediator, BusConfig::default())
    }

    pub fn with_config(broker: B, mediator: impl Mediator + 'static, config: BusConfig) -> Self {
        let broker = Arc::new(broker);
        Self {
            publisher: Publisher::new(Arc::clone(&broker), config.queue),
            broker,
            mediator: Arc::new(mediator),
            config,
            registry: Arc::new(TypeRegistry::new()),
            consumers: Mutex::new(Consumers::default()),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Publish an event to the queue named `E::NAME`.
    ///
    /// Succeeds once the broker accepts the message, whether or not anything
    /// is subscribed.
    pub fn publish<E: Event>(&self, event: &E) -> Result<()> {
        self.publisher.publish(event)
    }

    /// Publish events in order, stopping at the first failure.
    pub fn publish_batch<E: Event>(&self, events: &[E]) -> Result<()> {
        self.publisher.publish_batch(events)
    }

    /// Forward a command to the mediator and decode its response.
    pub fn send_command<C: Command>(&self, command: C) -> std::result::Result<C::Response, CommandError> {
        let input =
            serde_json::to_value(&command).map_err(|e| CommandError::EncodeFailed(e.to_string()))?;
        let output = self.mediator.send(C::NAME, input)?;
        serde_json::from_value(output).map_err(|e| CommandError::DecodeFailed(e.to_string()))
    }

    /// Subscribe handler type `H` to events of type `E`, building each
    /// instance with `H::default()`.
    pub fn subscribe<E, H>(&self) -> Result<()>
    where
        E: Event,
        H: EventHandler<E> + Default,
    {
        self.subscribe_with::<E, H, _>(H::default)
    }

    /// Subscribe handler type `H` to events of type `E`, building a fresh
    /// instance with `factory` for every delivery.
    ///
    /// The first subscription for an event type starts its consumer loop.
    /// Subscribing the same handler type twice fails with
    /// `BusError::DuplicateSubscription` and leaves the bus unchanged.
    pub fn subscribe_with<E, H, F>(&self, factory: F) -> Result<()>
    where
        E: Event,
        H: EventHandler<E>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let mut consumers = self
            .consumers
            .lock()
            .map_err(|_| BusError::LockPoisoned("subscribe"))?;
        if consumers.shut_down {
            return Err(BusError::ShutDown);
        }

        let handler = HandlerEntry::new::<E, H, F>(factory);
        let handler_name = handler.name;

        let registered = self.registry.register(EventDescriptor::of::<E>(), handler, || {
            let handle = consumer::spawn(
                Arc::clone(&self.broker),
                E::NAME,
                Dispatcher::new(Arc::clone(&self.registry)),
                self.config.clone(),
            )?;
            consumers.handles.push(handle);
            Ok(())
        })?;

        info!(
            event = E::NAME,
            handler = handler_name,
            first = registered == Registered::FirstForEvent,
            "subscription added"
        );
        Ok(())
    }

    /// Every event type with its subscribed handler names, sorted by event.
    pub fn subscriptions(&self) -> Result<Vec<Subscription>> {
        self.registry.subscriptions()
    }

    pub fn has_subscription<E, H>(&self) -> Result<bool>
    where
        E: Event,
        H: EventHandler<E>,
    {
        self.registry.contains(E::NAME, TypeId::of::<H>())
    }

    /// Stop every consumer loop, wait for each to finish, and return their
    /// stats keyed by event name.
    ///
    /// Later subscriptions fail with `BusError::ShutDown`; publishing and
    /// commands keep working.
    pub fn shutdown(&self) -> BTreeMap<&'static str, ConsumerStats> {
        let handles = match self.consumers.lock() {
            Ok(mut consumers) => {
                consumers.shut_down = true;
                std::mem::take(&mut consumers.handles)
            }
            Err(poisoned) => {
                warn!("consumer list lock poisoned, shutting down anyway");
                let mut consumers = poisoned.into_inner();
                consumers.shut_down = true;
                std::mem::take(&mut consumers.handles)
            }
        };

        for handle in &handles {
            handle.signal_stop();
        }

        let stats = handles
            .into_iter()
            .map(|handle| (handle.queue(), handle.stop()))
            .collect::<BTreeMap<_, _>>();

        info!(consumers = stats.len(), "bus shut down");
        stats
    }
}
