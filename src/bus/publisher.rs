//! Event publisher: serialize, declare the event queue, send.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::broker::{Broker, Channel, QueueOptions, TransportError};
use crate::error::{BusError, Result};
use crate::message::Event;

/// Publishes events to the queue named after their type.
///
/// Holds one lazily opened channel, reused across calls and discarded after
/// any transport failure so the next publish reconnects. Publishing is
/// fire-and-forget: nothing waits for a broker acknowledgement, and a
/// failure is returned as-is without retrying.
pub(crate) struct Publisher<B: Broker> {
    broker: Arc<B>,
    channel: Mutex<Option<B::Channel>>,
    options: QueueOptions,
}

impl<B: Broker> Publisher<B> {
    pub fn new(broker: Arc<B>, options: QueueOptions) -> Self {
        Self {
            broker,
            channel: Mutex::new(None),
            options,
        }
    }

    /// Publish a single event.
    pub fn publish<E: Event>(&self, event: &E) -> Result<()> {
        let payload = serde_json::to_vec(event).map_err(|source| BusError::Encode {
            event: E::NAME,
            source,
        })?;

        let mut slot = self
            .channel
            .lock()
            .map_err(|_| BusError::LockPoisoned("publish"))?;

        if let Err(source) = self.send(&mut slot, E::NAME, &payload) {
            *slot = None;
            warn!(event = E::NAME, error = %source, "publish failed");
            return Err(BusError::PublishFailed {
                event: E::NAME,
                source,
            });
        }

        debug!(event = E::NAME, bytes = payload.len(), "event published");
        Ok(())
    }

    /// Publish events in order, stopping at the first failure.
    pub fn publish_batch<E: Event>(&self, events: &[E]) -> Result<()> {
        for event in events {
            self.publish(event)?;
        }
        Ok(())
    }

    fn send(
        &self,
        slot: &mut Option<B::Channel>,
        queue: &str,
        payload: &[u8],
    ) -> std::result::Result<(), TransportError> {
        let channel = match slot.take() {
            Some(channel) => channel,
            None => self.broker.open_channel()?,
        };
        let channel = slot.insert(channel);

        channel.declare_queue(queue, self.options)?;
        channel.publish(queue, payload)
    }
}
