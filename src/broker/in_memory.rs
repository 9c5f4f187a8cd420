//! In-memory broker for testing and single-process scenarios.
//!
//! This module provides a thread-safe in-memory broker that implements the
//! `Broker` and `Channel` traits, useful for:
//! - Unit and integration testing without a running broker
//! - Single-process applications
//! - Exercising failure paths (dropped connections, failed publishes,
//!   malformed payloads) deterministically

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::trace;

use super::{Broker, Channel, Delivery, QueueOptions, TransportError};

/// In-memory broker.
///
/// Features:
/// - Thread-safe (can be shared across threads via `Clone`)
/// - Named queues with competing consumers: each message goes to one consumer
/// - Blocking `consume` that parks on a condition variable until a message
///   arrives, the timeout expires, or the broker drops its connections
/// - Fault injection: `disconnect`/`reconnect`, `fail_next_publishes`, `inject`
///
/// ## Example
///
/// ```
/// use std::time::Duration;
/// use microbus::broker::{Broker, Channel, InMemoryBroker, QueueOptions};
///
/// let broker = InMemoryBroker::new();
/// let mut channel = broker.open_channel().unwrap();
///
/// channel.declare_queue("OrderCreated", QueueOptions::default()).unwrap();
/// channel.publish("OrderCreated", br#"{"order_id":"A1"}"#).unwrap();
///
/// let delivery = channel
///     .consume("OrderCreated", Duration::from_millis(10))
///     .unwrap()
///     .unwrap();
/// assert_eq!(delivery.routing_key, "OrderCreated");
/// assert_eq!(delivery.body_str(), Some(r#"{"order_id":"A1"}"#));
/// ```
#[derive(Clone)]
pub struct InMemoryBroker {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<State>,
    /// Signalled on every publish and on disconnect.
    changed: Condvar,
}

struct State {
    queues: HashMap<String, QueueState>,
    connected: bool,
    /// Bumped on every disconnect; channels opened under an older
    /// generation are dead.
    generation: u64,
    failing_publishes: usize,
    channels_opened: usize,
}

struct QueueState {
    options: QueueOptions,
    messages: VecDeque<Vec<u8>>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    /// Create a new, connected in-memory broker with no queues.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    queues: HashMap::new(),
                    connected: true,
                    generation: 0,
                    failing_publishes: 0,
                    channels_opened: 0,
                }),
                changed: Condvar::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, TransportError> {
        self.shared
            .state
            .lock()
            .map_err(|_| TransportError::ConnectionLost("in-memory broker state poisoned".into()))
    }

    /// Drop every open channel and refuse new ones until `reconnect`.
    ///
    /// Consumers blocked in `consume` wake up with `ConnectionLost`.
    /// Queued messages survive.
    pub fn disconnect(&self) {
        if let Ok(mut state) = self.lock() {
            state.connected = false;
            state.generation += 1;
        }
        self.shared.changed.notify_all();
    }

    /// Accept new channels again after `disconnect`.
    pub fn reconnect(&self) {
        if let Ok(mut state) = self.lock() {
            state.connected = true;
        }
    }

    /// Whether the broker currently accepts channels.
    pub fn is_connected(&self) -> bool {
        self.lock().map(|state| state.connected).unwrap_or(false)
    }

    /// Make the next `count` publish calls fail with `ConnectionLost`.
    pub fn fail_next_publishes(&self, count: usize) {
        if let Ok(mut state) = self.lock() {
            state.failing_publishes = count;
        }
    }

    /// Push a raw payload straight onto a queue, declaring it if needed.
    ///
    /// Bypasses serialization, so tests can hand malformed bodies to a
    /// consumer.
    pub fn inject(&self, queue: &str, payload: impl Into<Vec<u8>>) {
        if let Ok(mut state) = self.lock() {
            state
                .queues
                .entry(queue.to_string())
                .or_insert_with(|| QueueState::new(QueueOptions::default()))
                .messages
                .push_back(payload.into());
        }
        self.shared.changed.notify_all();
    }

    /// Number of messages waiting on a queue (0 for unknown queues).
    pub fn depth(&self, queue: &str) -> usize {
        self.lock()
            .ok()
            .and_then(|state| state.queues.get(queue).map(|q| q.messages.len()))
            .unwrap_or(0)
    }

    /// Copies of the messages waiting on a queue, oldest first.
    pub fn messages(&self, queue: &str) -> Vec<Vec<u8>> {
        self.lock()
            .ok()
            .and_then(|state| {
                state
                    .queues
                    .get(queue)
                    .map(|q| q.messages.iter().cloned().collect())
            })
            .unwrap_or_default()
    }

    /// Names of all declared queues, sorted.
    pub fn queue_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock()
            .map(|state| state.queues.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Options a queue was first declared with.
    pub fn queue_options(&self, queue: &str) -> Option<QueueOptions> {
        self.lock()
            .ok()
            .and_then(|state| state.queues.get(queue).map(|q| q.options))
    }

    /// Total number of channels opened so far.
    pub fn channels_opened(&self) -> usize {
        self.lock().map(|state| state.channels_opened).unwrap_or(0)
    }

    /// Drop all queues and messages (useful for test cleanup).
    pub fn clear(&self) {
        if let Ok(mut state) = self.lock() {
            state.queues.clear();
        }
    }
}

impl QueueState {
    fn new(options: QueueOptions) -> Self {
        Self {
            options,
            messages: VecDeque::new(),
        }
    }
}

impl Broker for InMemoryBroker {
    type Channel = InMemoryChannel;

    fn open_channel(&self) -> Result<InMemoryChannel, TransportError> {
        let mut state = self.lock()?;
        if !state.connected {
            return Err(TransportError::ConnectionLost("broker unavailable".into()));
        }
        state.channels_opened += 1;

        Ok(InMemoryChannel {
            broker: self.clone(),
            generation: state.generation,
        })
    }
}

/// A channel on an `InMemoryBroker`.
///
/// Becomes unusable once the broker disconnects; open a new one afterwards.
pub struct InMemoryChannel {
    broker: InMemoryBroker,
    generation: u64,
}

impl InMemoryChannel {
    fn live_state(&self) -> Result<MutexGuard<'_, State>, TransportError> {
        let state = self.broker.lock()?;
        self.check_live(&state)?;
        Ok(state)
    }

    fn check_live(&self, state: &State) -> Result<(), TransportError> {
        if state.generation != self.generation {
            return Err(TransportError::ConnectionLost("channel dropped by broker".into()));
        }
        Ok(())
    }
}

impl Channel for InMemoryChannel {
    fn declare_queue(&mut self, queue: &str, options: QueueOptions) -> Result<(), TransportError> {
        let mut state = self.live_state()?;
        state
            .queues
            .entry(queue.to_string())
            .or_insert_with(|| QueueState::new(options));
        Ok(())
    }

    fn publish(&mut self, queue: &str, payload: &[u8]) -> Result<(), TransportError> {
        let mut state = self.live_state()?;

        if state.failing_publishes > 0 {
            state.failing_publishes -= 1;
            return Err(TransportError::ConnectionLost("publish rejected".into()));
        }

        match state.queues.get_mut(queue) {
            Some(q) => q.messages.push_back(payload.to_vec()),
            // Default exchange drops messages for queues nobody declared
            None => trace!(queue, "dropping message for undeclared queue"),
        }
        drop(state);

        self.broker.shared.changed.notify_all();
        Ok(())
    }

    fn consume(&mut self, queue: &str, timeout: Duration) -> Result<Option<Delivery>, TransportError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.live_state()?;

        loop {
            let q = state
                .queues
                .get_mut(queue)
                .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))?;

            if let Some(body) = q.messages.pop_front() {
                return Ok(Some(Delivery::new(queue, body)));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            let (guard, _) = self
                .broker
                .shared
                .changed
                .wait_timeout(state, deadline - now)
                .map_err(|_| TransportError::ConnectionLost("in-memory broker state poisoned".into()))?;
            state = guard;
            self.check_live(&state)?;
        }
    }
}
