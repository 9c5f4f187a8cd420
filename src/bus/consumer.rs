//! Consumer loop: one background thread per subscribed event type.
//!
//! The loop owns its broker channel, declares the event queue, and feeds
//! every delivery to the `Dispatcher`. Transport faults never end the loop
//! on their own: a broken channel is reopened with exponential backoff, and
//! the loop only gives up when a bounded `ReconnectPolicy` runs out.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use super::dispatcher::{DispatchOutcome, Dispatcher};
use crate::broker::{Broker, Channel, TransportError};
use crate::config::BusConfig;
use crate::error::{BusError, Result};

/// Statistics from one consumer loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Messages received from the broker.
    pub deliveries: usize,
    /// Successful handler invocations.
    pub handled: usize,
    /// Handler invocations that returned an error or panicked.
    pub handler_failures: usize,
    /// Messages dropped because they did not decode.
    pub malformed: usize,
    /// Messages dropped because no event type was registered for them.
    pub unknown: usize,
    /// Transport errors seen (failed connects included).
    pub transport_errors: usize,
    /// Successful reconnects after the initial connection.
    pub reconnects: usize,
    /// Receive calls made.
    pub polls: usize,
}

impl ConsumerStats {
    fn record(&mut self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::UnknownEvent => self.unknown += 1,
            DispatchOutcome::Malformed => self.malformed += 1,
            DispatchOutcome::Handled { succeeded, failed } => {
                self.handled += succeeded;
                self.handler_failures += failed;
            }
        }
    }
}

/// Handle to a running consumer loop. Drop or call `stop()` to shut down.
pub(crate) struct ConsumerHandle {
    queue: &'static str,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<ConsumerStats>>,
}

impl ConsumerHandle {
    pub fn queue(&self) -> &'static str {
        self.queue
    }

    /// Stop the loop and wait for it to finish. Returns its stats.
    pub fn stop(mut self) -> ConsumerStats {
        let _ = self.stop_tx.send(());
        let Some(handle) = self.handle.take() else {
            return ConsumerStats::default();
        };
        match handle.join() {
            Ok(stats) => stats,
            Err(_) => {
                error!(queue = self.queue, "consumer thread panicked, stats lost");
                ConsumerStats::default()
            }
        }
    }

    /// Signal stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for ConsumerHandle {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

/// Start a consumer loop for `queue` on its own thread.
pub(crate) fn spawn<B: Broker>(
    broker: Arc<B>,
    queue: &'static str,
    dispatcher: Dispatcher,
    config: BusConfig,
) -> Result<ConsumerHandle> {
    let (stop_tx, stop_rx) = mpsc::channel();
    let consumer = ConsumerLoop {
        broker,
        queue,
        dispatcher,
        config,
        stop_rx,
    };

    let handle = thread::Builder::new()
        .name(format!("microbus-{queue}"))
        .spawn(move || consumer.run())
        .map_err(|source| BusError::ConsumerStart { queue, source })?;

    Ok(ConsumerHandle {
        queue,
        stop_tx,
        handle: Some(handle),
    })
}

struct ConsumerLoop<B: Broker> {
    broker: Arc<B>,
    queue: &'static str,
    dispatcher: Dispatcher,
    config: BusConfig,
    stop_rx: Receiver<()>,
}

impl<B: Broker> ConsumerLoop<B> {
    fn run(self) -> ConsumerStats {
        let queue = self.queue;
        let poll_interval = self.config.poll_interval();
        let policy = &self.config.reconnect;

        let mut stats = ConsumerStats::default();
        let mut channel: Option<B::Channel> = None;
        let mut connected_once = false;
        let mut failures: u32 = 0;
        // Consecutive receive errors on a channel that is still usable
        let mut faults: u32 = 0;

        info!(queue, "consumer loop started");

        loop {
            if self.stop_requested() {
                break;
            }

            if channel.is_none() {
                match self.connect() {
                    Ok(opened) => {
                        if connected_once {
                            stats.reconnects += 1;
                            info!(queue, attempts = failures, "consumer reconnected");
                        }
                        connected_once = true;
                        failures = 0;
                        channel = Some(opened);
                    }
                    Err(source) => {
                        stats.transport_errors += 1;
                        failures += 1;
                        let error = BusError::Transport {
                            queue: queue.to_string(),
                            source,
                        };

                        if !policy.allows(failures) {
                            error!(queue, attempts = failures, %error, "giving up on broker connection");
                            break;
                        }

                        let delay = policy.backoff(failures);
                        warn!(queue, attempt = failures, ?delay, %error, "broker connection failed, retrying");
                        if self.sleep_or_stop(delay) {
                            break;
                        }
                        continue;
                    }
                }
            }

            let Some(open) = channel.as_mut() else {
                continue;
            };

            stats.polls += 1;

            match open.consume(queue, poll_interval) {
                Ok(Some(delivery)) => {
                    faults = 0;
                    stats.deliveries += 1;
                    debug!(queue, routing_key = %delivery.routing_key, bytes = delivery.body.len(), "message received");
                    let outcome = self
                        .dispatcher
                        .process_message(&delivery.routing_key, &delivery.body);
                    stats.record(outcome);
                }
                Ok(None) => faults = 0,
                Err(source) => {
                    stats.transport_errors += 1;
                    let reopen = source.is_connection_error();
                    let error = BusError::Transport {
                        queue: queue.to_string(),
                        source,
                    };
                    if reopen {
                        warn!(queue, %error, "receive failed, reopening channel");
                        faults = 0;
                        channel = None;
                        continue;
                    }

                    faults += 1;
                    let delay = policy.backoff(faults);
                    warn!(queue, attempt = faults, ?delay, %error, "receive failed");
                    if self.sleep_or_stop(delay) {
                        break;
                    }
                }
            }
        }

        info!(queue, deliveries = stats.deliveries, "consumer loop stopped");
        stats
    }

    fn connect(&self) -> std::result::Result<B::Channel, TransportError> {
        let mut channel = self.broker.open_channel()?;
        channel.declare_queue(self.queue, self.config.queue)?;
        Ok(channel)
    }

    fn stop_requested(&self) -> bool {
        match self.stop_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => true,
            Err(TryRecvError::Empty) => false,
        }
    }

    /// Wait out a backoff delay; returns `true` if stop arrived meanwhile.
    fn sleep_or_stop(&self, delay: std::time::Duration) -> bool {
        match self.stop_rx.recv_timeout(delay) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        }
    }
}
