//! In-process event and command bus over a message broker.
//!
//! Events are published to a queue named after their type and fanned out to
//! every subscribed handler by a background consumer loop. Commands are sent
//! through a `Mediator` to exactly one handler.
//!
//! ```ignore
//! use microbus::broker::InMemoryBroker;
//! use microbus::{Bus, CommandRouter};
//!
//! let bus = Bus::new(InMemoryBroker::new(), CommandRouter::new(()));
//! bus.subscribe::<OrderCreated, SendConfirmation>()?;
//! bus.publish(&OrderCreated { order_id: "A1".into() })?;
//! ```

extern crate self as microbus;

pub mod broker;
mod bus;
pub mod command;
mod config;
mod error;
mod message;

pub use bus::{Bus, ConsumerStats, EventHandler, HandlerError, Subscription};
pub use command::{CommandContext, CommandError, CommandRouter, Mediator};
pub use config::{BusConfig, ReconnectPolicy};
pub use error::{BusError, Result};
pub use message::{Command, Event};
pub use microbus_macros::{Command, Event};
pub use serde_json::Value;
