//! Event bus: subscription registry, consumer loops, dispatch and publish.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Bus<B>                               │
//! │  publish() / publish_batch() / subscribe() / send_command() │
//! └─────────────────────────────────────────────────────────────┘
//!        │                     │                       │
//!        ▼                     ▼                       ▼
//! ┌─────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │  Publisher  │    │   TypeRegistry   │    │    Mediator     │
//! │ (1 channel) │    │ name → handlers  │    │ (commands only) │
//! └─────────────┘    └──────────────────┘    └─────────────────┘
//!        │                     ▲
//!        │                     │ snapshot per message
//!        ▼                     │
//! ┌─────────────┐    ┌──────────────────┐
//! │   Broker    │───▶│ Consumer loop    │──▶ Dispatcher ──▶ handlers
//! │ queue/event │    │ (1 thread/event) │
//! └─────────────┘    └──────────────────┘
//! ```

mod bus;
mod consumer;
mod dispatcher;
mod handler;
mod publisher;
mod registry;

pub use bus::Bus;
pub use consumer::ConsumerStats;
pub use handler::{EventHandler, HandlerError};
pub use registry::Subscription;
