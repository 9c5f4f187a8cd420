//! Command forwarding integration tests.

mod support;
mod handlers;
mod router;
mod convention;
mod forward;
