//! Message contracts shared by producers and consumers.
//!
//! Events are broadcast through the broker to every subscribed handler.
//! Commands go through the mediator to exactly one handler. Both carry a
//! textual name: for events it doubles as the broker queue name.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// An immutable fact broadcast over the bus.
///
/// `NAME` is the event's textual type name. It is the queue name on the
/// broker and the key in the bus registry, so it must be unique among the
/// event types of one system. `#[derive(Event)]` sets it to the bare type
/// name unless `#[event(name = "...")]` overrides it.
///
/// ## Example
///
/// ```
/// use microbus::Event;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize, Event)]
/// pub struct OrderCreated {
///     pub order_id: String,
/// }
///
/// let event = OrderCreated { order_id: "A1".into() };
/// assert_eq!(event.type_name(), "OrderCreated");
/// ```
pub trait Event: Serialize + DeserializeOwned + Send + Sync + 'static {
    const NAME: &'static str;

    /// The textual type name of this event, identical for every instance.
    fn type_name(&self) -> &'static str {
        Self::NAME
    }
}

/// A request routed through the mediator to a single handler.
///
/// `Response` is what the handler's JSON result decodes into.
pub trait Command: Serialize + Send + 'static {
    const NAME: &'static str;

    type Response: DeserializeOwned;
}
