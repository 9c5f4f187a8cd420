mod command;
mod event;

use proc_macro::TokenStream;

/// Derive macro implementing `microbus::Event`.
///
/// The event name (and so the broker queue name) defaults to the bare type
/// name. Qualify it when two event types in one system share a name:
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Event)]
/// #[event(name = "billing.PaymentReceived")]
/// pub struct PaymentReceived {
///     pub payment_id: String,
///     pub amount: u64,
/// }
/// ```
#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    event::derive_event(input)
}

/// Derive macro implementing `microbus::Command`.
///
/// # Usage
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Command)]
/// #[command(name = "orders.create", response = "CreatedOrder")]
/// pub struct CreateOrder {
///     pub order_id: String,
/// }
/// ```
///
/// - `name` defaults to the bare type name.
/// - `response` defaults to `microbus::Value` (a re-export of `serde_json::Value`).
#[proc_macro_derive(Command, attributes(command))]
pub fn derive_command(input: TokenStream) -> TokenStream {
    command::derive_command(input)
}
