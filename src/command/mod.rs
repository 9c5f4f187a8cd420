//! Command forwarding.
//!
//! Commands are point-to-point: `Bus::send_command` hands each one to a
//! `Mediator`, which routes it to exactly one handler and returns a single
//! result. The bus adds nothing beyond JSON encoding of the command and
//! decoding of the response; mediator errors come back unchanged.
//!
//! `CommandRouter` is the bundled mediator: a map of named handler closures
//! sharing one state value.
//!
//! ## Handler Convention
//!
//! Each handler module follows this convention, so `register_commands!`
//! can wire it up:
//!
//! ```ignore
//! // src/commands/inventory_reserve.rs
//!
//! pub const COMMAND: &str = "inventory.reserve";
//!
//! pub fn guard(ctx: &CommandContext<Inventory>) -> bool {
//!     ctx.has_fields(&["sku", "quantity"])
//! }
//!
//! pub fn handle(ctx: &CommandContext<Inventory>) -> Result<Value, CommandError> {
//!     let input = ctx.input::<ReserveStock>()?;
//!     ctx.state().reserve(&input.sku, input.quantity)?;
//!     Ok(json!({ "sku": input.sku }))
//! }
//! ```

mod context;
mod error;
mod router;

use std::sync::Arc;

use serde_json::Value;

pub use context::CommandContext;
pub use error::CommandError;
pub use router::CommandRouter;

/// Routes a command to its single designated handler.
///
/// The command travels as its name plus a JSON value so the trait stays
/// object-safe; `Bus::send_command` does the typed conversion on both ends.
pub trait Mediator: Send + Sync {
    fn send(&self, command: &str, input: Value) -> Result<Value, CommandError>;
}

impl<M: Mediator + ?Sized> Mediator for Arc<M> {
    fn send(&self, command: &str, input: Value) -> Result<Value, CommandError> {
        (**self).send(command, input)
    }
}

/// Register handler modules with a router using the convention pattern.
///
/// Each handler module must export:
/// - `COMMAND: &str`: the command name
/// - `guard(ctx) -> bool`: input validation
/// - `handle(ctx) -> Result<Value, CommandError>`: the handler
///
/// # Example
/// ```ignore
/// let router = microbus::register_commands!(
///     CommandRouter::new(Inventory::default()),
///     commands::inventory_reserve,
///     commands::inventory_release,
/// );
/// ```
#[macro_export]
macro_rules! register_commands {
    ($router:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $router
        $(
            .command_guarded(
                $($seg)::+::COMMAND,
                $($seg)::+::guard,
                $($seg)::+::handle,
            )
        )+
    };
}
