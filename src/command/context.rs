//! What a command handler sees: the JSON payload a sender encoded, the
//! name it was routed under, and the router's shared state.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::CommandError;

/// Borrowed view of one in-flight command.
///
/// Lives only for the duration of a single `CommandRouter::dispatch`; the
/// guard and the handler see the same instance.
///
/// ## Example
///
/// ```ignore
/// pub fn handle(ctx: &CommandContext<Inventory>) -> Result<Value, CommandError> {
///     let input = ctx.input::<ReserveStock>()?;
///     ctx.state().reserve(&input.sku, input.quantity)?;
///     Ok(json!({ "reserved": input.quantity }))
/// }
/// ```
pub struct CommandContext<'a, S> {
    command_name: &'a str,
    input: Value,
    state: &'a S,
}

impl<'a, S> CommandContext<'a, S> {
    pub(crate) fn new(command_name: &'a str, input: Value, state: &'a S) -> Self {
        Self {
            command_name,
            input,
            state,
        }
    }

    /// Decode the command payload into `T`.
    ///
    /// Fails with `CommandError::DecodeFailed` when the payload does not
    /// match `T`; handlers usually return that straight to the sender.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, CommandError> {
        serde::Deserialize::deserialize(&self.input).map_err(|e| CommandError::DecodeFailed(e.to_string()))
    }

    /// The payload exactly as `Bus::send_command` encoded it.
    pub fn raw_input(&self) -> &Value {
        &self.input
    }

    /// Name the command was routed under (`Command::NAME`).
    pub fn command_name(&self) -> &str {
        self.command_name
    }

    pub fn state(&self) -> &S {
        self.state
    }

    /// Whether the payload is an object with a `field` key. Meant for guards.
    pub fn has_field(&self, field: &str) -> bool {
        self.input
            .as_object()
            .is_some_and(|object| object.contains_key(field))
    }

    /// Whether every key in `fields` is present in the payload.
    pub fn has_fields(&self, fields: &[&str]) -> bool {
        fields.iter().all(|field| self.has_field(field))
    }
}
