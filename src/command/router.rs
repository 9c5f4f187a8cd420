//! CommandRouter: named command handlers behind the `Mediator` trait.
//!
//! `CommandRouter<S>` holds shared state and a set of named command handlers.
//! Each handler receives a `CommandContext<S>` and returns
//! `Result<Value, CommandError>`.
//!
//! ## Example
//!
//! ```ignore
//! use microbus::command::CommandRouter;
//! use serde_json::json;
//!
//! let router = CommandRouter::new(inventory)
//!     .command("inventory.reserve", |ctx| {
//!         let input = ctx.input::<ReserveStock>()?;
//!         Ok(json!({ "sku": input.sku }))
//!     });
//!
//! let result = router.dispatch("inventory.reserve", json!({ "sku": "X-1" }));
//! ```

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use super::context::CommandContext;
use super::error::CommandError;
use super::Mediator;

type Guard<S> = Box<dyn Fn(&CommandContext<S>) -> bool + Send + Sync>;
type Handle<S> = Box<dyn Fn(&CommandContext<S>) -> Result<Value, CommandError> + Send + Sync>;

/// A registered command handler with optional guard.
struct CommandHandler<S> {
    guard: Option<Guard<S>>,
    handle: Handle<S>,
}

/// Routes each command to the single handler registered under its name.
///
/// Generic over `S`, the shared state. Handlers receive a
/// `CommandContext<S>` and reach the state via `ctx.state()`.
pub struct CommandRouter<S> {
    state: S,
    handlers: HashMap<String, CommandHandler<S>>,
}

impl<S: Send + Sync + 'static> CommandRouter<S> {
    /// Create a new router with the given state.
    pub fn new(state: S) -> Self {
        Self {
            state,
            handlers: HashMap::new(),
        }
    }

    /// Register a command handler.
    ///
    /// Returns `self` for chaining. Registering the
    /// same name twice replaces the earlier handler.
    pub fn command<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&CommandContext<S>) -> Result<Value, CommandError> + Send + Sync + 'static,
    {
        self.handlers.insert(
            name.to_string(),
            CommandHandler {
                guard: None,
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Register a command handler with a guard function.
    ///
    /// The guard is called before the handler. If it returns `false`,
    /// the command is rejected with `CommandError::GuardRejected`.
    pub fn command_guarded<G, F>(mut self, name: &str, guard: G, handler: F) -> Self
    where
        G: Fn(&CommandContext<S>) -> bool + Send + Sync + 'static,
        F: Fn(&CommandContext<S>) -> Result<Value, CommandError> + Send + Sync + 'static,
    {
        self.handlers.insert(
            name.to_string(),
            CommandHandler {
                guard: Some(Box::new(guard)),
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Dispatch a command by name.
    ///
    /// Builds a `CommandContext` from the input, looks up the handler,
    /// runs the guard (if any), then calls the handler.
    pub fn dispatch(&self, command: &str, input: Value) -> Result<Value, CommandError> {
        let handler = self
            .handlers
            .get(command)
            .ok_or_else(|| CommandError::UnknownCommand(command.to_string()))?;

        let ctx = CommandContext::new(command, input, &self.state);

        if let Some(guard) = &handler.guard {
            if !guard(&ctx) {
                return Err(CommandError::GuardRejected(command.to_string()));
            }
        }

        debug!(command, "dispatching command");
        (handler.handle)(&ctx)
    }

    /// List registered command names.
    pub fn commands(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }

    /// Get a reference to the state.
    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<S: Send + Sync + 'static> Mediator for CommandRouter<S> {
    fn send(&self, command: &str, input: Value) -> Result<Value, CommandError> {
        self.dispatch(command, input)
    }
}
