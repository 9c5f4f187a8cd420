//! Handler: inventory.reserve

use microbus::CommandError;
use serde_json::{json, Value};

use super::Ctx;
use crate::support::ReserveStock;

pub const COMMAND: &str = "inventory.reserve";

pub fn guard(ctx: &Ctx) -> bool {
    ctx.has_fields(&["sku", "quantity"])
}

pub fn handle(ctx: &Ctx) -> Result<Value, CommandError> {
    let input = ctx.input::<ReserveStock>()?;
    if input.quantity == 0 {
        return Err(CommandError::Rejected("quantity must be positive".into()));
    }

    let remaining = ctx.state().reserve(&input.sku, input.quantity)?;
    Ok(json!({ "sku": input.sku, "remaining": remaining }))
}
