//! Handler: inventory.release

use microbus::CommandError;
use serde_json::{json, Value};

use super::Ctx;
use crate::support::ReleaseStock;

pub const COMMAND: &str = "inventory.release";

pub fn guard(ctx: &Ctx) -> bool {
    ctx.has_fields(&["sku", "quantity"])
}

pub fn handle(ctx: &Ctx) -> Result<Value, CommandError> {
    let input = ctx.input::<ReleaseStock>()?;
    let remaining = ctx.state().release(&input.sku, input.quantity)?;
    Ok(json!({ "sku": input.sku, "remaining": remaining }))
}
