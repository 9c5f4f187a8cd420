use microbus::{CommandError, CommandRouter, Mediator};
use serde_json::json;

use crate::support::Inventory;

fn router() -> CommandRouter<Inventory> {
    CommandRouter::new(Inventory::with_stock(&[("X-1", 5)])).command("inventory.count", |ctx| {
        let sku = ctx.raw_input()["sku"].as_str().unwrap_or_default();
        let available = ctx
            .state()
            .available(sku)
            .ok_or_else(|| CommandError::NotFound(sku.to_string()))?;
        Ok(json!(available))
    })
}

#[test]
fn dispatches_by_name() {
    let router = router();
    assert_eq!(router.send("inventory.count", json!({ "sku": "X-1" })).unwrap(), json!(5));
}

#[test]
fn handler_errors_pass_through() {
    let router = router();
    let err = router.send("inventory.count", json!({ "sku": "missing" })).unwrap_err();
    assert!(matches!(err, CommandError::NotFound(ref sku) if sku == "missing"));
}

#[test]
fn unknown_command_is_reported() {
    let router = router();
    let err = router.send("inventory.transfer", json!({})).unwrap_err();
    assert!(matches!(err, CommandError::UnknownCommand(ref name) if name == "inventory.transfer"));
}
