//! Handler modules wired up with `register_commands!`.

use microbus::{CommandError, CommandRouter};
use serde_json::json;

use crate::handlers;
use crate::support::Inventory;

fn router() -> CommandRouter<Inventory> {
    microbus::register_commands!(
        CommandRouter::new(Inventory::with_stock(&[("X-1", 5), ("Y-2", 0)])),
        handlers::inventory_reserve,
        handlers::inventory_release,
    )
}

#[test]
fn registers_every_module() {
    let router = router();
    let mut commands = router.commands();
    commands.sort();
    assert_eq!(commands, vec!["inventory.release", "inventory.reserve"]);
}

#[test]
fn reserve_then_release() {
    let router = router();

    let reserved = router
        .dispatch("inventory.reserve", json!({ "sku": "X-1", "quantity": 3 }))
        .unwrap();
    assert_eq!(reserved, json!({ "sku": "X-1", "remaining": 2 }));

    let released = router
        .dispatch("inventory.release", json!({ "sku": "X-1", "quantity": 1 }))
        .unwrap();
    assert_eq!(released, json!({ "sku": "X-1", "remaining": 3 }));
    assert_eq!(router.state().available("X-1"), Some(3));
}

#[test]
fn guard_rejects_missing_fields() {
    let router = router();
    let err = router
        .dispatch("inventory.reserve", json!({ "sku": "X-1" }))
        .unwrap_err();
    assert!(matches!(err, CommandError::GuardRejected(ref name) if name == "inventory.reserve"));
    assert_eq!(router.state().available("X-1"), Some(5));
}

#[test]
fn business_rules_reject() {
    let router = router();

    let err = router
        .dispatch("inventory.reserve", json!({ "sku": "Y-2", "quantity": 1 }))
        .unwrap_err();
    assert!(matches!(err, CommandError::Rejected(_)));

    let err = router
        .dispatch("inventory.reserve", json!({ "sku": "X-1", "quantity": 0 }))
        .unwrap_err();
    assert!(matches!(err, CommandError::Rejected(_)));
}
