//! `Bus::send_command` through the mediator.

use std::sync::Arc;

use microbus::broker::InMemoryBroker;
use microbus::{Bus, CommandError, CommandRouter, Mediator, Value};
use serde_json::json;

use crate::handlers;
use crate::support::{AuditStock, Inventory, ReleaseStock, Reserved, ReserveStock};

fn bus() -> Bus<InMemoryBroker> {
    let router = microbus::register_commands!(
        CommandRouter::new(Inventory::with_stock(&[("X-1", 5)])),
        handlers::inventory_reserve,
        handlers::inventory_release,
    )
    .command("inventory.audit", |ctx| {
        Ok(json!({ "X-1": ctx.state().available("X-1") }))
    });
    Bus::new(InMemoryBroker::new(), router)
}

#[test]
fn typed_response_round_trips() {
    let bus = bus();

    let reserved = bus
        .send_command(ReserveStock { sku: "X-1".into(), quantity: 2 })
        .unwrap();
    assert_eq!(reserved, Reserved { sku: "X-1".into(), remaining: 3 });

    let released = bus
        .send_command(ReleaseStock { sku: "X-1".into(), quantity: 1 })
        .unwrap();
    assert_eq!(released.remaining, 4);
}

#[test]
fn untyped_response_is_a_value() {
    let bus = bus();
    let audit: Value = bus.send_command(AuditStock).unwrap();
    assert_eq!(audit, json!({ "X-1": 5 }));
}

#[test]
fn mediator_errors_come_back_unchanged() {
    let bus = bus();

    let err = bus
        .send_command(ReserveStock { sku: "X-1".into(), quantity: 50 })
        .unwrap_err();
    assert!(matches!(err, CommandError::Rejected(ref reason) if reason == "only 5 of X-1 left"));

    let err = bus
        .send_command(ReserveStock { sku: "Z-9".into(), quantity: 1 })
        .unwrap_err();
    assert!(matches!(err, CommandError::NotFound(ref sku) if sku == "Z-9"));
}

struct Offline;

impl Mediator for Offline {
    fn send(&self, command: &str, _input: Value) -> Result<Value, CommandError> {
        Err(CommandError::UnknownCommand(command.to_string()))
    }
}

#[test]
fn any_mediator_can_back_the_bus() {
    let mediator: Arc<dyn Mediator> = Arc::new(Offline);
    let bus = Bus::new(InMemoryBroker::new(), mediator);

    let err = bus.send_command(AuditStock).unwrap_err();
    assert!(matches!(err, CommandError::UnknownCommand(ref name) if name == "inventory.audit"));
}
