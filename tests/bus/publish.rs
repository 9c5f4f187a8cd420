use microbus::broker::{InMemoryBroker, TransportError};
use microbus::BusError;

use crate::support::*;

#[test]
fn publishing_without_subscribers_succeeds() {
    let broker = InMemoryBroker::new();
    let bus = bus(&broker);

    bus.publish(&PaymentReceived::new("p-1", 100)).unwrap();

    assert!(bus.subscriptions().unwrap().is_empty());
    assert_eq!(broker.depth("PaymentReceived"), 1);
    assert!(bus.shutdown().is_empty());
}

#[test]
fn queued_events_are_delivered_once_a_handler_subscribes() {
    let broker = InMemoryBroker::new();
    let bus = bus(&broker);
    let log = log();

    bus.publish(&PaymentReceived::new("p-early", 100)).unwrap();
    subscribe_ledger(&bus, &log).unwrap();
    assert!(wait_until(|| entries(&log).len() == 1));

    bus.shutdown();
    assert_eq!(entries(&log)[0].1.payment_id, "p-early");
}

#[test]
fn publish_batch_keeps_order() {
    let broker = InMemoryBroker::new();
    let bus = bus(&broker);
    let log = log();
    subscribe_orders(&bus, &log).unwrap();

    let batch: Vec<_> = ["A1", "A2", "A3"]
        .iter()
        .map(|id| OrderCreated { order_id: id.to_string() })
        .collect();
    bus.publish_batch(&batch).unwrap();
    assert!(wait_until(|| entries(&log).len() == 3));

    bus.shutdown();
    let received: Vec<_> = entries(&log).into_iter().map(|(_, e)| e).collect();
    assert_eq!(received, batch);
}

#[test]
fn broker_failure_is_returned_to_the_publisher() {
    let broker = InMemoryBroker::new();
    let bus = bus(&broker);
    broker.fail_next_publishes(1);

    let err = bus.publish(&PaymentReceived::new("p-1", 1)).unwrap_err();
    assert!(matches!(
        err,
        BusError::PublishFailed { event: "PaymentReceived", source: TransportError::ConnectionLost(_) }
    ));

    bus.publish(&PaymentReceived::new("p-2", 2)).unwrap();
    assert_eq!(broker.depth("PaymentReceived"), 1);
}
