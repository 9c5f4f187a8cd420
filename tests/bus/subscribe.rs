use microbus::broker::InMemoryBroker;
use microbus::{BusError, Subscription};

use crate::support::*;

#[test]
fn duplicate_subscription_is_rejected() {
    let broker = InMemoryBroker::new();
    let bus = bus(&broker);
    let log = log();

    subscribe_orders(&bus, &log).unwrap();
    let err = subscribe_orders(&bus, &log).unwrap_err();

    assert!(matches!(
        err,
        BusError::DuplicateSubscription { event: "OrderCreated", .. }
    ));
}

#[test]
fn duplicate_handler_still_runs_once_per_message() {
    let broker = InMemoryBroker::new();
    let bus = bus(&broker);
    let log = log();

    subscribe_orders(&bus, &log).unwrap();
    assert!(subscribe_orders(&bus, &log).is_err());

    bus.publish(&OrderCreated { order_id: "A1".into() }).unwrap();
    bus.publish(&OrderCreated { order_id: "A2".into() }).unwrap();
    assert!(wait_until(|| entries(&log).len() >= 2));

    let stats = bus.shutdown();
    assert_eq!(entries(&log).len(), 2);
    assert_eq!(stats["OrderCreated"].handled, 2);
}

#[test]
fn subscriptions_lists_handlers_per_event() {
    let broker = InMemoryBroker::new();
    let bus = bus(&broker);
    let orders = log();
    let payments = log();

    subscribe_orders(&bus, &orders).unwrap();
    subscribe_ledger(&bus, &payments).unwrap();
    subscribe_receipts(&bus, &payments).unwrap();

    let subscriptions = bus.subscriptions().unwrap();
    let events: Vec<_> = subscriptions.iter().map(|s| s.event).collect();
    assert_eq!(events, vec!["OrderCreated", "PaymentReceived"]);

    let Subscription { handlers, .. } = &subscriptions[1];
    assert_eq!(handlers.len(), 2);
    assert!(handlers[0].ends_with("LedgerHandler"));
    assert!(handlers[1].ends_with("ReceiptHandler"));

    assert!(bus.has_subscription::<PaymentReceived, ReceiptHandler>().unwrap());
    assert!(!bus.has_subscription::<PaymentReceived, FraudCheckHandler>().unwrap());
}

#[test]
fn one_consumer_per_event_type() {
    let broker = InMemoryBroker::new();
    let bus = bus(&broker);
    let payments = log();

    subscribe_ledger(&bus, &payments).unwrap();
    subscribe_receipts(&bus, &payments).unwrap();
    assert!(wait_for_queue(&broker, "PaymentReceived"));

    let stats = bus.shutdown();
    assert_eq!(stats.keys().copied().collect::<Vec<_>>(), vec!["PaymentReceived"]);
}

#[test]
fn subscribing_after_shutdown_fails() {
    let broker = InMemoryBroker::new();
    let bus = bus(&broker);
    bus.shutdown();

    let err = subscribe_orders(&bus, &log()).unwrap_err();
    assert!(matches!(err, BusError::ShutDown));
}

#[test]
fn handler_joins_a_running_loop() {
    let broker = InMemoryBroker::new();
    let bus = bus(&broker);
    let log = log();

    subscribe_ledger(&bus, &log).unwrap();
    bus.publish(&PaymentReceived::new("p-1", 100)).unwrap();
    assert!(wait_until(|| entries(&log).len() == 1));

    subscribe_receipts(&bus, &log).unwrap();
    bus.publish(&PaymentReceived::new("p-2", 200)).unwrap();
    assert!(wait_until(|| entries(&log).len() == 3));

    let stats = bus.shutdown();
    let seen: Vec<_> = entries(&log)
        .into_iter()
        .map(|(tag, e)| (tag, e.payment_id))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("ledger", "p-1".to_string()),
            ("ledger", "p-2".to_string()),
            ("receipt", "p-2".to_string()),
        ]
    );
    assert_eq!(stats.len(), 1);
    assert_eq!(stats["PaymentReceived"].deliveries, 2);
}

#[test]
fn subscribing_while_another_loop_dispatches() {
    let broker = InMemoryBroker::new();
    let bus = bus(&broker);
    let payments = log();
    let orders = log();

    subscribe_ledger(&bus, &payments).unwrap();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for n in 0..50 {
                bus.publish(&PaymentReceived::new(&format!("p-{n}"), n)).unwrap();
            }
        });

        subscribe_orders(&bus, &orders).unwrap();
        bus.publish(&OrderCreated { order_id: "A1".into() }).unwrap();
    });

    assert!(wait_until(|| entries(&payments).len() == 50 && entries(&orders).len() == 1));

    let stats = bus.shutdown();
    assert_eq!(stats.keys().copied().collect::<Vec<_>>(), vec!["OrderCreated", "PaymentReceived"]);
    assert_eq!(stats["PaymentReceived"].handled, 50);
    assert_eq!(stats["OrderCreated"].handled, 1);
}
