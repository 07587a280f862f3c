//! Integration tests walking the entities through a full purchase.

use chrono::{TimeDelta, TimeZone, Utc};
use common::{Clock, ErrorCode, FixedClock, Money, SequentialIds};
use domain::{
    Customer, Delivery, DeliveryStatus, NewCustomer, NewDelivery, NewProduct, NewTransaction,
    Product, Transaction, TransactionStatus,
};

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap())
}

fn keyboard(ids: &SequentialIds, clock: &FixedClock, stock: i64) -> Product {
    Product::create(
        NewProduct {
            name: "Mechanical Gaming Keyboard".to_string(),
            description: "RGB backlit".to_string(),
            price: Money::from_major(180000),
            stock,
            image_url: "https://example.com/keyboard.jpg".to_string(),
        },
        ids,
        clock,
    )
    .unwrap()
}

fn buyer(ids: &SequentialIds, clock: &FixedClock) -> Customer {
    Customer::create(
        NewCustomer {
            email: "jane@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            phone: "+57 300 123 4567".to_string(),
        },
        ids,
        clock,
    )
    .unwrap()
}

#[test]
fn test_approved_purchase_flow() {
    let ids = SequentialIds::new();
    let clock = clock();
    let mut product = keyboard(&ids, &clock, 2);
    let customer = buyer(&ids, &clock);

    let mut tx = Transaction::create(
        NewTransaction {
            product_id: product.id(),
            customer_id: customer.id(),
            product_amount: product.price(),
            base_fee: Money::from_major(1000),
            delivery_fee: Money::from_major(5000),
            payment_method: "CARD".to_string(),
        },
        &ids,
        &clock,
    )
    .unwrap();
    assert_eq!(tx.total_amount(), Money::from_major(186000));
    assert_eq!(tx.status(), TransactionStatus::Pending);

    clock.advance(TimeDelta::seconds(3));
    tx.approve("pay1", clock.now()).unwrap();
    product.decrease_stock(1, clock.now()).unwrap();

    let mut delivery = Delivery::create(
        NewDelivery {
            transaction_id: tx.id(),
            address: "Calle 123 #45-67".to_string(),
            city: "Medellin".to_string(),
            state: "Antioquia".to_string(),
            zip_code: "050001".to_string(),
            country: "Colombia".to_string(),
            notes: None,
        },
        &ids,
        &clock,
    )
    .unwrap();

    assert_eq!(tx.status(), TransactionStatus::Approved);
    assert_eq!(tx.gateway_transaction_id(), Some("pay1"));
    assert!(tx.updated_at() > tx.created_at());
    assert_eq!(product.stock(), 1);
    assert_eq!(delivery.transaction_id(), tx.id());
    assert_eq!(
        delivery.estimated_delivery() - delivery.created_at(),
        TimeDelta::days(5)
    );

    delivery.mark_as_in_transit().unwrap();
    delivery.mark_as_delivered().unwrap();
    assert_eq!(delivery.status(), DeliveryStatus::Delivered);
    // Every id above came from the same generator.
    assert_eq!(ids.issued(), 5);
}

#[test]
fn test_settled_transaction_only_moves_to_error() {
    let ids = SequentialIds::new();
    let clock = clock();
    let product = keyboard(&ids, &clock, 1);
    let customer = buyer(&ids, &clock);
    let mut tx = Transaction::create(
        NewTransaction {
            product_id: product.id(),
            customer_id: customer.id(),
            product_amount: product.price(),
            base_fee: Money::zero(),
            delivery_fee: Money::zero(),
            payment_method: "CARD".to_string(),
        },
        &ids,
        &clock,
    )
    .unwrap();

    tx.decline(Some("Insufficient funds"), clock.now()).unwrap();
    let err = tx.approve("late", clock.now()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(tx.status(), TransactionStatus::Declined);

    tx.mark_as_error("reconciliation mismatch", clock.now()).unwrap();
    assert_eq!(tx.status(), TransactionStatus::Error);
    let data = tx.payment_data().unwrap();
    assert_eq!(data["declineReason"], "Insufficient funds");
    assert_eq!(data["error"], "reconciliation mismatch");
}

#[test]
fn test_sold_out_product_is_unavailable() {
    let ids = SequentialIds::new();
    let clock = clock();
    let mut product = keyboard(&ids, &clock, 1);

    assert!(product.is_available(1));
    product.decrease_stock(1, clock.now()).unwrap();
    assert!(!product.is_available(1));

    let err = product.decrease_stock(1, clock.now()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientStock);
    assert_eq!(err.message(), "Insufficient stock. Available: 0");
}

#[test]
fn test_oversized_fee_never_reaches_the_total() {
    let ids = SequentialIds::new();
    let clock = clock();
    let product = keyboard(&ids, &clock, 1);
    let customer = buyer(&ids, &clock);

    assert_eq!(Money::from_decimal(1e17), None);
    let err = Transaction::create(
        NewTransaction {
            product_id: product.id(),
            customer_id: customer.id(),
            product_amount: product.price(),
            base_fee: Money::from_cents(i64::MAX - 1),
            delivery_fee: Money::from_major(5000),
            payment_method: "CARD".to_string(),
        },
        &ids,
        &clock,
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(err.status_code(), 400);
}
