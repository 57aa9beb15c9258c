//! Integration tests against the bundled stock database.

use domain::{DomainError, Money, Order, OrderItem, Payment, StockCatalog};

const STOCK_DATABASE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/stock_database.json");

#[tokio::test]
async fn test_bundled_catalog_loads() {
    let catalog = StockCatalog::load(STOCK_DATABASE).await.unwrap();

    assert!(!catalog.is_empty());
    let widget = catalog.get("Widget").unwrap();
    assert_eq!(widget.item_price, Money::from_dollars(50));
    assert!(catalog.items().iter().all(|item| !item.item_price.is_negative()));
}

#[tokio::test]
async fn test_order_built_from_catalog_entries() {
    let catalog = StockCatalog::load(STOCK_DATABASE).await.unwrap();
    let items = catalog
        .items()
        .iter()
        .take(2)
        .map(|stock| OrderItem::new(stock.item_name.clone(), stock.item_price, 2))
        .collect();

    let order = Order::new(items, Payment::card("1234 5678 1234 5678", "12/25")).unwrap();
    let expected: Money = catalog
        .items()
        .iter()
        .take(2)
        .map(|stock| stock.item_price.multiply(2))
        .sum();
    assert_eq!(order.total(), expected);
    assert!(order.items.iter().all(|i| catalog.contains(&i.item_name)));
}

#[test]
fn test_order_json_uses_camel_case() {
    let json = r#"{
        "items": [{"itemName": "Widget", "itemPrice": 50.0, "quantity": 1}],
        "payment": {"creditCard": {"number": "1234 5678 1234 5678", "expiration": "12/25"}}
    }"#;

    let order: Order = serde_json::from_str(json).unwrap();
    order.validate().unwrap();
    assert_eq!(order.total(), Money::from_dollars(50));
    assert_eq!(order.card_expiration(), "12/25");
    assert!(!order.requires_approval());
}

#[test]
fn test_duplicate_catalog_entries_are_rejected() {
    let json = r#"[
        {"itemName": "Widget", "itemPrice": 50.0, "stock": 1},
        {"itemName": "Widget", "itemPrice": 55.0, "stock": 1}
    ]"#;
    assert!(matches!(
        StockCatalog::from_json_str(json),
        Err(DomainError::Catalog(_))
    ));
}
