use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Money, Order, OrderItem, Payment, StockCatalog, StockItem};

fn make_catalog(size: usize) -> StockCatalog {
    let items = (0..size)
        .map(|i| StockItem::new(format!("Item-{i:04}"), Money::from_cents(100 + i as i64), 10))
        .collect();
    StockCatalog::new(items).unwrap()
}

fn bench_catalog_lookup(c: &mut Criterion) {
    let catalog = make_catalog(1_000);

    c.bench_function("domain/catalog_lookup_hit", |b| {
        b.iter(|| catalog.get(std::hint::black_box("Item-0500")));
    });

    c.bench_function("domain/catalog_lookup_miss", |b| {
        b.iter(|| catalog.get(std::hint::black_box("Item-0500@@@")));
    });
}

fn bench_order_total(c: &mut Criterion) {
    let items = (0..3)
        .map(|i| OrderItem::new(format!("Item-{i:04}"), Money::from_cents(4999), 3))
        .collect();
    let order = Order::new(items, Payment::card("1234 5678 1234 5678", "12/25")).unwrap();

    c.bench_function("domain/order_total", |b| {
        b.iter(|| std::hint::black_box(&order).total());
    });
}

criterion_group!(benches, bench_catalog_lookup, bench_order_total);
criterion_main!(benches);
