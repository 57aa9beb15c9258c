use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::{Money, StockCatalog, StockItem};
use generator::{GeneratorConfig, OrderGenerator};

fn make_catalog(size: usize) -> StockCatalog {
    let items = (0..size)
        .map(|i| StockItem::new(format!("Item-{i:04}"), Money::from_cents(500 + i as i64), 10))
        .collect();
    StockCatalog::new(items).unwrap()
}

fn bench_generate(c: &mut Criterion) {
    let catalog = make_catalog(100);
    let mut group = c.benchmark_group("generator/generate");

    for num_orders in [10, 100, 1_000] {
        let config = GeneratorConfig::new(num_orders)
            .with_invalid_percentage(10)
            .with_expired_card_percentage(10);

        group.bench_with_input(
            BenchmarkId::from_parameter(num_orders),
            &config,
            |b, config| {
                b.iter(|| OrderGenerator::seeded(&catalog, 42).generate(config).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_expensive(c: &mut Criterion) {
    let catalog = make_catalog(100);
    let config = GeneratorConfig::new(100).with_expensive_percentage(100);

    c.bench_function("generator/expensive_batch", |b| {
        b.iter(|| OrderGenerator::seeded(&catalog, 42).generate(&config).unwrap());
    });
}

criterion_group!(benches, bench_generate, bench_expensive);
criterion_main!(benches);
