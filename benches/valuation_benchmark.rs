//! Benchmarks for order normalization and valuation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hl_order_tracker::orders::{appraise, normalize};
use hl_order_tracker::prices::PriceTable;
use serde_json::{json, Value};

fn create_orders(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| match i % 3 {
            0 => json!({
                "coin": "BTC",
                "side": "B",
                "limitPx": format!("{}.5", 60000 + i),
                "sz": "0.75",
                "oid": i,
                "timestamp": 1681247412573u64 + i as u64
            }),
            1 => json!({ "coin": "ETH", "isBuy": false, "size": "12.5", "id": i }),
            _ => json!({ "coin": i % 10, "quantity": 40, "orderId": format!("o-{}", i) }),
        })
        .collect()
}

fn benchmark_normalize(c: &mut Criterion) {
    let orders = create_orders(100);

    c.bench_function("normalize_100_orders", |b| {
        b.iter(|| {
            for raw in &orders {
                black_box(normalize(black_box(raw)));
            }
        })
    });
}

fn benchmark_appraise(c: &mut Criterion) {
    let prices = PriceTable::fallback();
    let orders: Vec<_> = create_orders(100).iter().map(normalize).collect();

    c.bench_function("appraise_100_orders", |b| {
        b.iter(|| {
            for order in &orders {
                let _ = black_box(appraise(black_box(order), &prices));
            }
        })
    });
}

fn benchmark_order_key(c: &mut Criterion) {
    let orders: Vec<_> = create_orders(100).iter().map(normalize).collect();

    c.bench_function("order_key_100_orders", |b| {
        b.iter(|| {
            for order in &orders {
                black_box(black_box(order).key());
            }
        })
    });
}

criterion_group!(benches, benchmark_normalize, benchmark_appraise, benchmark_order_key);
criterion_main!(benches);
