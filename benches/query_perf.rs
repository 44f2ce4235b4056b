//! Query-path benchmarks: subset selection and full question answering
//! over synthetic order tables of a few sizes.

use chrono::{Datelike, Duration, NaiveDate};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use botdash::dataset::{Dataset, OrderRecord, RecordFilter};
use botdash::format;
use botdash::query::engine;
use botdash::query::period::Window;

const STATES: [&str; 8] = ["SP", "RJ", "MG", "BA", "CE", "RS", "AM", "PA"];
const CATEGORIES: [&str; 5] = [
    "bed_bath_table",
    "health_beauty",
    "toys",
    "auto",
    "sports_leisure",
];

/// Build `n` plausible orders spread over 2017-2018.
fn synthetic_records(n: usize) -> Vec<OrderRecord> {
    let epoch = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let date = epoch + Duration::days((i % 500) as i64);
            let purchased_at = date.and_hms_opt((i % 24) as u32, 0, 0).unwrap();
            let delivered_at = purchased_at + Duration::days(3 + (i % 20) as i64);
            OrderRecord {
                order_id: format!("order_{i}"),
                customer_id: format!("cust_{}", i % (n / 2 + 1)),
                customer_state: STATES[i % STATES.len()].to_string(),
                customer_city: "cidade".to_string(),
                seller_id: format!("seller_{}", i % 40),
                category: Some(CATEGORIES[i % CATEGORIES.len()].to_string()),
                payment_value: (i % 200) as f64 + 0.99,
                payment_type: "credit_card".to_string(),
                price: (i % 180) as f64 + 0.50,
                freight_value: (i % 40) as f64 + 0.49,
                review_score: Some((i % 5 + 1) as f64),
                purchased_at,
                delivered_at: Some(delivered_at),
                estimated_delivery: Some(purchased_at + Duration::days(15)),
                delivery_days: Some((delivered_at - purchased_at).num_days()),
                month_key: format::month_key(date),
                weekday: date.weekday(),
            }
        })
        .collect()
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    for &size in &[1_000usize, 10_000, 50_000] {
        let data = Dataset::from_records(synthetic_records(size));
        let window = Window::month(2017, 6).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| data.select(&RecordFilter::window(window)))
        });
    }
    group.finish();
}

fn bench_answer(c: &mut Criterion) {
    let data = Dataset::from_records(synthetic_records(10_000));
    let window = Window::month(2017, 6).unwrap();

    let mut group = c.benchmark_group("answer");
    for (name, question) in [
        ("revenue", "Qual o faturamento total?"),
        ("summary", "Me dá um resumo do período"),
        ("region_orders", "Quantos pedidos na região nordeste?"),
        ("slowest_state", "Qual estado tem a entrega mais demorada?"),
        ("help_fallback", "me conte uma piada"),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| engine::answer(&data, question, window))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_select, bench_answer);
criterion_main!(benches);
