use criterion::{criterion_group, criterion_main, Criterion};
use numbers_api::{
    normalize, parse_body, plan_purchase, PurchasePolicy, RawSearchParams, SearchPipeline,
};
use std::hint::black_box;

fn full_request() -> RawSearchParams {
    RawSearchParams {
        search_type: Some("number".into()),
        search: Some(" 07 CALL, 786 ,99 ".into()),
        match_mode: None,
        price_gte: Some("10.00".into()),
        price_lte: Some("999.99".into()),
        range: Some("0-99".into()),
        delivery: Some("7".into()),
    }
}

fn normalize_bench(c: &mut Criterion) {
    c.bench_function("normalize_full_request", |b| {
        b.iter(|| black_box(normalize(black_box(full_request()))));
    });
}

fn plan_bench(c: &mut Criterion) {
    let pipeline = SearchPipeline::default();

    c.bench_function("plan_pattern_search", |b| {
        b.iter(|| {
            let plan = pipeline.plan(black_box(full_request())).unwrap();
            black_box(plan.filters.and_expression());
        });
    });

    c.bench_function("plan_rejected_search", |b| {
        b.iter(|| {
            let raw = RawSearchParams {
                search_type: Some("prefix".into()),
                search: Some("1,2,3,4".into()),
                range: Some("9-0".into()),
                ..Default::default()
            };
            black_box(pipeline.plan(black_box(raw)).unwrap_err());
        });
    });
}

fn purchase_bench(c: &mut Criterion) {
    let policy = PurchasePolicy::default();
    let body: String = std::iter::once("partnerId=acme".to_string())
        .chain((0..100).map(|i| format!("&items.number%5B{i}%5D=077009{i:05}")))
        .collect();

    c.bench_function("plan_form_purchase_100_items", |b| {
        b.iter(|| {
            let raw = parse_body(
                Some("application/x-www-form-urlencoded"),
                black_box(body.as_bytes()),
                None,
            )
            .unwrap();
            black_box(plan_purchase(raw, "acme", &policy).unwrap());
        });
    });
}

criterion_group!(benches, normalize_bench, plan_bench, purchase_bench);
criterion_main!(benches);
