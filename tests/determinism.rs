use numbers_api::{normalize, plan_search, RawSearchParams, SearchPipeline, SearchPolicy};

fn raw(search: &str) -> RawSearchParams {
    RawSearchParams {
        search: Some(search.into()),
        ..Default::default()
    }
}

#[test]
fn equivalent_spellings_plan_identical_filters() {
    let pipeline = SearchPipeline::default();

    let lettered = pipeline.plan(raw(" taxi ")).expect("lettered term");
    let digits = pipeline.plan(raw("8294")).expect("digit term");
    let spaced = pipeline.plan(raw("8 2 9 4")).expect("spaced term");

    assert_eq!(lettered.filters, digits.filters);
    assert_eq!(digits.filters, spaced.filters);
    assert_eq!(
        lettered.filters.and_expression(),
        "(available.eq.true,number.ilike.*8294*)"
    );
}

#[test]
fn submitted_term_survives_normalization() {
    let plan = plan_search(raw("Taxi"), &SearchPolicy::default()).expect("plan");
    assert_eq!(plan.query.submitted_search.as_deref(), Some("Taxi"));
    assert_eq!(plan.query.term.as_log_value().as_deref(), Some("8294"));
}

#[test]
fn normalizing_twice_changes_nothing() {
    let once = normalize(RawSearchParams {
        search: Some("call me 786".into()),
        price_lte: Some(" 99.50 ".into()),
        ..Default::default()
    });
    let twice = normalize(RawSearchParams {
        search_type: Some(once.search_type.clone()),
        search: once.search.clone(),
        match_mode: once.match_mode.clone(),
        price_gte: once.price_gte.clone(),
        price_lte: once.price_lte.clone(),
        range: once.range.clone(),
        delivery: once.delivery.clone(),
    });

    assert_eq!(once.search, twice.search);
    assert_eq!(once.price_lte, twice.price_lte);
    assert_eq!(once.search_type, twice.search_type);
}

#[test]
fn repeated_planning_is_stable() {
    let pipeline = SearchPipeline::default();
    let request = RawSearchParams {
        search_type: Some("last_six".into()),
        search: Some("123456".into()),
        match_mode: Some("exact".into()),
        price_gte: Some("10".into()),
        price_lte: Some("500.99".into()),
        range: Some("20-39".into()),
        delivery: Some("1".into()),
    };

    let first = pipeline.plan(request.clone()).expect("first plan");
    for _ in 0..10 {
        let again = pipeline.plan(request.clone()).expect("repeat plan");
        assert_eq!(again.filters, first.filters);
        assert_eq!(again.query, first.query);
    }
    assert_eq!(
        first.filters.to_strings(),
        vec![
            "available.eq.true",
            "last_six.eq.123456",
            "price.gte.10",
            "price.lte.500.99",
            "delivery.eq.1",
        ]
    );
}
