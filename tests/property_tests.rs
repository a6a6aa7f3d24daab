//! Property-based tests for stock classification and movement projection.

mod common;

use proptest::prelude::*;
use wine_cellar::models::{TransactionDraft, TransactionType, Wine};
use wine_cellar::services::alerts::{aggregate, alerts, classify, AlertLevel};
use wine_cellar::services::stock::evaluate;
use wine_cellar::services::validation::{validate_transaction, TransactionPolicy};

fn stock_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![-50i32..500, Just(0), Just(i32::MAX), Just(i32::MIN)]
}

fn threshold_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![0i32..200, Just(i32::MAX)]
}

fn kind_strategy() -> impl Strategy<Value = TransactionType> {
    prop_oneof![Just(TransactionType::In), Just(TransactionType::Out)]
}

fn wine(id: i64, stock: i32, threshold: i32) -> Wine {
    serde_json::from_value(common::wine_json(id, &format!("Wine {id}"), stock, threshold))
        .expect("wine fixture decodes")
}

fn cellar_strategy() -> impl Strategy<Value = Vec<Wine>> {
    prop::collection::vec((-5i32..60, 0i32..30), 0..40).prop_map(|levels| {
        levels
            .into_iter()
            .enumerate()
            .map(|(i, (stock, threshold))| wine(i as i64 + 1, stock, threshold))
            .collect()
    })
}

// Property: every stock level lands in exactly the bucket its bounds describe
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn classification_matches_bucket_bounds(stock in stock_strategy(), threshold in threshold_strategy()) {
        let level = classify(stock, threshold);
        let (s, t) = (i64::from(stock), i64::from(threshold));
        let expected = if s <= 0 {
            AlertLevel::OutOfStock
        } else if s > t {
            AlertLevel::Normal
        } else if 2 * s <= t {
            AlertLevel::Critical
        } else {
            AlertLevel::Low
        };
        prop_assert_eq!(level, expected);
    }

    #[test]
    fn zero_threshold_only_alerts_when_empty(stock in stock_strategy()) {
        let level = classify(stock, 0);
        prop_assert!(level == AlertLevel::OutOfStock || level == AlertLevel::Normal);
        prop_assert_eq!(level == AlertLevel::OutOfStock, stock <= 0);
    }

    #[test]
    fn adding_stock_never_worsens_the_level(stock in 0i32..1000, threshold in 0i32..200, extra in 0i32..1000) {
        prop_assert!(classify(stock + extra, threshold) >= classify(stock, threshold));
    }
}

// Property: aggregation counts each wine once and ignores order
proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn aggregate_is_order_independent(mut cellar in cellar_strategy()) {
        let forward = aggregate(&cellar);
        cellar.reverse();
        prop_assert_eq!(aggregate(&cellar), forward);
    }

    #[test]
    fn alert_list_agrees_with_summary(cellar in cellar_strategy()) {
        let summary = aggregate(&cellar);
        let list = alerts(&cellar);
        prop_assert_eq!(list.len(), summary.total());
        prop_assert!(summary.total() <= cellar.len());
        prop_assert!(list.windows(2).all(|pair| pair[0].level <= pair[1].level));
        prop_assert!(list.iter().all(|alert| alert.level.is_alert()));
    }
}

// Property: projections agree with the form validator
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn projection_applies_the_delta(
        stock in 0i32..10_000,
        threshold in threshold_strategy(),
        kind in kind_strategy(),
        quantity in -100i32..10_000,
    ) {
        let projection = evaluate(stock, threshold, kind, quantity);
        let expected = match kind {
            TransactionType::In => i64::from(stock) + i64::from(quantity),
            TransactionType::Out => i64::from(stock) - i64::from(quantity),
        };
        prop_assert_eq!(projection.projected_stock, expected);
        prop_assert!(!(projection.will_be_out_of_stock && projection.will_be_below_threshold));
        if projection.is_valid {
            prop_assert!(projection.projected_stock >= 0);
            prop_assert!(projection.violation.is_none());
        }
    }

    #[test]
    fn projection_validity_matches_quantity_rules(
        stock in 0i32..10_000,
        threshold in 0i32..200,
        kind in kind_strategy(),
        quantity in -100i32..10_000,
    ) {
        let projection = evaluate(stock, threshold, kind, quantity);
        let draft = TransactionDraft::new(1, kind, quantity).with_reason("audit");
        let errors = validate_transaction(&draft, stock, &TransactionPolicy::default());
        prop_assert_eq!(projection.is_valid, !errors.contains("quantity"));
    }

    #[test]
    fn evaluation_is_repeatable(
        stock in 0i32..10_000,
        threshold in threshold_strategy(),
        kind in kind_strategy(),
        quantity in -100i32..10_000,
    ) {
        prop_assert_eq!(
            evaluate(stock, threshold, kind, quantity),
            evaluate(stock, threshold, kind, quantity)
        );
        prop_assert_eq!(classify(stock, threshold), classify(stock, threshold));
    }

    #[test]
    fn stock_in_is_always_in_range(stock in 0i32..10_000, quantity in 1i32..10_000) {
        let projection = evaluate(stock, 10, TransactionType::In, quantity);
        prop_assert!(projection.is_valid);
        prop_assert!(projection.projected_stock > i64::from(stock));
        prop_assert!(!projection.will_be_out_of_stock);
    }
}
