//! Price suggestion engine: worked examples and properties.

use proptest::prelude::*;
use resale_finder::models::PriceSuggestion;
use resale_finder::calculate_suggestion;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Worked examples
// ---------------------------------------------------------------------------

#[test]
fn empty_input_is_all_zero() {
    let s = calculate_suggestion(&[]);
    assert_eq!(s, PriceSuggestion::empty());
    assert_eq!(s.min_price, Decimal::ZERO);
    assert_eq!(s.max_price, Decimal::ZERO);
    assert_eq!(s.average_price, Decimal::ZERO);
    assert_eq!(s.median_price, Decimal::ZERO);
    assert_eq!(s.suggested_price, Decimal::ZERO);
    assert_eq!(s.total_listings, 0);
}

#[test]
fn single_price_is_clamped_up_to_itself() {
    let s = calculate_suggestion(&[dec!(29.99)]);
    assert_eq!(s.min_price, dec!(29.99));
    assert_eq!(s.max_price, dec!(29.99));
    assert_eq!(s.average_price, dec!(29.99));
    assert_eq!(s.median_price, dec!(29.99));
    assert_eq!(s.suggested_price, dec!(29.99));
    assert_eq!(s.total_listings, 1);
}

#[test]
fn odd_count_discounts_median() {
    let s = calculate_suggestion(&[dec!(10), dec!(20), dec!(30)]);
    assert_eq!(s.median_price, dec!(20));
    assert_eq!(s.average_price, dec!(20));
    assert_eq!(s.suggested_price, dec!(19.00));
    assert_eq!(s.suggested_price.to_string(), "19.00");
}

#[test]
fn even_count_floor_wins() {
    let s = calculate_suggestion(&[dec!(100), dec!(100), dec!(100), dec!(200)]);
    assert_eq!(s.median_price, dec!(100.00));
    assert_eq!(s.average_price, dec!(125.00));
    assert_eq!(s.suggested_price, dec!(100.00));
    assert_eq!(s.total_listings, 4);
}

#[test]
fn ceiling_caps_suggestion_at_ninety_percent_of_max() {
    // median 100 * 0.95 = 95 > 100 * 0.9 = 90
    let s = calculate_suggestion(&[dec!(50), dec!(100), dec!(100)]);
    assert_eq!(s.suggested_price, dec!(90.00));
}

#[test]
fn all_equal_prices() {
    let s = calculate_suggestion(&[dec!(5), dec!(5), dec!(5), dec!(5)]);
    assert_eq!(s.min_price, dec!(5));
    assert_eq!(s.max_price, dec!(5));
    assert_eq!(s.suggested_price, dec!(5.00));
}

#[test]
fn outputs_round_to_cents() {
    let s = calculate_suggestion(&[dec!(10), dec!(10), dec!(11)]);
    // mean 10.333... -> 10.33
    assert_eq!(s.average_price.to_string(), "10.33");
    assert_eq!(s.min_price.to_string(), "10.00");
}

#[test]
fn half_cent_rounds_up() {
    // mean of 0.01 and 0.02 is 0.015
    let s = calculate_suggestion(&[dec!(0.01), dec!(0.02)]);
    assert_eq!(s.average_price, dec!(0.02));
    assert_eq!(s.median_price, dec!(0.02));
}

#[test]
fn negative_prices_are_not_rejected() {
    let s = calculate_suggestion(&[dec!(-10), dec!(10)]);
    assert_eq!(s.min_price, dec!(-10));
    assert_eq!(s.total_listings, 2);
}

#[test]
fn largest_representable_prices_keep_exact_statistics() {
    let s = calculate_suggestion(&[Decimal::MAX, Decimal::MAX]);
    assert_eq!(s.min_price, Decimal::MAX);
    assert_eq!(s.max_price, Decimal::MAX);
    assert_eq!(s.average_price, s.min_price);
    assert_eq!(s.median_price, s.min_price);
    assert_eq!(s.suggested_price, s.min_price);
    assert_eq!(s.total_listings, 2);
}

#[test]
fn sum_past_decimal_max_stays_in_range() {
    let big = Decimal::from_i128_with_scale(40_000_000_000_000_000_000_000_000_000, 0);
    let s = calculate_suggestion(&[big, big]);
    assert_eq!(s.average_price, big);
    assert_eq!(s.median_price, big);
    assert_eq!(s.suggested_price, big);

    let s = calculate_suggestion(&[big, big, big + big / Decimal::TWO]);
    assert!(s.min_price <= s.average_price && s.average_price <= s.max_price);
    assert_eq!(s.median_price, big);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn price() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Prices up to ~4.3e28: a handful of them overflows a `Decimal` sum.
fn huge_price() -> impl Strategy<Value = Decimal> {
    any::<u32>().prop_map(|n| Decimal::from(n) * Decimal::from_i128_with_scale(10i128.pow(19), 0))
}

proptest! {
    #[test]
    fn suggestion_stays_within_observed_range(prices in prop::collection::vec(price(), 1..60)) {
        let s = calculate_suggestion(&prices);
        prop_assert!(s.min_price <= s.suggested_price);
        prop_assert!(s.suggested_price <= s.max_price);
        prop_assert!(s.min_price <= s.median_price && s.median_price <= s.max_price);
        prop_assert!(s.min_price <= s.average_price && s.average_price <= s.max_price);
    }

    #[test]
    fn huge_prices_stay_within_observed_range(prices in prop::collection::vec(huge_price(), 1..20)) {
        let s = calculate_suggestion(&prices);
        prop_assert!(s.min_price <= s.average_price && s.average_price <= s.max_price);
        prop_assert!(s.min_price <= s.median_price && s.median_price <= s.max_price);
        prop_assert!(s.min_price <= s.suggested_price && s.suggested_price <= s.max_price);
    }

    #[test]
    fn input_order_does_not_matter(
        (prices, shuffled) in prop::collection::vec(price(), 0..40)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        prop_assert_eq!(calculate_suggestion(&prices), calculate_suggestion(&shuffled));
    }

    #[test]
    fn total_listings_matches_input_length(prices in prop::collection::vec(price(), 0..80)) {
        prop_assert_eq!(calculate_suggestion(&prices).total_listings, prices.len());
    }
}
