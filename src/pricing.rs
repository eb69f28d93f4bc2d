//! Resale price suggestion over comparable listing prices.
//!
//! The suggestion sits 5% under the median of the observed prices, never
//! above 90% of the most expensive listing and never below the cheapest
//! one. Everything is computed in fixed-point decimal and rounded half-up
//! to cents only when the result is produced.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::models::{Listing, PriceSuggestion};

/// Multiplier applied to the median to undercut comparable listings.
pub const MEDIAN_DISCOUNT: Decimal = dec!(0.95);

/// Fraction of the highest observed price the suggestion may not exceed.
pub const CEILING_RATIO: Decimal = dec!(0.9);

/// Compute the price suggestion for a set of observed prices.
///
/// Input order does not matter. An empty slice yields
/// [`PriceSuggestion::empty`]. Negative prices are not rejected.
pub fn calculate_suggestion(prices: &[Decimal]) -> PriceSuggestion {
    if prices.is_empty() {
        return PriceSuggestion::empty();
    }

    let mut sorted = prices.to_vec();
    sorted.sort();

    let min_price = sorted[0];
    let max_price = sorted[sorted.len() - 1];
    let average_price = mean(&sorted);
    let median_price = median(&sorted);

    // The floor is applied last: with a single listing (or a tight band)
    // max * 0.9 drops below min and the cheapest price must still win.
    let suggested_price = (median_price * MEDIAN_DISCOUNT)
        .min(max_price * CEILING_RATIO)
        .max(min_price);

    PriceSuggestion {
        min_price: to_money(min_price),
        max_price: to_money(max_price),
        average_price: to_money(average_price),
        median_price: to_money(median_price),
        suggested_price: to_money(suggested_price),
        total_listings: prices.len(),
    }
}

/// Apply [`calculate_suggestion`] to the prices of the given listings.
pub fn suggest_for_listings(listings: &[Listing]) -> PriceSuggestion {
    let prices: Vec<Decimal> = listings.iter().map(|l| l.price).collect();
    calculate_suggestion(&prices)
}

/// Round half-up to cents and pin the scale so `19` prints as `19.00`.
pub fn to_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn mean(sorted: &[Decimal]) -> Decimal {
    let total = sorted
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p));
    match total {
        Some(total) => total / Decimal::from(sorted.len()),
        None => running_mean(sorted),
    }
}

/// Mean without forming the full sum, for inputs whose total overflows.
/// Each step moves the mean towards the next (larger or equal) price, so it
/// never leaves `[min, max]`.
fn running_mean(sorted: &[Decimal]) -> Decimal {
    let mut mean = sorted[0];
    for (i, price) in sorted.iter().enumerate().skip(1) {
        let k = Decimal::from(i + 1);
        let step = match price.checked_sub(mean) {
            Some(diff) => diff / k,
            None => *price / k - mean / k,
        };
        mean += step;
    }
    mean
}

fn midpoint(low: Decimal, high: Decimal) -> Decimal {
    match high.checked_sub(low) {
        Some(diff) => low + diff / Decimal::TWO,
        None => low / Decimal::TWO + high / Decimal::TWO,
    }
}

fn median(sorted: &[Decimal]) -> Decimal {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        midpoint(sorted[mid - 1], sorted[mid])
    }
}
