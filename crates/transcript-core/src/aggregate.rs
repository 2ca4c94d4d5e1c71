//! Term and cumulative averages.
//!
//! A term average is the credit-weighted mean grade-point of its items.
//! The cumulative average is the plain mean of the stored term averages,
//! not re-weighted by credits across terms.

use transcript_state::{Item, Term};

/// Credit-weighted mean over `(credits, grade_point)` pairs. Pairs with zero
/// credits contribute nothing; no qualifying pairs yields `0.0`.
pub fn weighted_average<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (u32, u8)>,
{
    let (points, credits) = pairs
        .into_iter()
        .filter(|(credits, _)| *credits > 0)
        .fold((0u64, 0u64), |(points, credits), (c, p)| {
            (points + u64::from(c) * u64::from(p), credits + u64::from(c))
        });

    if credits == 0 {
        0.0
    } else {
        points as f64 / credits as f64
    }
}

/// Average of a term's items that carry a grade-point.
pub fn term_average(items: &[Item]) -> f64 {
    weighted_average(
        items
            .iter()
            .filter_map(|item| item.grade_point.map(|p| (item.credits, p))),
    )
}

/// Unweighted mean of each term's stored average; `0.0` for no terms.
pub fn cumulative_average(terms: &[Term]) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    terms.iter().map(|t| t.average).sum::<f64>() / terms.len() as f64
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
