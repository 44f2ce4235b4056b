//! Aggregate primitives over a filtered record subset.
//!
//! Every function takes the subset explicitly and is total: empty input or
//! all-missing columns come back as `None` (or 0 for plain counts), never a
//! NaN or a division by zero. Missing optional values are skipped, not
//! coerced to zero.
//!
//! Grouped results iterate in sorted key order and pick maxima with a
//! strict comparison, so ties resolve to the first key deterministically.

use std::collections::{BTreeMap, HashSet};

use chrono::Weekday;

use crate::dataset::OrderRecord;

/// Days of the week in display order.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Total payment value of the subset.
pub fn revenue(rows: &[&OrderRecord]) -> f64 {
    rows.iter().map(|r| r.payment_value).sum()
}

/// Number of distinct order ids.
pub fn distinct_orders(rows: &[&OrderRecord]) -> u64 {
    rows.iter()
        .map(|r| r.order_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u64
}

/// Number of distinct customer ids.
pub fn distinct_customers(rows: &[&OrderRecord]) -> u64 {
    rows.iter()
        .map(|r| r.customer_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u64
}

/// Revenue per distinct order; 0 when the subset has no orders.
pub fn average_ticket(rows: &[&OrderRecord]) -> f64 {
    let orders = distinct_orders(rows);
    if orders == 0 {
        0.0
    } else {
        revenue(rows) / orders as f64
    }
}

/// Modal product category (by row count) and how many rows it has.
/// None when every row lacks a category.
pub fn top_category(rows: &[&OrderRecord]) -> Option<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in rows {
        if let Some(category) = r.category.as_deref() {
            *counts.entry(category).or_default() += 1;
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (category, n) in counts {
        if best.map_or(true, |(_, bn)| n > bn) {
            best = Some((category, n));
        }
    }
    best.map(|(category, n)| (category.to_string(), n))
}

/// Summed payment value per weekday, in [`WEEK`] order.
pub fn revenue_by_weekday(rows: &[&OrderRecord]) -> [(Weekday, f64); 7] {
    let mut totals = [0.0f64; 7];
    for r in rows {
        totals[r.weekday.num_days_from_monday() as usize] += r.payment_value;
    }
    let mut out = [(Weekday::Mon, 0.0); 7];
    for (i, day) in WEEK.iter().enumerate() {
        out[i] = (*day, totals[i]);
    }
    out
}

/// Weekday with the highest summed payment value.
pub fn best_weekday(rows: &[&OrderRecord]) -> Option<Weekday> {
    if rows.is_empty() {
        return None;
    }
    let mut best: Option<(Weekday, f64)> = None;
    for (day, total) in revenue_by_weekday(rows) {
        if best.map_or(true, |(_, bt)| total > bt) {
            best = Some((day, total));
        }
    }
    best.map(|(day, _)| day)
}

/// Mean delivery time in days over delivered rows only.
pub fn mean_delivery_days(rows: &[&OrderRecord]) -> Option<f64> {
    mean(rows.iter().filter_map(|r| r.delivery_days.map(|d| d as f64)))
}

/// Mean freight value; None on an empty subset.
pub fn mean_freight(rows: &[&OrderRecord]) -> Option<f64> {
    mean(rows.iter().map(|r| r.freight_value))
}

/// Mean review score over scored rows; None when nothing is scored.
pub fn mean_review(rows: &[&OrderRecord]) -> Option<f64> {
    mean(rows.iter().filter_map(|r| r.review_score))
}

/// Share of delivered orders that arrived after the estimate, as a
/// percentage. Undelivered rows stay out of numerator and denominator;
/// None when nothing was delivered.
pub fn late_delivery_rate(rows: &[&OrderRecord]) -> Option<f64> {
    let mut delivered = 0usize;
    let mut late = 0usize;
    for r in rows {
        if let Some(is_late) = r.is_late() {
            delivered += 1;
            if is_late {
                late += 1;
            }
        }
    }
    (delivered > 0).then(|| late as f64 / delivered as f64 * 100.0)
}

/// Mean delivery days per customer state, slowest first.
pub fn mean_delivery_by_state(rows: &[&OrderRecord]) -> Vec<(String, f64)> {
    state_means(rows, |r| r.delivery_days.map(|d| d as f64))
}

/// Mean freight per customer state, highest first.
pub fn mean_freight_by_state(rows: &[&OrderRecord]) -> Vec<(String, f64)> {
    state_means(rows, |r| Some(r.freight_value))
}

/// State with the highest mean delivery time, with the mean.
pub fn slowest_state(rows: &[&OrderRecord]) -> Option<(String, f64)> {
    mean_delivery_by_state(rows).into_iter().next()
}

/// Percentage change from `previous` to `current`; None when there is no
/// positive base to compare against.
pub fn percent_delta(current: f64, previous: f64) -> Option<f64> {
    (previous > 0.0).then(|| (current - previous) / previous * 100.0)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v;
        n += 1;
    }
    (n > 0).then(|| sum / n as f64)
}

fn state_means(
    rows: &[&OrderRecord],
    value: impl Fn(&OrderRecord) -> Option<f64>,
) -> Vec<(String, f64)> {
    let mut acc: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in rows {
        if let Some(v) = value(r) {
            let entry = acc.entry(r.customer_state.as_str()).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }
    let mut means: Vec<(String, f64)> = acc
        .into_iter()
        .map(|(state, (sum, n))| (state.to_string(), sum / n as f64))
        .collect();
    // Stable sort keeps alphabetical order among equal means.
    means.sort_by(|a, b| b.1.total_cmp(&a.1));
    means
}
