//! Shared fixtures for unit tests.

use chrono::{Datelike, Duration, NaiveDateTime};

use crate::dataset::OrderRecord;
use crate::format;

/// A plausible delivered-on-time order; tests override the fields they
/// care about. `purchased` is a "%Y-%m-%d %H:%M:%S" timestamp.
pub(crate) fn base_order(order_id: &str, purchased: &str, payment: f64) -> OrderRecord {
    let purchased_at =
        NaiveDateTime::parse_from_str(purchased, "%Y-%m-%d %H:%M:%S").expect("valid timestamp");
    let date = purchased_at.date();
    OrderRecord {
        order_id: order_id.to_string(),
        customer_id: format!("cust_{order_id}"),
        customer_state: "SP".to_string(),
        customer_city: "sao paulo".to_string(),
        seller_id: "seller_1".to_string(),
        category: Some("toys".to_string()),
        payment_value: payment,
        payment_type: "credit_card".to_string(),
        price: payment * 0.8,
        freight_value: payment * 0.2,
        review_score: Some(4.0),
        purchased_at,
        delivered_at: Some(purchased_at + Duration::days(7)),
        estimated_delivery: Some(purchased_at + Duration::days(10)),
        delivery_days: Some(7),
        month_key: format::month_key(date),
        weekday: date.weekday(),
    }
}
