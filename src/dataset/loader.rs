//! CSV ingestion for the storefront's order export.
//!
//! One pass over the file: rows deserialize into the raw export shape, each
//! is normalized into an [`OrderRecord`] with its derived columns, and rows
//! that cannot be parsed are skipped with a warning instead of failing the
//! whole load. File-level problems (unreadable file, missing columns) are
//! fatal.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{DatasetError, LoadStats, OrderRecord};
use crate::format;

/// Columns the export must provide. Extra columns are ignored.
const REQUIRED_COLUMNS: [&str; 14] = [
    "order_id",
    "customer_id",
    "customer_state",
    "customer_city",
    "seller_id",
    "product_category_name_english",
    "payment_value",
    "payment_type",
    "price",
    "freight_value",
    "review_score",
    "order_purchase_timestamp",
    "order_delivered_customer_date",
    "order_estimated_delivery_date",
];

/// Raw row as exported. Normalization lives in `build_record`.
#[derive(Debug, Deserialize)]
struct CsvRow {
    order_id: String,
    customer_id: String,
    customer_state: String,
    customer_city: String,
    seller_id: String,
    #[serde(default)]
    product_category_name_english: Option<String>,
    payment_value: f64,
    payment_type: String,
    price: f64,
    freight_value: f64,
    #[serde(default)]
    review_score: Option<f64>,
    order_purchase_timestamp: String,
    #[serde(default)]
    order_delivered_customer_date: Option<String>,
    #[serde(default)]
    order_estimated_delivery_date: Option<String>,
}

/// Load records from a CSV file on disk.
pub fn load_csv(path: &Path) -> Result<(Vec<OrderRecord>, LoadStats), DatasetError> {
    let file = File::open(path)?;
    read_records(BufReader::new(file))
}

/// Load records from any CSV reader.
pub fn read_records<R: Read>(input: R) -> Result<(Vec<OrderRecord>, LoadStats), DatasetError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);

    // Some exports prefix the first header with a UTF-8 BOM.
    let headers = reader.headers()?.clone();
    let mut cleaned = csv::StringRecord::new();
    for (i, name) in headers.iter().enumerate() {
        if i == 0 {
            cleaned.push_field(name.trim_start_matches('\u{feff}'));
        } else {
            cleaned.push_field(name);
        }
    }
    reader.set_headers(cleaned.clone());

    for column in REQUIRED_COLUMNS {
        if !cleaned.iter().any(|h| h == column) {
            return Err(DatasetError::MissingColumn(column.to_string()));
        }
    }

    let mut records = Vec::new();
    let mut stats = LoadStats::default();
    for (idx, row) in reader.deserialize::<CsvRow>().enumerate() {
        stats.rows_read += 1;
        let line = idx + 2;
        match row {
            Ok(raw) => match build_record(raw, line) {
                Some(record) => records.push(record),
                None => stats.rows_skipped += 1,
            },
            Err(err) => {
                warn!(line, %err, "skipping malformed row");
                stats.rows_skipped += 1;
            }
        }
    }
    Ok((records, stats))
}

fn build_record(row: CsvRow, line: usize) -> Option<OrderRecord> {
    let Some(purchased_at) = parse_datetime(&row.order_purchase_timestamp) else {
        warn!(
            line,
            value = %row.order_purchase_timestamp,
            "skipping row with unparsable purchase timestamp"
        );
        return None;
    };
    let delivered_at = parse_optional(
        row.order_delivered_customer_date.as_deref(),
        "order_delivered_customer_date",
        line,
    );
    let estimated_delivery = parse_optional(
        row.order_estimated_delivery_date.as_deref(),
        "order_estimated_delivery_date",
        line,
    );

    let purchase_date = purchased_at.date();
    Some(OrderRecord {
        order_id: row.order_id,
        customer_id: row.customer_id,
        customer_state: row.customer_state.to_uppercase(),
        customer_city: row.customer_city,
        seller_id: row.seller_id,
        category: row
            .product_category_name_english
            .filter(|c| !c.is_empty()),
        payment_value: row.payment_value,
        payment_type: row.payment_type,
        price: row.price,
        freight_value: row.freight_value,
        review_score: row.review_score,
        purchased_at,
        delivered_at,
        estimated_delivery,
        delivery_days: delivered_at.map(|d| (d - purchased_at).num_days()),
        month_key: format::month_key(purchase_date),
        weekday: purchase_date.weekday(),
    })
}

/// Parse a timestamp in any of the export's shapes.
fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Optional timestamp cell: empty means missing, unparsable is coerced to
/// missing (logged) so one bad cell never drops the row.
fn parse_optional(raw: Option<&str>, column: &str, line: usize) -> Option<NaiveDateTime> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match parse_datetime(raw) {
        Some(ts) => Some(ts),
        None => {
            debug!(line, column, value = %raw, "ignoring unparsable timestamp cell");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    const HEADER: &str = "order_id,customer_id,customer_state,customer_city,seller_id,\
product_category_name_english,payment_value,payment_type,price,freight_value,review_score,\
order_purchase_timestamp,order_delivered_customer_date,order_estimated_delivery_date";

    fn csv_with(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn parses_a_complete_row_with_derived_columns() {
        let data = csv_with(&[
            "o1,c1,SP,sao paulo,s1,toys,120.50,credit_card,100.00,20.50,5,\
2018-05-10 14:30:00,2018-05-20 10:00:00,2018-05-25 00:00:00",
        ]);
        let (records, stats) = read_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(stats.rows_read, 1);
        assert_eq!(stats.rows_skipped, 0);

        let r = &records[0];
        assert_eq!(r.order_id, "o1");
        assert_eq!(r.customer_state, "SP");
        assert_eq!(r.category.as_deref(), Some("toys"));
        assert_eq!(r.payment_value, 120.50);
        assert_eq!(r.review_score, Some(5.0));
        assert_eq!(r.delivery_days, Some(9));
        assert_eq!(r.month_key, "2018-05");
        assert_eq!(r.weekday, Weekday::Thu);
        assert_eq!(r.is_late(), Some(false));
    }

    #[test]
    fn empty_optional_cells_become_none() {
        let data = csv_with(&[
            "o1,c1,sp,sao paulo,s1,,99.90,boleto,80.00,19.90,,2017-11-24 08:00:00,,",
        ]);
        let (records, _) = read_records(data.as_bytes()).unwrap();
        let r = &records[0];
        assert_eq!(r.category, None);
        assert_eq!(r.review_score, None);
        assert_eq!(r.delivered_at, None);
        assert_eq!(r.delivery_days, None);
        assert_eq!(r.customer_state, "SP");
    }

    #[test]
    fn date_only_timestamps_are_accepted() {
        let data = csv_with(&[
            "o1,c1,RJ,rio,s1,toys,50.00,voucher,40.00,10.00,4,2018-01-15,2018-01-20,2018-01-25",
        ]);
        let (records, _) = read_records(data.as_bytes()).unwrap();
        assert_eq!(records[0].delivery_days, Some(5));
    }

    #[test]
    fn malformed_rows_are_skipped_and_counted() {
        let data = csv_with(&[
            "o1,c1,SP,sao paulo,s1,toys,not_a_number,credit_card,100.00,20.50,5,\
2018-05-10 14:30:00,,",
            "o2,c2,SP,sao paulo,s1,toys,80.00,credit_card,70.00,10.00,4,not_a_date,,",
            "o3,c3,SP,sao paulo,s1,toys,60.00,credit_card,50.00,10.00,3,2018-05-12 09:00:00,,",
        ]);
        let (records, stats) = read_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].order_id, "o3");
        assert_eq!(stats.rows_read, 3);
        assert_eq!(stats.rows_skipped, 2);
    }

    #[test]
    fn bom_on_first_header_is_tolerated() {
        let data = format!("\u{feff}{}", csv_with(&[
            "o1,c1,SP,sao paulo,s1,toys,10.00,credit_card,8.00,2.00,5,2018-05-10 14:30:00,,",
        ]));
        let (records, _) = read_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let data = "order_id,customer_id\no1,c1";
        let err = read_records(data.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(ref c) if c == "customer_state"));
    }

    #[test]
    fn unparsable_optional_timestamp_is_coerced_to_missing() {
        let data = csv_with(&[
            "o1,c1,SP,sao paulo,s1,toys,10.00,credit_card,8.00,2.00,5,\
2018-05-10 14:30:00,garbage,2018-05-25 00:00:00",
        ]);
        let (records, stats) = read_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(stats.rows_skipped, 0);
        assert_eq!(records[0].delivered_at, None);
    }
}
