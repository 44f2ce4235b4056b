//! In-memory order dataset.
//!
//! One immutable table of order records loaded from the storefront's CSV
//! export. Every query runs against a filtered view of this table; nothing
//! here mutates after load.
//!
//! Records carry three derived columns computed at ingestion:
//! - `delivery_days`: whole days between purchase and delivery (None while
//!   undelivered)
//! - `month_key`: `YYYY-MM` of the purchase, the monthly grouping key
//! - `weekday`: purchase day of week
//!
//! # Example
//!
//! ```ignore
//! use botdash::dataset::{Dataset, RecordFilter};
//! use botdash::query::period::Window;
//!
//! let data = Dataset::load("dataset_olist_final_limpo.csv".as_ref())?;
//! let window = data.date_range().unwrap();
//! let rows = data.select(&RecordFilter::window(window));
//! ```

pub mod loader;

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::query::period::Window;

/// Errors that make a dataset unusable. Row-level problems are not errors;
/// they are skipped and counted in [`LoadStats`].
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("dataset contains no usable rows")]
    Empty,
}

/// One order line, normalized from the CSV export.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    /// Two-letter federative unit code (uppercased at load).
    pub customer_state: String,
    pub customer_city: String,
    pub seller_id: String,
    /// Product category slug; None when the export left it blank.
    pub category: Option<String>,
    pub payment_value: f64,
    pub payment_type: String,
    pub price: f64,
    pub freight_value: f64,
    pub review_score: Option<f64>,
    pub purchased_at: NaiveDateTime,
    pub delivered_at: Option<NaiveDateTime>,
    pub estimated_delivery: Option<NaiveDateTime>,
    pub delivery_days: Option<i64>,
    pub month_key: String,
    pub weekday: Weekday,
}

impl OrderRecord {
    pub fn purchase_date(&self) -> NaiveDate {
        self.purchased_at.date()
    }

    /// Whether the order arrived after its estimated date.
    ///
    /// None while undelivered (such orders stay out of late-rate math
    /// entirely). A delivered order with no estimate counts as on time.
    pub fn is_late(&self) -> Option<bool> {
        let delivered = self.delivered_at?;
        Some(match self.estimated_delivery {
            Some(estimated) => delivered > estimated,
            None => false,
        })
    }
}

/// Counters from one load pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LoadStats {
    /// Data rows seen in the file (header excluded).
    pub rows_read: usize,
    /// Rows dropped because they could not be parsed.
    pub rows_skipped: usize,
}

/// Summary counts for the `info` command.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStats {
    pub rows: usize,
    pub rows_skipped: usize,
    pub orders: usize,
    pub customers: usize,
    pub states: usize,
    pub categories: usize,
    pub first_purchase: Option<NaiveDate>,
    pub last_purchase: Option<NaiveDate>,
}

/// Filter describing one working subset: a date window plus optional
/// geographic and seller restrictions.
#[derive(Debug, Clone, Copy)]
pub struct RecordFilter<'a> {
    pub window: Window,
    /// Restrict to customers in these states (a region's member list).
    pub states: Option<&'a [&'a str]>,
    /// Restrict to one seller's orders.
    pub seller: Option<&'a str>,
}

impl<'a> RecordFilter<'a> {
    pub fn window(window: Window) -> Self {
        Self {
            window,
            states: None,
            seller: None,
        }
    }

    pub fn with_states(mut self, states: &'a [&'a str]) -> Self {
        self.states = Some(states);
        self
    }

    pub fn with_seller(mut self, seller: &'a str) -> Self {
        self.seller = Some(seller);
        self
    }

    pub fn matches(&self, record: &OrderRecord) -> bool {
        if !self.window.contains(record.purchase_date()) {
            return false;
        }
        if let Some(states) = self.states {
            if !states.contains(&record.customer_state.as_str()) {
                return false;
            }
        }
        if let Some(seller) = self.seller {
            if record.seller_id != seller {
                return false;
            }
        }
        true
    }
}

/// The immutable order table.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<OrderRecord>,
    load_stats: LoadStats,
}

impl Dataset {
    /// Load from a CSV export. Fails on an unreadable file, missing
    /// required columns, or zero usable rows.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let (records, load_stats) = loader::load_csv(path)?;
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        info!(
            path = %path.display(),
            rows = records.len(),
            skipped = load_stats.rows_skipped,
            "dataset loaded"
        );
        Ok(Self {
            records,
            load_stats,
        })
    }

    /// Wrap already-materialized records (tests, benches).
    pub fn from_records(records: Vec<OrderRecord>) -> Self {
        let load_stats = LoadStats {
            rows_read: records.len(),
            rows_skipped: 0,
        };
        Self {
            records,
            load_stats,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn load_stats(&self) -> LoadStats {
        self.load_stats
    }

    /// All records passing the filter, in file order.
    pub fn select(&self, filter: &RecordFilter<'_>) -> Vec<&OrderRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    /// Purchase-date span of the whole table; the default UI window.
    pub fn date_range(&self) -> Option<Window> {
        let first = self.records.iter().map(|r| r.purchase_date()).min()?;
        let last = self.records.iter().map(|r| r.purchase_date()).max()?;
        Some(Window::new(first, last))
    }

    pub fn stats(&self) -> DatasetStats {
        let mut orders = std::collections::HashSet::new();
        let mut customers = std::collections::HashSet::new();
        let mut states = std::collections::HashSet::new();
        let mut categories = std::collections::HashSet::new();
        for r in &self.records {
            orders.insert(r.order_id.as_str());
            customers.insert(r.customer_id.as_str());
            states.insert(r.customer_state.as_str());
            if let Some(cat) = &r.category {
                categories.insert(cat.as_str());
            }
        }
        let range = self.date_range();
        DatasetStats {
            rows: self.records.len(),
            rows_skipped: self.load_stats.rows_skipped,
            orders: orders.len(),
            customers: customers.len(),
            states: states.len(),
            categories: categories.len(),
            first_purchase: range.map(|w| w.start),
            last_purchase: range.map(|w| w.end),
        }
    }
}

static DATASET: OnceCell<Dataset> = OnceCell::new();

/// Load the process-wide dataset once. Later calls return the cached table;
/// the path of the first successful call wins.
pub fn init(path: &Path) -> Result<&'static Dataset, DatasetError> {
    DATASET.get_or_try_init(|| Dataset::load(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::base_order;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn filter_by_window_is_inclusive() {
        let records = vec![
            base_order("a", "2018-05-01 10:00:00", 10.0),
            base_order("b", "2018-05-31 23:59:00", 20.0),
            base_order("c", "2018-06-01 00:00:00", 30.0),
        ];
        let data = Dataset::from_records(records);
        let window = Window::month(2018, 5).unwrap();
        let rows = data.select(&RecordFilter::window(window));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn filter_by_states_and_seller() {
        let mut a = base_order("a", "2018-05-01 10:00:00", 10.0);
        a.customer_state = "BA".to_string();
        a.seller_id = "s1".to_string();
        let mut b = base_order("b", "2018-05-02 10:00:00", 20.0);
        b.customer_state = "SP".to_string();
        b.seller_id = "s1".to_string();
        let mut c = base_order("c", "2018-05-03 10:00:00", 30.0);
        c.customer_state = "BA".to_string();
        c.seller_id = "s2".to_string();
        let data = Dataset::from_records(vec![a, b, c]);
        let window = Window::month(2018, 5).unwrap();

        let nordeste = ["MA", "PI", "CE", "RN", "PB", "PE", "AL", "SE", "BA"];
        let rows = data.select(&RecordFilter::window(window).with_states(&nordeste));
        assert_eq!(rows.len(), 2);

        let rows = data.select(
            &RecordFilter::window(window)
                .with_states(&nordeste)
                .with_seller("s1"),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_id, "a");
    }

    #[test]
    fn unknown_state_is_outside_every_region_filter() {
        let mut odd = base_order("x", "2018-05-01 08:00:00", 5.0);
        odd.customer_state = "XX".to_string();
        let data = Dataset::from_records(vec![odd]);
        let window = Window::month(2018, 5).unwrap();
        for region in &crate::query::regions::REGIONS {
            let rows = data.select(&RecordFilter::window(window).with_states(region.states));
            assert!(rows.is_empty());
        }
    }

    #[test]
    fn date_range_spans_min_to_max_purchase() {
        let records = vec![
            base_order("a", "2017-03-10 10:00:00", 10.0),
            base_order("b", "2018-06-20 10:00:00", 20.0),
            base_order("c", "2017-01-05 10:00:00", 30.0),
        ];
        let data = Dataset::from_records(records);
        let range = data.date_range().unwrap();
        assert_eq!(range.start, date(2017, 1, 5));
        assert_eq!(range.end, date(2018, 6, 20));
    }

    #[test]
    fn is_late_excludes_undelivered() {
        let mut r = base_order("a", "2018-05-01 10:00:00", 10.0);
        r.delivered_at = None;
        assert_eq!(r.is_late(), None);

        r.delivered_at = Some("2018-05-20T00:00:00".parse().unwrap());
        r.estimated_delivery = Some("2018-05-10T00:00:00".parse().unwrap());
        assert_eq!(r.is_late(), Some(true));

        r.estimated_delivery = Some("2018-05-25T00:00:00".parse().unwrap());
        assert_eq!(r.is_late(), Some(false));

        r.estimated_delivery = None;
        assert_eq!(r.is_late(), Some(false));
    }

    #[test]
    fn stats_count_distincts() {
        let mut a = base_order("o1", "2018-05-01 10:00:00", 10.0);
        a.customer_id = "c1".to_string();
        let mut b = base_order("o1", "2018-05-01 10:05:00", 15.0);
        b.customer_id = "c1".to_string();
        let mut c = base_order("o2", "2018-05-02 10:00:00", 20.0);
        c.customer_id = "c2".to_string();
        c.category = None;
        let data = Dataset::from_records(vec![a, b, c]);
        let stats = data.stats();
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.orders, 2);
        assert_eq!(stats.customers, 2);
        assert_eq!(stats.categories, 1);
    }
}
