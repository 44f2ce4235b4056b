//! Period resolution: which date window does a question refer to?
//!
//! Questions may name a month explicitly ("qual o faturamento em maio de
//! 2018?"); otherwise the caller-selected window applies. Comparative
//! metrics look one window back via [`Window::previous`].
//!
//! # Example
//!
//! ```ignore
//! use botdash::query::period::{resolve, Window};
//!
//! let ui = Window::year(2018).unwrap();
//! let resolved = resolve("qual o ticket médio em maio de 2018?", ui);
//! assert!(resolved.from_question);
//! ```

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::format::MONTH_NAMES;

/// Matches "<month name> de <4-digit year>" in lowercased question text.
static PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    let months = MONTH_NAMES.join("|");
    Regex::new(&format!(r"({months}) de (\d{{4}})")).expect("month pattern is valid")
});

/// Inclusive date window: both `start` and `end` are part of the period.
///
/// Invariant: `start <= end`. Constructors uphold it; the CLI validates
/// user-supplied bounds before building one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "window start after end");
        Self { start, end }
    }

    /// Full calendar month, leap-aware.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self::new(start, next_month.pred_opt()?))
    }

    /// Full calendar year.
    pub fn year(year: i32) -> Option<Self> {
        Some(Self::new(
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        ))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Inclusive length in days (a single-day window has length 1).
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The immediately preceding window of equal length.
    ///
    /// Ends one day before `start` and spans the same number of days. For a
    /// calendar month this is NOT the previous calendar month, it is the
    /// same day count shifted back.
    pub fn previous(&self) -> Self {
        let prev_end = self.start - Duration::days(1);
        let prev_start = prev_end - (self.end - self.start);
        Self::new(prev_start, prev_end)
    }
}

/// A window plus where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedWindow {
    pub window: Window,
    /// True when the period was named in the question text.
    pub from_question: bool,
}

/// Pull a "<month> de <year>" period out of question text, if present.
///
/// Matching is case-insensitive and the first occurrence wins. The year is
/// taken as written; a period outside the dataset range simply yields an
/// empty subset downstream.
pub fn extract_window(question: &str) -> Option<Window> {
    let question = question.to_lowercase();
    let caps = PERIOD_RE.captures(&question)?;
    let name = caps.get(1)?.as_str();
    let month = MONTH_NAMES.iter().position(|m| *m == name)? as u32 + 1;
    let year: i32 = caps.get(2)?.as_str().parse().ok()?;
    Window::month(year, month)
}

/// Resolve the effective window for a question: the period named in the
/// text when there is one, the caller's window otherwise.
pub fn resolve(question: &str, ui_window: Window) -> ResolvedWindow {
    match extract_window(question) {
        Some(window) => ResolvedWindow {
            window,
            from_question: true,
        },
        None => ResolvedWindow {
            window: ui_window,
            from_question: false,
        },
    }
}
