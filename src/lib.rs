//! Keyword-driven sales analytics over a Brazilian e-commerce order export.
//!
//! The crate loads one denormalized CSV of orders into an immutable
//! in-memory table, then answers Portuguese questions about it ("qual o
//! faturamento em maio de 2018?") by resolving the period the question
//! names, scoping by region and walking an ordered keyword rule chain.
//! A small report layer renders dashboard cuts from the same table.
//!
//! # Example
//! ```ignore
//! use std::path::Path;
//!
//! let data = botdash::dataset::Dataset::load(Path::new("orders.csv"))?;
//! let window = data.date_range().expect("non-empty dataset");
//! let answer = botdash::query::engine::answer(&data, "qual o ticket médio?", window);
//! println!("{}", answer.text);
//! ```

pub mod cli;
pub mod config;
pub mod dataset;
pub mod format;
pub mod query;
pub mod report;

#[cfg(test)]
pub(crate) mod testutil;

use anyhow::Result;

/// Entry point used by the `botdash` binary.
pub fn run() -> Result<()> {
    cli::run()
}
