//! Question answering.
//!
//! `period` finds the window a question talks about, `regions` scopes it
//! geographically, `metrics` computes the numbers and `engine` ties them
//! together behind an ordered keyword rule chain.

pub mod engine;
pub mod metrics;
pub mod period;
pub mod regions;
