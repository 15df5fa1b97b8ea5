//! Declarative matrix descriptions.
//!
//! A `matrix.toml` describes variants and targets as data. Loading it checks
//! everything (compiler selectors, optimization levels, source kinds,
//! `$VAR` references) before a [`Setup`](crate::matrix::Setup) is returned.

mod types;

pub use types::*;
