//! Error types for problem construction, algorithm configuration and data loading.
//!
//! Configuration errors are detected before any search starts. An infeasible
//! instance is not an error: the run completes and the result says so.

use thiserror::Error;

/// Invalid problem data or algorithm parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("the product catalog is empty")]
    EmptyCatalog,

    #[error("product {index} ({name}): field `{field}` must be finite and non-negative, got {value}")]
    InvalidProduct {
        index: usize,
        name: String,
        field: &'static str,
        value: f64,
    },

    #[error("limit `{field}` must be finite, got {value}")]
    InvalidLimit { field: &'static str, value: f64 },

    #[error("product {index} ({name}): {headroom} orderable units exceed the largest searchable range of {limit}")]
    HeadroomTooLarge {
        index: usize,
        name: String,
        headroom: u32,
        limit: u32,
    },

    #[error("parameter `{name}` is out of range: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Failure while reading product records from a CSV source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column mapping for `{0}` is empty")]
    EmptyMapping(&'static str),

    #[error("row {row}, column `{column}`: cannot parse {value:?} as a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
}
