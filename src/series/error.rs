//! Materialization error types

use crate::series::convert::ConvertError;
use thiserror::Error;

/// Errors raised while turning result sets into typed rows or JSON
#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Failed to set member '{member}': {source}")]
    Convert {
        member: String,
        #[source]
        source: ConvertError,
    },

    #[error("Column mismatch: {names} column names but a row has {values} values")]
    ColumnMismatch { names: usize, values: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MaterializeResult<T> = Result<T, MaterializeError>;
