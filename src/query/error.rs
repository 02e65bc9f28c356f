//! Query builder error types
//!
//! These are construction errors: the builder state cannot be rendered into a
//! statement. They are never transient and retrying them is pointless.

use thiserror::Error;

/// Errors that can occur while rendering a statement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No source measurement was set with `from`
    #[error("Missing source table: call from() before rendering")]
    MissingTable,

    /// A count statement was requested but no field is known
    #[error("Missing fields: a count statement needs at least one field")]
    MissingFields,

    /// An operation required a non-empty WHERE clause
    #[error("Empty where clause: {0}")]
    EmptyWhereClause(String),
}

/// Result type for query builder operations
pub type QueryResult<T> = Result<T, QueryError>;
