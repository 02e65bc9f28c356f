//! Context error types

use crate::context::client::ClientError;
use crate::query::QueryError;
use crate::series::MaterializeError;
use thiserror::Error;

/// Errors raised by measurement contexts and their factory
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Measurement not found: '{0}'")]
    MeasurementNotFound(String),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Materialize error: {0}")]
    Materialize(#[from] MaterializeError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),
}

pub type ContextResult<T> = Result<T, ContextError>;
