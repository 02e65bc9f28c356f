//! Measurement Contexts
//!
//! Connects the statement builder to a running InfluxDB:
//!
//! - **Executor**: the `QueryExecutor` seam and its schema statements
//! - **Client**: the HTTP implementation of that seam
//! - **SerieContext**: one measurement's descriptor plus preconfigured builders
//! - **Paging**: count-then-fetch pages over a context
//! - **Factory**: cached measurement lookup for one database
//!
//! ## Data Flow
//!
//! 1. The factory lists measurements and reads field and tag keys
//! 2. A context hands out builders with fields and time zone filled in
//! 3. Rendered statements go through the executor
//! 4. Result sets come back as `Serie`s for materialization or JSON output

mod client;
mod error;
mod executor;
mod factory;
mod paging;
mod serie_context;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientError, ClientResult, InfluxClient};
pub use error::{ContextError, ContextResult};
pub use executor::{quote_identifier, QueryExecutor};
pub use factory::{FactoryOptions, SerieContextFactory};
pub use serie_context::{MeasurementInfo, SerieContext};
