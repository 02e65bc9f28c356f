//! # Influx Series
//!
//! Query construction, paging and result materialization for InfluxDB 1.x
//! measurements.
//!
//! ## Features
//!
//! - **Statement builder**: InfluxQL `SELECT` statements with a fixed clause order
//! - **Paging**: count-then-fetch pages with accurate totals
//! - **Materialization**: result rows into typed values through cached setters
//! - **JSON streaming**: flat row objects with optional name mapping
//!
//! ## Modules
//!
//! - [`query`]: statement builder and time literals
//! - [`series`]: result sets, typed materialization and JSON output
//! - [`context`]: executor seam, HTTP client, measurement contexts and paging
//! - [`config`]: file and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::Duration;
//! use influx_series::config::Config;
//! use influx_series::context::SerieContextFactory;
//! use influx_series::series::write_page_json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let factory = SerieContextFactory::from_config(&config.influxdb)?;
//!
//!     // Measurement names are matched ignoring case
//!     let ships = factory.context("shiptrack").await?;
//!
//!     // Tags first, then every field, in the configured zone
//!     let builder = ships
//!         .build_query(&["MMSI"])
//!         .start_duration(Duration::hours(6))
//!         .order_by_desc(["time"]);
//!
//!     let page = ships.page(&builder, 1, 50).await?;
//!     write_page_json(&page, std::io::stdout().lock(), None)?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod query;
pub mod series;

// Re-export top-level types for convenience
pub use query::{Direction, Literal, QueryBuilder, QueryError, QueryResult};

pub use series::{
    materialize, materialize_all, FromSerie, MaterializeError, MaterializeResult, PageResult,
    Paging, Segment, Serie, Setters,
};

pub use context::{
    ClientError, ContextError, ContextResult, InfluxClient, MeasurementInfo, QueryExecutor,
    SerieContext, SerieContextFactory,
};

pub use config::{Config, ConfigError, InfluxDbConfig, LoggingConfig};
