//! InfluxQL Query Construction
//!
//! Builds InfluxQL statements incrementally and renders them on demand:
//!
//! - **Builder**: fields, source, predicates, ordering, grouping, fill, time zone
//! - **Time**: instant literals, time-range predicates, duration literals
//! - **Error**: construction errors raised while rendering
//!
//! # Rendered Layout
//!
//! ```text
//! SELECT <fields|*> \n\tFROM <table> [\n\tWHERE ...] [\n\tORDER BY ...]
//!     [\n\tGROUP BY ... [FILL(v)]] [  LIMIT n OFFSET m] [ tz('zone')]
//! ```
//!
//! # Examples
//!
//! ```rust
//! use chrono::Duration;
//! use influx_series::query::QueryBuilder;
//!
//! let builder = QueryBuilder::with_fields(["MEAN(speed) AS speed"], "ShipTrack")
//!     .start_duration(Duration::hours(6))
//!     .group_by_duration(Duration::minutes(30))
//!     .fill_previous();
//!
//! let page = builder.to_limit_and_offset(100, 0).unwrap();
//! let count = builder.to_count().unwrap();
//! # let _ = (page, count);
//! ```

mod builder;
mod error;
mod time;

pub use builder::{Direction, Literal, QueryBuilder};
pub use error::{QueryError, QueryResult};
pub use time::{
    date_where_clause, format_duration_literal, format_instant_literal, format_interval_literal,
    last_where_clause, last_where_clause_exclusive, offset_where_clause, range_where_clause,
    range_where_clause_exclusive, start_time_where_clause, Bounds,
};
