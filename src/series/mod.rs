//! Tabular Results
//!
//! Result sets as returned by InfluxDB and the two ways out of them:
//!
//! - **Materialize**: rows into typed values through a cached per-type setter map
//! - **JSON**: rows streamed as flat objects, optionally wrapped in a page document
//! - **Columns**: single-column extraction and counted time windows

mod columns;
mod convert;
mod error;
mod json;
mod materialize;
mod types;

pub use columns::{column_values, segments, segments_by, COUNT_COLUMN};
pub use convert::{convert, parse_enum, ConvertError, FromValue};
pub use error::{MaterializeError, MaterializeResult};
pub use json::{camel_case, write_json, write_page_json, write_series_json, NameMapper};
pub use materialize::{materialize, materialize_all, setters, FromSerie, Setter, Setters};
pub use types::{PageResult, Paging, Segment, Serie, Value};
