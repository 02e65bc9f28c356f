//! Tabular result types
//!
//! - `Serie`: one result set (column names, shared tags, rows of untyped values)
//! - `Paging` and `PageResult`: a page of results with accurate totals
//! - `Segment`: a counted time window

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// An untyped scalar as returned by InfluxDB
pub type Value = serde_json::Value;

/// One result set returned by a statement
///
/// Rows are aligned 1:1 with `columns`. Tags hold the group-by dimensions
/// shared by every row of the set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Serie {
    /// Measurement name
    #[serde(default)]
    pub name: String,
    /// Tag key/value pairs shared by all rows
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Column names
    #[serde(default)]
    pub columns: Vec<String>,
    /// Rows of values, one per column
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl Serie {
    /// Create an empty serie with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Builder method: set the measurement name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder method: add a tag
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Builder method: append a row
    pub fn row(mut self, values: Vec<Value>) -> Self {
        self.values.push(values);
        self
    }

    /// Case-insensitive column lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no rows
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Page parameters and totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// 1-based page number
    pub page: usize,
    /// Rows per page
    pub page_size: usize,
    /// Total rows matched, filled in by the count query
    #[serde(default)]
    pub total: usize,
}

impl Paging {
    /// Default page size substituted for an invalid one
    pub const DEFAULT_PAGE_SIZE: usize = 10;

    /// Create page parameters, normalizing invalid input.
    ///
    /// `page < 1` becomes 1 while `page_size < 1` becomes
    /// [`DEFAULT_PAGE_SIZE`](Self::DEFAULT_PAGE_SIZE), not 1.
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = if page < 1 { 1 } else { page as usize };
        let page_size = if page_size < 1 {
            Self::DEFAULT_PAGE_SIZE
        } else {
            page_size as usize
        };
        Self {
            page,
            page_size,
            total: 0,
        }
    }

    /// Apply the same normalization as [`Paging::new`] to a hand-built value
    pub fn normalize(&mut self) {
        if self.page < 1 {
            self.page = 1;
        }
        if self.page_size < 1 {
            self.page_size = Self::DEFAULT_PAGE_SIZE;
        }
    }

    /// Builder method: set the total
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    /// Number of pages, `ceil(total / page_size)`
    pub fn pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }

    /// Rows to skip before this page
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PAGE_SIZE as i64)
    }
}

impl Serialize for Paging {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Paging", 4)?;
        state.serialize_field("page", &self.page)?;
        state.serialize_field("pages", &self.pages())?;
        state.serialize_field("pageSize", &self.page_size)?;
        state.serialize_field("total", &self.total)?;
        state.end()
    }
}

impl std::fmt::Display for Paging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "page {}/{} (size {}, total {})",
            self.page,
            self.pages(),
            self.page_size,
            self.total
        )
    }
}

/// A page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    /// Page parameters and totals
    pub page: Paging,
    /// The rows of this page
    pub values: Vec<T>,
}

impl<T> PageResult<T> {
    /// Create a page result
    pub fn new(page: Paging, values: Vec<T>) -> Self {
        Self { page, values }
    }
}

/// A time window and the number of rows counted in it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Window start
    pub start: DateTime<Utc>,
    /// Window end
    pub end: DateTime<Utc>,
    /// Rows in the window
    pub count: i64,
}

impl Segment {
    /// Create a segment
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, count: i64) -> Self {
        Self { start, end, count }
    }
}
