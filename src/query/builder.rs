//! InfluxQL statement builder
//!
//! Accumulates the parts of a `SELECT` statement and renders them on demand.
//! Clause order is fixed:
//!
//! ```text
//! SELECT <fields|*>
//!     FROM <table>
//!     [WHERE <clause> AND <clause> ...]
//!     [ORDER BY <columns> [DESC]]
//!     [GROUP BY <tags|time(...)> [FILL(<value>)]]
//!   [LIMIT n OFFSET m] [tz('<zone>')]
//! ```
//!
//! # Example
//!
//! ```rust
//! use influx_series::query::QueryBuilder;
//!
//! let sql = QueryBuilder::new()
//!     .select(["lat", "lng"])
//!     .from("ShipTrack")
//!     .where_value("MMSI", "=", "413000000")
//!     .time_zone("Asia/Shanghai")
//!     .to_query()
//!     .unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT lat,lng \n\tFROM ShipTrack \n\tWHERE MMSI = '413000000' tz('Asia/Shanghai')"
//! );
//! ```

use crate::query::error::{QueryError, QueryResult};
use crate::query::time::{
    date_where_clause, format_instant_literal, format_interval_literal, last_where_clause,
    start_time_where_clause,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

const CLAUSE_SEPARATOR: &str = " \n\t";

/// Right-hand side of a `column op value` comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Renders as `NULL` and forces the operator to `IS`
    Null,
    /// Quoted RFC3339 instant
    Time(DateTime<Utc>),
    /// Relative instant, `now() - <seconds>s`
    Duration(Duration),
    /// Single-quoted string
    String(String),
    /// Anything else, rendered verbatim
    Raw(String),
}

impl Literal {
    /// Render the literal as it appears in a WHERE clause
    pub fn render(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Time(time) => format_instant_literal(time),
            Self::Duration(span) => {
                let seconds = (span.num_milliseconds() as f64 / 1000.0).round() as i64;
                format!("now() - {}s", seconds)
            }
            Self::String(s) => format!("'{}'", s),
            Self::Raw(s) => s.clone(),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Literal {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Time(value.with_timezone(&Utc))
    }
}

impl From<Duration> for Literal {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

macro_rules! impl_raw_literal {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Literal {
                fn from(value: $ty) -> Self {
                    Self::Raw(value.to_string())
                }
            }
        )*
    };
}

impl_raw_literal!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

/// Sort direction of an ORDER BY column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Builder for InfluxQL `SELECT` statements
///
/// Not meant to be shared between threads while it is being built; one owner
/// builds it and then renders it as many times as needed.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    fields: Vec<String>,
    table: Option<String>,
    where_clauses: Vec<String>,
    order_by: Vec<(String, Direction)>,
    group_by: Vec<String>,
    fill: Option<String>,
    time_zone: Option<String>,
    count_field: Option<String>,
}

impl QueryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with fields and source table already set
    pub fn with_fields<I, S>(fields: I, table: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().select(fields).from(table)
    }

    /// Set the selected fields, replacing any previous selection
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the source measurement
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Field used by [`to_count`](Self::to_count); defaults to the first selected field
    pub fn count_field(mut self, field: impl Into<String>) -> Self {
        self.count_field = Some(field.into());
        self
    }

    /// Append a precomposed clause; clauses are AND-joined when rendered
    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        let clause = clause.into();
        if !clause.trim().is_empty() {
            self.where_clauses.push(clause);
        }
        self
    }

    /// Append `column op value`, quoting the value by its type.
    ///
    /// A null value (`None`) always renders as `column IS NULL`.
    pub fn where_value(self, column: &str, op: &str, value: impl Into<Literal>) -> Self {
        let value = value.into();
        let op = if value == Literal::Null { "IS" } else { op };
        let clause = format!("{} {} {}", column, op, value.render());
        self.where_clause(clause)
    }

    /// Only rows at or after `start`
    pub fn start<Tz: TimeZone>(self, start: &DateTime<Tz>) -> Self {
        self.where_clause(start_time_where_clause(start))
    }

    /// Only rows within the last `duration`
    pub fn start_duration(self, duration: Duration) -> Self {
        self.where_clause(last_where_clause(duration))
    }

    /// Only rows on the UTC day of `date`
    pub fn start_date<Tz: TimeZone>(self, date: &DateTime<Tz>) -> Self {
        self.where_clause(date_where_clause(date, true))
    }

    /// Sort ascending by the given columns
    pub fn order_by<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_order(fields, Direction::Asc)
    }

    /// Sort descending by the given columns
    pub fn order_by_desc<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_order(fields, Direction::Desc)
    }

    fn push_order<I, S>(mut self, fields: I, direction: Direction) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field: String = field.into();
            if !field.is_empty() {
                self.order_by.push((field, direction));
            }
        }
        self
    }

    /// Group by tags; blank names are ignored
    pub fn group_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field: String = field.into();
            if !field.trim().is_empty() {
                self.group_by.push(field);
            }
        }
        self
    }

    /// Group by time buckets of `amount` `unit`, e.g. `group_by_time(5, "m")`
    ///
    /// InfluxDB aligns buckets on preset round boundaries, independent of any
    /// time condition in the WHERE clause.
    pub fn group_by_time(mut self, amount: i64, unit: &str) -> Self {
        self.group_by.push(format!("time({}{})", amount, unit));
        self
    }

    /// Group by time buckets sized from `duration` with a single rounded unit
    pub fn group_by_duration(mut self, duration: Duration) -> Self {
        self.group_by
            .push(format!("time({})", format_interval_literal(duration)));
        self
    }

    /// Fill empty buckets with a number, or with `NULL` when `None`
    pub fn fill(mut self, value: Option<i64>) -> Self {
        self.fill = Some(match value {
            Some(v) => v.to_string(),
            None => "NULL".to_string(),
        });
        self
    }

    /// Fill empty buckets with the previous bucket's value
    pub fn fill_previous(mut self) -> Self {
        self.fill = Some("previous".to_string());
        self
    }

    /// Render results in the given IANA zone, e.g. `Asia/Shanghai`
    pub fn time_zone(mut self, zone: impl Into<String>) -> Self {
        let zone = zone.into();
        self.time_zone = if zone.trim().is_empty() { None } else { Some(zone) };
        self
    }

    /// Use the host zone from the POSIX `TZ` variable.
    ///
    /// Leaves the zone unchanged when `TZ` is unset. Prefer passing the zone
    /// explicitly with [`time_zone`](Self::time_zone).
    pub fn local_time_zone(self) -> Self {
        match std::env::var("TZ") {
            Ok(zone) => self.time_zone(zone.trim_start_matches(':').to_string()),
            Err(_) => self,
        }
    }

    /// Selected fields
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Source measurement, if set
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Time zone, if set
    pub fn zone(&self) -> Option<&str> {
        self.time_zone.as_deref()
    }

    /// Render `SELECT COUNT(<field>) AS COUNT` over the same table and WHERE clauses.
    ///
    /// Ordering, grouping, fill and time zone are ignored: only a scalar count
    /// is needed.
    pub fn to_count(&self) -> QueryResult<String> {
        let table = self.require_table()?;
        let field = self
            .count_field
            .as_deref()
            .or_else(|| self.fields.first().map(String::as_str))
            .ok_or(QueryError::MissingFields)?;

        let mut sql = format!("SELECT COUNT({}) AS COUNT From {}", field, table);
        self.push_where_clause(&mut sql);
        Ok(sql)
    }

    /// Render the full statement with a `LIMIT count OFFSET offset` window
    pub fn to_limit_and_offset(&self, count: usize, offset: usize) -> QueryResult<String> {
        let mut sql = self.render()?;
        sql.push_str(&format!("  LIMIT {} OFFSET {}", count, offset));
        self.push_time_zone(&mut sql);
        Ok(sql)
    }

    /// Render the full statement
    pub fn to_query(&self) -> QueryResult<String> {
        let mut sql = self.render()?;
        self.push_time_zone(&mut sql);
        Ok(sql)
    }

    fn require_table(&self) -> QueryResult<&str> {
        match self.table.as_deref() {
            Some(table) if !table.trim().is_empty() => Ok(table),
            _ => Err(QueryError::MissingTable),
        }
    }

    /// Everything but the window and the time zone
    fn render(&self) -> QueryResult<String> {
        let table = self.require_table()?;

        let mut sql = String::from("SELECT ");
        if self.fields.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.fields.join(","));
        }
        sql.push_str(CLAUSE_SEPARATOR);
        sql.push_str("FROM ");
        sql.push_str(table);

        self.push_where_clause(&mut sql);
        self.push_order_clause(&mut sql);

        if !self.group_by.is_empty() {
            sql.push_str(CLAUSE_SEPARATOR);
            sql.push_str("GROUP BY ");
            sql.push_str(&self.group_by.join(","));
            if let Some(fill) = &self.fill {
                sql.push_str(&format!(" FILL({})", fill));
            }
        }

        Ok(sql)
    }

    fn push_where_clause(&self, sql: &mut String) {
        if !self.where_clauses.is_empty() {
            sql.push_str(CLAUSE_SEPARATOR);
            sql.push_str("WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }
    }

    // Ascending columns win when both directions were requested.
    fn push_order_clause(&self, sql: &mut String) {
        let asc = self.order_columns(Direction::Asc);
        if !asc.is_empty() {
            sql.push_str(CLAUSE_SEPARATOR);
            sql.push_str("ORDER BY ");
            sql.push_str(&asc.join(","));
            return;
        }

        let desc = self.order_columns(Direction::Desc);
        if !desc.is_empty() {
            sql.push_str(CLAUSE_SEPARATOR);
            sql.push_str("ORDER BY ");
            sql.push_str(&desc.join(","));
            sql.push_str(" DESC");
        }
    }

    /// Distinct columns for one direction, first occurrence order
    fn order_columns(&self, direction: Direction) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for (column, dir) in &self.order_by {
            if *dir == direction && !columns.contains(&column.as_str()) {
                columns.push(column);
            }
        }
        columns
    }

    fn push_time_zone(&self, sql: &mut String) {
        if let Some(zone) = &self.time_zone {
            sql.push_str(&format!(" tz('{}')", zone));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_select_defaults_to_star() {
        let sql = QueryBuilder::new().from("measurement").to_query().unwrap();
        assert_eq!(sql, "SELECT * \n\tFROM measurement");
    }

    #[test]
    fn test_fields_and_time_zone() {
        let builder = QueryBuilder::new().from("TEST.autogen");
        let builder = builder.select(["lat", "lng"]);
        assert_eq!(
            builder.to_query().unwrap(),
            "SELECT lat,lng \n\tFROM TEST.autogen"
        );

        let builder = builder.time_zone("Asia/Shanghai");
        assert_eq!(
            builder.to_query().unwrap(),
            "SELECT lat,lng \n\tFROM TEST.autogen tz('Asia/Shanghai')"
        );
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let builder = QueryBuilder::new().select(["lat"]);
        assert_eq!(builder.to_query(), Err(QueryError::MissingTable));
        assert_eq!(builder.to_count(), Err(QueryError::MissingTable));
        assert_eq!(
            builder.to_limit_and_offset(10, 0),
            Err(QueryError::MissingTable)
        );
    }

    #[test]
    fn test_limit_and_offset_layout() {
        let sql = QueryBuilder::new()
            .select(["*"])
            .from("trace")
            .where_clause("time >= '2024-01-01T00:00:00Z'")
            .to_limit_and_offset(10, 0)
            .unwrap();

        assert_eq!(
            sql,
            "SELECT * \n\tFROM trace \n\tWHERE time >= '2024-01-01T00:00:00Z'  LIMIT 10 OFFSET 0"
        );
    }

    #[test]
    fn test_limit_and_offset_appends_time_zone_last() {
        let sql = QueryBuilder::with_fields(["lat"], "trace")
            .time_zone("UTC")
            .to_limit_and_offset(20, 40)
            .unwrap();

        assert_eq!(sql, "SELECT lat \n\tFROM trace  LIMIT 20 OFFSET 40 tz('UTC')");
    }

    #[test]
    fn test_where_clauses_are_and_joined() {
        let sql = QueryBuilder::new()
            .from("trace")
            .where_clause("a = 1")
            .where_clause("   ")
            .where_clause("b = 2")
            .to_query()
            .unwrap();

        assert_eq!(sql, "SELECT * \n\tFROM trace \n\tWHERE a = 1 AND b = 2");
    }

    #[test]
    fn test_where_value_dispatch() {
        let time = utc("2024-01-01T00:00:00Z");
        let sql = QueryBuilder::new()
            .from("trace")
            .where_value("deleted", "=", None::<i32>)
            .where_value("time", ">=", time)
            .where_value("time", "<", Duration::minutes(5))
            .where_value("name", "=", "ship")
            .where_value("speed", ">", 12.5)
            .to_query()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT * \n\tFROM trace \n\tWHERE deleted IS NULL \
             AND time >= '2024-01-01T00:00:00Z' \
             AND time < now() - 300s \
             AND name = 'ship' \
             AND speed > 12.5"
        );
    }

    #[test]
    fn test_order_by_ascending_wins() {
        let asc_only = QueryBuilder::new()
            .from("t")
            .order_by(["time", "", "time", "id"])
            .to_query()
            .unwrap();
        assert_eq!(asc_only, "SELECT * \n\tFROM t \n\tORDER BY time,id");

        let desc_only = QueryBuilder::new()
            .from("t")
            .order_by_desc(["time"])
            .to_query()
            .unwrap();
        assert_eq!(desc_only, "SELECT * \n\tFROM t \n\tORDER BY time DESC");

        let both = QueryBuilder::new()
            .from("t")
            .order_by_desc(["id"])
            .order_by(["time"])
            .to_query()
            .unwrap();
        assert_eq!(both, "SELECT * \n\tFROM t \n\tORDER BY time");
    }

    #[test]
    fn test_group_by_and_fill() {
        let sql = QueryBuilder::with_fields(["MEAN(speed) AS speed"], "trace")
            .group_by(["MMSI", " "])
            .group_by_time(5, "m")
            .group_by_duration(Duration::hours(2))
            .fill(Some(0))
            .to_query()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT MEAN(speed) AS speed \n\tFROM trace \n\tGROUP BY MMSI,time(5m),time(120m) FILL(0)"
        );

        let null_fill = QueryBuilder::new()
            .from("t")
            .group_by_time(1, "h")
            .fill(None)
            .to_query()
            .unwrap();
        assert!(null_fill.ends_with("GROUP BY time(1h) FILL(NULL)"));

        let previous = QueryBuilder::new()
            .from("t")
            .group_by_time(1, "h")
            .fill_previous()
            .to_query()
            .unwrap();
        assert!(previous.ends_with("FILL(previous)"));
    }

    #[test]
    fn test_fill_without_group_is_not_rendered() {
        let sql = QueryBuilder::new().from("t").fill(Some(1)).to_query().unwrap();
        assert_eq!(sql, "SELECT * \n\tFROM t");
    }

    #[test]
    fn test_to_count() {
        let sql = QueryBuilder::with_fields(["lat", "lng"], "measurement")
            .where_clause("time >= '2024-01-01T00:00:00Z'")
            .order_by(["time"])
            .group_by(["MMSI"])
            .time_zone("Asia/Shanghai")
            .to_count()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT COUNT(lat) AS COUNT From measurement \n\tWHERE time >= '2024-01-01T00:00:00Z'"
        );
    }

    #[test]
    fn test_to_count_prefers_count_field() {
        let sql = QueryBuilder::with_fields(["MMSI", "lat"], "ShipTrack")
            .count_field("lat")
            .to_count()
            .unwrap();
        assert_eq!(sql, "SELECT COUNT(lat) AS COUNT From ShipTrack");
    }

    #[test]
    fn test_to_count_without_fields() {
        let builder = QueryBuilder::new().from("t");
        assert_eq!(builder.to_count(), Err(QueryError::MissingFields));
    }

    #[test]
    fn test_start_shorthands() {
        let day = utc("2024-05-06T17:00:00Z");
        let sql = QueryBuilder::new()
            .from("t")
            .start(&day)
            .start_duration(Duration::hours(1))
            .start_date(&day)
            .to_query()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT * \n\tFROM t \n\tWHERE time >= '2024-05-06T17:00:00Z' \
             AND time >= now() - 3600s \
             AND time >= '2024-05-06T00:00:00Z' AND time < '2024-05-07T00:00:00Z'"
        );
    }

    #[test]
    fn test_blank_time_zone_is_cleared() {
        let builder = QueryBuilder::new().from("t").time_zone("UTC").time_zone("");
        assert_eq!(builder.zone(), None);
    }
}
