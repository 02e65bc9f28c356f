//! Measurement context
//!
//! A [`SerieContext`] binds one measurement's descriptor to a shared executor
//! and hands out builders preconfigured for that measurement.

use crate::context::error::ContextResult;
use crate::context::executor::QueryExecutor;
use crate::query::{QueryBuilder, QueryError, QueryResult};
use crate::series::{materialize_all, FromSerie, Serie};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// Descriptor of one measurement: where it lives and what it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementInfo {
    pub database: String,
    pub measurement: String,
    /// IANA zone applied to rendered statements
    pub time_zone: String,
    /// Field keys in server order
    pub fields: Vec<String>,
    /// Tag keys in server order
    pub tags: Vec<String>,
}

impl MeasurementInfo {
    pub fn new(
        database: impl Into<String>,
        measurement: impl Into<String>,
        time_zone: impl Into<String>,
        fields: Vec<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            database: database.into(),
            measurement: measurement.into(),
            time_zone: time_zone.into(),
            fields,
            tags,
        }
    }

    /// Field used for counting rows
    pub fn first_field(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }
}

/// Query context for one measurement
#[derive(Clone)]
pub struct SerieContext {
    info: MeasurementInfo,
    executor: Arc<dyn QueryExecutor>,
}

impl SerieContext {
    pub fn new(info: MeasurementInfo, executor: Arc<dyn QueryExecutor>) -> Self {
        Self { info, executor }
    }

    pub fn info(&self) -> &MeasurementInfo {
        &self.info
    }

    pub fn database(&self) -> &str {
        &self.info.database
    }

    pub fn measurement(&self) -> &str {
        &self.info.measurement
    }

    pub fn time_zone(&self) -> &str {
        &self.info.time_zone
    }

    pub fn fields(&self) -> &[String] {
        &self.info.fields
    }

    pub fn tags(&self) -> &[String] {
        &self.info.tags
    }

    pub fn first_field(&self) -> Option<&str> {
        self.info.first_field()
    }

    /// Execute statement text against this context's database
    pub async fn query(&self, statement: &str) -> ContextResult<Vec<Serie>> {
        trace!(database = %self.info.database, statement, "Executing query");
        Ok(self.executor.query(&self.info.database, statement).await?)
    }

    /// Render and execute a builder
    pub async fn query_builder(&self, builder: &QueryBuilder) -> ContextResult<Vec<Serie>> {
        let statement = builder.to_query()?;
        self.query(&statement).await
    }

    /// Render, execute and materialize a builder
    pub async fn query_as<T: FromSerie>(&self, builder: &QueryBuilder) -> ContextResult<Vec<T>> {
        let series = self.query_builder(builder).await?;
        Ok(materialize_all(&series)?)
    }

    /// Select the given tags followed by every field, in this context's zone
    pub fn build_query(&self, tags: &[&str]) -> QueryBuilder {
        let columns = tags
            .iter()
            .map(|tag| tag.to_string())
            .chain(self.info.fields.iter().cloned());
        self.with_defaults(QueryBuilder::with_fields(columns, &self.info.measurement))
    }

    /// `MEAN(f) AS f` for every field, bucketed by `interval`
    pub fn build_mean_query(&self, interval: Duration) -> QueryBuilder {
        let columns = self
            .info
            .fields
            .iter()
            .map(|field| format!("MEAN({field}) AS {field}"));
        self.with_defaults(QueryBuilder::with_fields(columns, &self.info.measurement))
            .group_by_duration(interval)
    }

    /// Count of the first field grouped by `tags`, restricted by `where_clause`
    pub fn build_multi_tags_query(
        &self,
        where_clause: &str,
        tags: &[&str],
    ) -> QueryResult<QueryBuilder> {
        if where_clause.trim().is_empty() {
            return Err(QueryError::EmptyWhereClause(
                "a multi tags query needs a time or tag condition".to_string(),
            ));
        }
        let field = self.info.first_field().ok_or(QueryError::MissingFields)?;

        Ok(self
            .with_defaults(QueryBuilder::new().select([format!("COUNT({})", field)]))
            .from(&self.info.measurement)
            .where_clause(where_clause)
            .group_by(tags.iter().copied()))
    }

    fn with_defaults(&self, builder: QueryBuilder) -> QueryBuilder {
        let builder = builder.time_zone(&self.info.time_zone);
        match self.info.first_field() {
            Some(field) => builder.count_field(field),
            None => builder,
        }
    }
}

impl std::fmt::Debug for SerieContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerieContext")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}
