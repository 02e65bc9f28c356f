//! Statement execution seam
//!
//! Everything above this trait only produces statement text and consumes
//! result sets; the transport lives behind it.

use crate::context::client::ClientResult;
use crate::series::{Serie, Value};
use async_trait::async_trait;

/// Executes InfluxQL statements against a database
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a read statement and return every result set it produced
    async fn query(&self, database: &str, statement: &str) -> ClientResult<Vec<Serie>>;

    /// Run a statement that changes server state
    async fn command(&self, statement: &str) -> ClientResult<()> {
        self.query("", statement).await.map(|_| ())
    }

    /// Measurement names of a database
    async fn measurements(&self, database: &str) -> ClientResult<Vec<String>> {
        let series = self.query(database, "SHOW MEASUREMENTS").await?;
        Ok(first_column(&series))
    }

    /// Field keys of a measurement, in server order
    async fn field_keys(&self, database: &str, measurement: &str) -> ClientResult<Vec<String>> {
        let statement = format!("SHOW FIELD KEYS FROM {}", quote_identifier(measurement));
        let series = self.query(database, &statement).await?;
        Ok(first_column(&series))
    }

    /// Tag keys of a measurement, in server order
    async fn tag_keys(&self, database: &str, measurement: &str) -> ClientResult<Vec<String>> {
        let statement = format!("SHOW TAG KEYS FROM {}", quote_identifier(measurement));
        let series = self.query(database, &statement).await?;
        Ok(first_column(&series))
    }

    /// Database names on the server
    async fn databases(&self) -> ClientResult<Vec<String>> {
        let series = self.query("", "SHOW DATABASES").await?;
        Ok(first_column(&series))
    }

    async fn create_database(&self, name: &str) -> ClientResult<()> {
        self.command(&format!("CREATE DATABASE {}", quote_identifier(name)))
            .await
    }
}

/// Double-quote an identifier, escaping embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

/// String values of the first column of every row
fn first_column(series: &[Serie]) -> Vec<String> {
    series
        .iter()
        .flat_map(|serie| serie.values.iter())
        .filter_map(|row| match row.first() {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
        .collect()
}
