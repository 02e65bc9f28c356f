//! Context factory
//!
//! Resolves measurement names to [`SerieContext`]s for one database. The
//! measurement list and each measurement's descriptor are cached for a fixed
//! time; entries are refreshed on the first lookup after they expire.

use crate::config::InfluxDbConfig;
use crate::context::client::InfluxClient;
use crate::context::error::{ContextError, ContextResult};
use crate::context::executor::QueryExecutor;
use crate::context::serie_context::{MeasurementInfo, SerieContext};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Factory settings
#[derive(Debug, Clone)]
pub struct FactoryOptions {
    /// Database every context queries
    pub database: String,
    /// Zone applied to every context's statements
    pub time_zone: String,
    /// How long the measurement list is reused
    pub measurements_ttl: Duration,
    /// How long a measurement descriptor is reused
    pub measurement_info_ttl: Duration,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self::from(&InfluxDbConfig::default())
    }
}

impl From<&InfluxDbConfig> for FactoryOptions {
    fn from(config: &InfluxDbConfig) -> Self {
        Self {
            database: config.database.clone(),
            time_zone: config.time_zone.clone(),
            measurements_ttl: Duration::from_secs(config.measurements_ttl_secs),
            measurement_info_ttl: Duration::from_secs(config.measurement_info_ttl_secs),
        }
    }
}

struct Cached<T> {
    value: T,
    expires_at: Instant,
}

impl<T: Clone> Cached<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn fresh(&self) -> Option<T> {
        (Instant::now() < self.expires_at).then(|| self.value.clone())
    }
}

/// Creates measurement contexts sharing one executor
pub struct SerieContextFactory {
    executor: Arc<dyn QueryExecutor>,
    options: FactoryOptions,
    measurements: RwLock<Option<Cached<Vec<String>>>>,
    infos: RwLock<HashMap<String, Cached<MeasurementInfo>>>,
}

impl SerieContextFactory {
    pub fn new(executor: Arc<dyn QueryExecutor>, options: FactoryOptions) -> Self {
        Self {
            executor,
            options,
            measurements: RwLock::new(None),
            infos: RwLock::new(HashMap::new()),
        }
    }

    /// Create a factory backed by an [`InfluxClient`]
    pub fn from_config(config: &InfluxDbConfig) -> ContextResult<Self> {
        let client = InfluxClient::new(config.clone())?;
        Ok(Self::new(Arc::new(client), FactoryOptions::from(config)))
    }

    pub fn database(&self) -> &str {
        &self.options.database
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    /// Measurement names of the database
    pub async fn measurements(&self) -> ContextResult<Vec<String>> {
        if let Some(names) = self.measurements.read().await.as_ref().and_then(Cached::fresh) {
            return Ok(names);
        }

        let names = self.executor.measurements(&self.options.database).await?;
        debug!(
            database = %self.options.database,
            count = names.len(),
            "Refreshed measurement list"
        );
        *self.measurements.write().await =
            Some(Cached::new(names.clone(), self.options.measurements_ttl));
        Ok(names)
    }

    /// Context for a measurement, matched ignoring case
    pub async fn context(&self, measurement: &str) -> ContextResult<SerieContext> {
        let measurements = self.measurements().await?;
        let matched = measurements
            .iter()
            .find(|name| name.eq_ignore_ascii_case(measurement))
            .ok_or_else(|| ContextError::MeasurementNotFound(measurement.to_string()))?;

        let info = self.measurement_info(matched).await?;
        Ok(SerieContext::new(info, self.executor.clone()))
    }

    async fn measurement_info(&self, measurement: &str) -> ContextResult<MeasurementInfo> {
        if let Some(info) = self.infos.read().await.get(measurement).and_then(Cached::fresh) {
            return Ok(info);
        }

        let database = &self.options.database;
        let fields = self.executor.field_keys(database, measurement).await?;
        let tags = self.executor.tag_keys(database, measurement).await?;
        debug!(
            database = %database,
            measurement,
            fields = fields.len(),
            tags = tags.len(),
            "Refreshed measurement info"
        );

        let info = MeasurementInfo::new(
            database.as_str(),
            measurement,
            self.options.time_zone.as_str(),
            fields,
            tags,
        );
        self.infos.write().await.insert(
            measurement.to_string(),
            Cached::new(info.clone(), self.options.measurement_info_ttl),
        );
        Ok(info)
    }

    /// Create the database unless it exists; returns whether it was created
    pub async fn ensure_created(&self) -> ContextResult<bool> {
        let database = &self.options.database;
        let databases = self.executor.databases().await?;
        if databases.iter().any(|name| name.eq_ignore_ascii_case(database)) {
            return Ok(false);
        }

        self.executor.create_database(database).await?;
        info!(database = %database, "Created InfluxDB database");
        Ok(true)
    }

    /// Drop every cached entry
    pub async fn invalidate(&self) {
        *self.measurements.write().await = None;
        self.infos.write().await.clear();
    }
}
