//! In-memory executor for tests

use crate::context::client::ClientResult;
use crate::context::executor::QueryExecutor;
use crate::series::Serie;
use async_trait::async_trait;
use std::sync::Mutex;

/// Records every statement and answers by statement prefix
#[derive(Default)]
pub(crate) struct RecordingExecutor {
    statements: Mutex<Vec<(String, String)>>,
    responses: Mutex<Vec<(String, Vec<Serie>)>>,
}

impl RecordingExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer statements starting with `prefix`; earlier registrations win
    pub(crate) fn respond(self, prefix: &str, series: Vec<Serie>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push((prefix.to_string(), series));
        self
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .map(|(_, statement)| statement.clone())
            .collect()
    }

    pub(crate) fn databases_used(&self) -> Vec<String> {
        self.statements
            .lock()
            .unwrap()
            .iter()
            .map(|(database, _)| database.clone())
            .collect()
    }

    pub(crate) fn count_starting_with(&self, prefix: &str) -> usize {
        self.statements()
            .iter()
            .filter(|s| s.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn query(&self, database: &str, statement: &str) -> ClientResult<Vec<Serie>> {
        self.statements
            .lock()
            .unwrap()
            .push((database.to_string(), statement.to_string()));

        let responses = self.responses.lock().unwrap();
        Ok(responses
            .iter()
            .find(|(prefix, _)| statement.starts_with(prefix.as_str()))
            .map(|(_, series)| series.clone())
            .unwrap_or_default())
    }
}
