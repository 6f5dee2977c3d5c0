//! Best-effort request history
//!
//! Each request/response pair is written to `api_history` on the blocking
//! pool after the response has been built. Failures are logged and counted
//! and never reach the client.

use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::store;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RequestLog {
    db_path: PathBuf,
}

impl RequestLog {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Write one entry synchronously
    pub fn append(&self, api: &str, request: &str, response: &str) -> Result<(), rusqlite::Error> {
        let conn = store::open(&self.db_path)?;
        store::insert_api_history(&conn, api, request, response)
    }

    /// Number of logged entries
    pub fn count(&self) -> Result<u64, rusqlite::Error> {
        store::api_history_len(&store::open(&self.db_path)?)
    }

    /// Queue an entry without waiting for it. Must be called from within a
    /// tokio runtime.
    pub fn record(
        &self,
        api: &'static str,
        request: String,
        response: String,
        metrics: ServiceMetrics,
        logger: StructuredLogger,
    ) {
        let log = self.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = log.append(api, &request, &response) {
                metrics.inc_request_log_failures();
                logger.log_request_log_failed(api, &e.to_string());
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_count() {
        let dir = TempDir::new().unwrap();
        let log = RequestLog::new(dir.path().join("app_db.sqlite"));

        log.append("/predict_price", r#"{"data":{}}"#, r#"{"error":"x"}"#)
            .unwrap();
        log.append("/similar_diamonds", "{}", r#"{"result":[]}"#).unwrap();

        assert_eq!(log.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_record_is_eventually_written() {
        let dir = TempDir::new().unwrap();
        let log = RequestLog::new(dir.path().join("app_db.sqlite"));

        log.record(
            "/predict_price",
            "{}".to_string(),
            "{}".to_string(),
            ServiceMetrics::new(),
            StructuredLogger::new("test"),
        );

        let mut written = 0;
        for _ in 0..100 {
            written = log.count().unwrap_or(0);
            if written == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(written, 1);
    }

    #[tokio::test]
    async fn test_unwritable_log_does_not_panic() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened as a database
        let log = RequestLog::new(dir.path());

        log.record(
            "/predict_price",
            "{}".to_string(),
            "{}".to_string(),
            ServiceMetrics::new(),
            StructuredLogger::new("test"),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(log.append("/predict_price", "{}", "{}").is_err());
    }
}
