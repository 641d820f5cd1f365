//! SQLite-backed prediction store

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use triage_core::{Prediction, PredictionId};

/// Attempts at inserting a record before giving up on identifier collisions
const MAX_INSERT_ATTEMPTS: usize = 3;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS predictions (
    id              TEXT PRIMARY KEY NOT NULL,
    issue_body      TEXT NOT NULL,
    predicted_label TEXT NOT NULL,
    corrected_label TEXT,
    timestamp       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_predictions_timestamp ON predictions (timestamp);
";

const SELECT_BY_ID: &str = "SELECT id, issue_body, predicted_label, corrected_label, timestamp
     FROM predictions WHERE id = ?1";

/// Durable store of prediction records.
///
/// The store exclusively owns record identity: identifiers are allocated by
/// [`PredictionStore::create`] and records are only mutated through
/// [`PredictionStore::apply_correction`]. Cloning is cheap and shares the
/// underlying connection.
#[derive(Clone)]
pub struct PredictionStore {
    conn: Arc<Mutex<Connection>>,
}

impl PredictionStore {
    /// Open (or create) the database described by `config`
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let conn = Connection::open(&config.path)?;
            let journal_mode: String =
                conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            if !journal_mode.eq_ignore_ascii_case("wal") {
                warn!("SQLite kept journal_mode={} for {}", journal_mode, config.path.display());
            }
            conn
        };

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        Self::initialize(&conn, config.reset_on_startup)?;

        info!("Prediction store opened at {}", config.path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory store
    pub fn in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    fn initialize(conn: &Connection, reset: bool) -> StoreResult<()> {
        if reset {
            warn!("reset_on_startup is enabled: dropping all stored predictions");
            conn.execute_batch("DROP TABLE IF EXISTS predictions;")?;
        }
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Persist a new, uncorrected record and return it.
    ///
    /// The record's identifier is freshly allocated; the caller reads it from
    /// the returned [`Prediction`].
    pub async fn create(
        &self,
        issue_body: impl Into<String>,
        predicted_label: impl Into<String>,
    ) -> StoreResult<Prediction> {
        let mut prediction = Prediction::new(issue_body, predicted_label);

        self.with_conn(move |conn| {
            let mut attempt = 1;
            loop {
                let result = conn.execute(
                    "INSERT INTO predictions (id, issue_body, predicted_label, corrected_label, timestamp)
                     VALUES (?1, ?2, ?3, NULL, ?4)",
                    params![
                        prediction.id.as_str(),
                        prediction.issue_body,
                        prediction.predicted_label,
                        format_timestamp(&prediction.timestamp),
                    ],
                );

                match result {
                    Ok(_) => break,
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.code == ErrorCode::ConstraintViolation
                            && attempt < MAX_INSERT_ATTEMPTS =>
                    {
                        warn!("Prediction id {} already taken, reallocating", prediction.id);
                        prediction.id = PredictionId::generate();
                        attempt += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            debug!(id = %prediction.id, label = %prediction.predicted_label, "Prediction stored");
            Ok(prediction)
        })
        .await
    }

    /// Exact-match lookup by identifier
    pub async fn get(&self, id: &PredictionId) -> StoreResult<Option<Prediction>> {
        let id = id.clone();
        self.with_conn(move |conn| {
            let prediction = conn
                .query_row(SELECT_BY_ID, params![id.as_str()], row_to_prediction)
                .optional()?;
            Ok(prediction)
        })
        .await
    }

    /// Record a reviewer's label for an existing prediction.
    ///
    /// A record can be corrected once. Correcting it again fails with
    /// [`StoreError::AlreadyCorrected`] and leaves the stored label untouched.
    /// The lookup and update share one transaction.
    pub async fn apply_correction(
        &self,
        id: &PredictionId,
        corrected_label: impl Into<String>,
    ) -> StoreResult<Prediction> {
        let id = id.clone();
        let corrected_label = corrected_label.into();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let mut prediction = tx
                .query_row(SELECT_BY_ID, params![id.as_str()], row_to_prediction)
                .optional()?
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

            if prediction.is_corrected() {
                return Err(StoreError::AlreadyCorrected(id.to_string()));
            }

            tx.execute(
                "UPDATE predictions SET corrected_label = ?1
                 WHERE id = ?2 AND corrected_label IS NULL",
                params![corrected_label, id.as_str()],
            )?;
            tx.commit()?;

            debug!(id = %id, label = %corrected_label, "Prediction corrected");
            prediction.corrected_label = Some(corrected_label);
            Ok(prediction)
        })
        .await
    }

    /// Number of stored records
    pub async fn count(&self) -> StoreResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn row_to_prediction(row: &Row<'_>) -> rusqlite::Result<Prediction> {
    let raw: String = row.get(4)?;
    let timestamp = DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Prediction {
        id: PredictionId::from(row.get::<_, String>(0)?),
        issue_body: row.get(1)?,
        predicted_label: row.get(2)?,
        corrected_label: row.get(3)?,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_get() {
        let store = PredictionStore::in_memory().unwrap();
        let created = store.create("login crashes on submit", "bug").await.unwrap();

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.issue_body, "login crashes on submit");
        assert_eq!(fetched.predicted_label, "bug");
        assert!(fetched.corrected_label.is_none());
    }

    #[tokio::test]
    async fn test_get_is_idempotent() {
        let store = PredictionStore::in_memory().unwrap();
        let created = store.create("add dark mode", "enhancement").await.unwrap();

        let first = store.get(&created.id).await.unwrap();
        let second = store.get(&created.id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let store = PredictionStore::in_memory().unwrap();
        let missing = store.get(&PredictionId::from("does-not-exist")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_apply_correction() {
        let store = PredictionStore::in_memory().unwrap();
        let created = store.create("how do I configure this?", "bug").await.unwrap();

        let updated = store.apply_correction(&created.id, "question").await.unwrap();
        assert_eq!(updated.predicted_label, "bug");
        assert_eq!(updated.corrected_label.as_deref(), Some("question"));

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.corrected_label.as_deref(), Some("question"));
        assert_eq!(fetched.timestamp, created.timestamp);
    }

    #[tokio::test]
    async fn test_second_correction_is_rejected() {
        let store = PredictionStore::in_memory().unwrap();
        let created = store.create("it crashes", "bug").await.unwrap();
        store.apply_correction(&created.id, "bug").await.unwrap();

        let err = store
            .apply_correction(&created.id, "question")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyCorrected(_)));

        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.corrected_label.as_deref(), Some("bug"));
    }

    #[tokio::test]
    async fn test_correct_unknown_id() {
        let store = PredictionStore::in_memory().unwrap();
        let err = store
            .apply_correction(&PredictionId::from("nope"), "bug")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "nope"));
    }

    #[test]
    fn test_error_conversion() {
        let core: triage_core::Error = StoreError::NotFound("x".into()).into();
        assert!(matches!(core, triage_core::Error::NotFound(_)));

        let core: triage_core::Error = StoreError::AlreadyCorrected("x".into()).into();
        assert!(matches!(core, triage_core::Error::Conflict(_)));
    }
}
