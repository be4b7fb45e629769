//! SQLite-backed problem store.
//!
//! One row per problem plus one row per vote. `put` rewrites the problem row
//! and its vote rows inside a single transaction, so a snapshot is never
//! visible half-written. Blocking database work runs on
//! `tokio::task::spawn_blocking`.
//!
//! A caller that stops awaiting (store timeout, cancellation) marks its call
//! abandoned. Abandoned calls do no work once they get the connection,
//! and writes roll back instead of committing. A commit already under way
//! when the caller gives up still lands; the retried `put` writes the same
//! snapshot.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;
use zeladoria_application::ports::problem_store::{ProblemStore, StoreError};
use zeladoria_domain::{
    ActorId, DomainError, Location, Problem, ProblemId, ProblemRecord, ProblemStatus, TypeKey,
};

const PHASE_CONFIRM: &str = "confirm";
const PHASE_VALIDATE: &str = "validate";

/// How long SQLite itself waits on a locked database before reporting busy.
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// Set once the awaiting side of a store call has gone away.
#[derive(Clone, Default)]
struct Abandoned(Arc<AtomicBool>);

impl Abandoned {
    fn check(&self) -> Result<(), StoreError> {
        if self.0.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(
                "store call abandoned by its caller".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Marks the call abandoned when the awaiting future is dropped.
struct AbandonOnDrop(Abandoned);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.0.store(true, Ordering::SeqCst);
    }
}

pub struct SqliteProblemStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteProblemStore {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS problems (
            id INTEGER PRIMARY KEY,
            type_key TEXT NOT NULL,
            description TEXT NOT NULL,
            lat REAL NOT NULL,
            lng REAL NOT NULL,
            status TEXT NOT NULL,
            official_note TEXT,
            reported_by TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            resolved_at TEXT
        );

        CREATE TABLE IF NOT EXISTS problem_votes (
            problem_id INTEGER NOT NULL,
            phase TEXT NOT NULL,
            actor TEXT NOT NULL,
            PRIMARY KEY (problem_id, phase, actor),
            FOREIGN KEY (problem_id) REFERENCES problems(id) ON DELETE CASCADE
        );

        -- Highest id ever handed out; deleted ids are never reused
        CREATE TABLE IF NOT EXISTS id_sequence (
            name TEXT PRIMARY KEY,
            last_value INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_problems_status
        ON problems(status);
    ";

    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!(
                    "cannot create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let conn = Connection::open(path).map_err(map_sql_error)?;
        Self::initialize(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(map_sql_error)?;
        Self::initialize(conn, None)
    }

    fn initialize(conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(map_sql_error)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL; PRAGMA foreign_keys=ON;",
        )
        .map_err(map_sql_error)?;
        conn.execute_batch(Self::SCHEMA).map_err(map_sql_error)?;
        if let Some(path) = &path {
            debug!("Opened problem store at {}", path.display());
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &Abandoned) -> Result<T, StoreError> + Send + 'static,
    {
        let abandoned = Abandoned::default();
        let _on_drop = AbandonOnDrop(abandoned.clone());
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            abandoned.check()?;
            f(&mut guard, &abandoned)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("store task failed: {}", e)))?
    }
}

#[async_trait]
impl ProblemStore for SqliteProblemStore {
    async fn allocate_id(&self) -> Result<ProblemId, StoreError> {
        self.with_conn(|conn, abandoned| {
            let tx = conn.transaction().map_err(map_sql_error)?;
            tx.execute(
                "INSERT INTO id_sequence (name, last_value)
                 VALUES ('problems', 0)
                 ON CONFLICT(name) DO NOTHING",
                [],
            )
            .map_err(map_sql_error)?;
            tx.execute(
                "UPDATE id_sequence
                 SET last_value =
                     max(last_value, (SELECT COALESCE(MAX(id), 0) FROM problems)) + 1
                 WHERE name = 'problems'",
                [],
            )
            .map_err(map_sql_error)?;
            let next: i64 = tx
                .query_row(
                    "SELECT last_value FROM id_sequence WHERE name = 'problems'",
                    [],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            abandoned.check()?;
            tx.commit().map_err(map_sql_error)?;
            from_sql_id(next)
        })
        .await
    }

    async fn get(&self, id: ProblemId) -> Result<Option<Problem>, StoreError> {
        self.with_conn(move |conn, _| {
            let sql_id = to_sql_id(id)?;
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM problems WHERE id = ?1", ProblemRow::COLUMNS),
                    params![sql_id],
                    ProblemRow::from_row,
                )
                .optional()
                .map_err(map_sql_error)?;
            let Some(row) = row else {
                return Ok(None);
            };

            let mut stmt = conn
                .prepare(
                    "SELECT phase, actor FROM problem_votes
                     WHERE problem_id = ?1
                     ORDER BY phase, actor",
                )
                .map_err(map_sql_error)?;
            let votes = stmt
                .query_map(params![sql_id], |r| {
                    Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
                })
                .map_err(map_sql_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_sql_error)?;

            let mut ballots = Ballots::default();
            for (phase, actor) in votes {
                ballots.push(row.id, &phase, actor)?;
            }
            row.into_problem(ballots).map(Some)
        })
        .await
    }

    async fn put(&self, problem: &Problem) -> Result<(), StoreError> {
        let record = problem.to_record();
        self.with_conn(move |conn, abandoned| {
            let sql_id = to_sql_id(record.id)?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            tx.execute(
                "INSERT INTO problems (id, type_key, description, lat, lng, status,
                     official_note, reported_by, created_at, updated_at, resolved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                     type_key = excluded.type_key,
                     description = excluded.description,
                     lat = excluded.lat,
                     lng = excluded.lng,
                     status = excluded.status,
                     official_note = excluded.official_note,
                     reported_by = excluded.reported_by,
                     created_at = excluded.created_at,
                     updated_at = excluded.updated_at,
                     resolved_at = excluded.resolved_at",
                params![
                    sql_id,
                    record.type_key.as_str(),
                    &record.description,
                    record.location.lat,
                    record.location.lng,
                    record.status.as_str(),
                    &record.official_note,
                    record.reported_by.as_str(),
                    format_ts(record.created_at),
                    format_ts(record.updated_at),
                    record.resolved_at.map(format_ts),
                ],
            )
            .map_err(map_sql_error)?;

            tx.execute(
                "DELETE FROM problem_votes WHERE problem_id = ?1",
                params![sql_id],
            )
            .map_err(map_sql_error)?;
            {
                let mut insert = tx
                    .prepare(
                        "INSERT INTO problem_votes (problem_id, phase, actor)
                         VALUES (?1, ?2, ?3)",
                    )
                    .map_err(map_sql_error)?;
                for actor in &record.confirmed_by {
                    insert
                        .execute(params![sql_id, PHASE_CONFIRM, actor.as_str()])
                        .map_err(map_sql_error)?;
                }
                for actor in &record.validated_by {
                    insert
                        .execute(params![sql_id, PHASE_VALIDATE, actor.as_str()])
                        .map_err(map_sql_error)?;
                }
            }
            // Dropping the transaction rolls it back.
            abandoned.check()?;
            tx.commit().map_err(map_sql_error)
        })
        .await
    }

    async fn delete(&self, id: ProblemId) -> Result<bool, StoreError> {
        self.with_conn(move |conn, abandoned| {
            let tx = conn.transaction().map_err(map_sql_error)?;
            let removed = tx
                .execute("DELETE FROM problems WHERE id = ?1", params![to_sql_id(id)?])
                .map_err(map_sql_error)?;
            abandoned.check()?;
            tx.commit().map_err(map_sql_error)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<Problem>, StoreError> {
        self.with_conn(|conn, _| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM problems ORDER BY id",
                    ProblemRow::COLUMNS
                ))
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map([], ProblemRow::from_row)
                .map_err(map_sql_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_sql_error)?;

            let mut stmt = conn
                .prepare(
                    "SELECT problem_id, phase, actor FROM problem_votes
                     ORDER BY phase, actor",
                )
                .map_err(map_sql_error)?;
            let votes = stmt
                .query_map([], |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                    ))
                })
                .map_err(map_sql_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_sql_error)?;

            let mut ballots: HashMap<i64, Ballots> = HashMap::new();
            for (problem_id, phase, actor) in votes {
                ballots
                    .entry(problem_id)
                    .or_default()
                    .push(problem_id, &phase, actor)?;
            }

            rows.into_iter()
                .map(|row| {
                    let votes = ballots.remove(&row.id).unwrap_or_default();
                    row.into_problem(votes)
                })
                .collect()
        })
        .await
    }
}

/// Raw `problems` row before invariant checks.
struct ProblemRow {
    id: i64,
    type_key: String,
    description: String,
    lat: f64,
    lng: f64,
    status: String,
    official_note: Option<String>,
    reported_by: String,
    created_at: String,
    updated_at: String,
    resolved_at: Option<String>,
}

impl ProblemRow {
    const COLUMNS: &'static str = "id, type_key, description, lat, lng, status, official_note, \
                                   reported_by, created_at, updated_at, resolved_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            type_key: row.get(1)?,
            description: row.get(2)?,
            lat: row.get(3)?,
            lng: row.get(4)?,
            status: row.get(5)?,
            official_note: row.get(6)?,
            reported_by: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
            resolved_at: row.get(10)?,
        })
    }

    fn into_problem(self, ballots: Ballots) -> Result<Problem, StoreError> {
        let id = from_sql_id(self.id)?;
        let corrupt = |reason: String| {
            StoreError::Corrupt(DomainError::CorruptRecord {
                id: id.value(),
                reason,
            })
        };
        let status: ProblemStatus = self
            .status
            .parse()
            .map_err(|e: DomainError| corrupt(e.to_string()))?;
        let record = ProblemRecord {
            id,
            type_key: TypeKey::new(&self.type_key).map_err(|e| corrupt(e.to_string()))?,
            description: self.description,
            location: Location::new(self.lat, self.lng).map_err(|e| corrupt(e.to_string()))?,
            status,
            official_note: self.official_note,
            reported_by: ActorId::new(&self.reported_by).map_err(|e| corrupt(e.to_string()))?,
            confirmed_by: ballots.confirmed,
            validated_by: ballots.validated,
            created_at: parse_ts(&self.created_at).map_err(&corrupt)?,
            updated_at: parse_ts(&self.updated_at).map_err(&corrupt)?,
            resolved_at: self
                .resolved_at
                .as_deref()
                .map(parse_ts)
                .transpose()
                .map_err(&corrupt)?,
        };
        Ok(Problem::try_from(record)?)
    }
}

#[derive(Default)]
struct Ballots {
    confirmed: Vec<ActorId>,
    validated: Vec<ActorId>,
}

impl Ballots {
    fn push(&mut self, problem_id: i64, phase: &str, actor: String) -> Result<(), StoreError> {
        let corrupt = |reason: String| {
            StoreError::Corrupt(DomainError::CorruptRecord {
                id: problem_id.max(0) as u64,
                reason,
            })
        };
        let actor = ActorId::new(actor).map_err(|e| corrupt(e.to_string()))?;
        match phase {
            PHASE_CONFIRM => self.confirmed.push(actor),
            PHASE_VALIDATE => self.validated.push(actor),
            other => return Err(corrupt(format!("unknown vote phase '{}'", other))),
        }
        Ok(())
    }
}

fn map_sql_error(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ) =>
        {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

fn to_sql_id(id: ProblemId) -> Result<i64, StoreError> {
    i64::try_from(id.value())
        .map_err(|_| StoreError::Backend(format!("problem id {} out of range", id)))
}

fn from_sql_id(id: i64) -> Result<ProblemId, StoreError> {
    u64::try_from(id)
        .map(ProblemId::new)
        .map_err(|_| StoreError::Backend(format!("negative problem id {}", id)))
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp '{}': {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::mpsc;
    use std::thread::{self, JoinHandle};
    use zeladoria_domain::{ConsensusEngine, NewProblem, Transition};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, hour, 0, 0).unwrap()
    }

    fn actor(name: &str) -> ActorId {
        ActorId::new(name).unwrap()
    }

    fn reported(id: ProblemId) -> Problem {
        let report =
            NewProblem::new("luz_queimada", "Poste apagado na praça", -22.9068, -43.1729).unwrap();
        Problem::report(id, report, actor("maria"), at(8))
    }

    /// Walk a problem to resolved with one validation and a note.
    fn resolved_with_votes(id: ProblemId) -> Problem {
        let engine = ConsensusEngine;
        let steps = [
            (Transition::Confirm, "joao"),
            (Transition::MarkInReview, "prefeitura"),
            (Transition::attach_note("Troca de lâmpada agendada"), "prefeitura"),
            (Transition::MarkResolved, "prefeitura"),
            (Transition::Validate, "ana"),
        ];
        steps
            .into_iter()
            .enumerate()
            .fold(reported(id), |problem, (i, (transition, who))| {
                engine
                    .apply(&problem, &transition, &actor(who), at(9 + i as u32))
                    .unwrap()
                    .problem
            })
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("problems.db");

        let problem = {
            let store = SqliteProblemStore::open(&path).unwrap();
            let id = store.allocate_id().await.unwrap();
            let problem = resolved_with_votes(id);
            store.put(&problem).await.unwrap();
            problem
        };

        let store = SqliteProblemStore::open(&path).unwrap();
        let loaded = store.get(problem.id()).await.unwrap().unwrap();
        assert_eq!(loaded, problem);
        assert_eq!(loaded.confirmation_count(), 2);
        assert_eq!(loaded.validation_count(), 1);
        assert_eq!(loaded.official_note(), Some("Troca de lâmpada agendada"));
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_put_replaces_votes() {
        let store = SqliteProblemStore::open_in_memory().unwrap();
        let id = store.allocate_id().await.unwrap();
        let resolved = resolved_with_votes(id);
        store.put(&resolved).await.unwrap();

        // Contest clears the validation set.
        let contested = ConsensusEngine
            .apply(&resolved, &Transition::MarkInReview, &actor("prefeitura"), at(20))
            .unwrap()
            .problem;
        store.put(&contested).await.unwrap();

        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded.validation_count(), 0);
        assert_eq!(loaded.status(), ProblemStatus::InReview);
        assert!(loaded.resolved_at().is_none());
    }

    #[tokio::test]
    async fn test_ids_never_reused() {
        let store = SqliteProblemStore::open_in_memory().unwrap();
        let first = store.allocate_id().await.unwrap();
        store.put(&reported(first)).await.unwrap();
        assert!(store.delete(first).await.unwrap());
        assert!(!store.delete(first).await.unwrap());

        let second = store.allocate_id().await.unwrap();
        assert!(second > first);
        assert!(store.get(first).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_votes() {
        let store = SqliteProblemStore::open_in_memory().unwrap();
        let id = store.allocate_id().await.unwrap();
        store.put(&resolved_with_votes(id)).await.unwrap();
        store.delete(id).await.unwrap();

        let conn = store.conn.lock().unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM problem_votes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_list_orders_by_id() {
        let store = SqliteProblemStore::open_in_memory().unwrap();
        let a = store.allocate_id().await.unwrap();
        let b = store.allocate_id().await.unwrap();
        store.put(&resolved_with_votes(b)).await.unwrap();
        store.put(&reported(a)).await.unwrap();

        let problems = store.list().await.unwrap();
        let ids: Vec<_> = problems.iter().map(Problem::id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(problems[0].confirmation_count(), 1);
        assert_eq!(problems[1].validation_count(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let store = SqliteProblemStore::open_in_memory().unwrap();
        let id = store.allocate_id().await.unwrap();
        store.put(&reported(id)).await.unwrap();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute("UPDATE problems SET status = 'archived'", [])
                .unwrap();
        }

        let err = store.get(id).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
        assert!(!err.is_transient());
    }

    /// Hold the connection on another thread until `release` fires.
    fn hold_connection(store: &SqliteProblemStore) -> (JoinHandle<()>, mpsc::Sender<()>) {
        let conn = Arc::clone(&store.conn);
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let holder = thread::spawn(move || {
            let _guard = conn.lock().unwrap();
            locked_tx.send(()).unwrap();
            let _ = release_rx.recv();
        });
        locked_rx.recv().unwrap();
        (holder, release_tx)
    }

    #[tokio::test]
    async fn test_put_abandoned_by_timeout_never_lands() {
        let store = SqliteProblemStore::open_in_memory().unwrap();
        let id = store.allocate_id().await.unwrap();
        let (holder, release) = hold_connection(&store);

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), store.put(&reported(id))).await;
        assert!(timed_out.is_err());

        release.send(()).unwrap();
        holder.join().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.get(id).await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_put_does_not_overwrite_later_write() {
        let store = SqliteProblemStore::open_in_memory().unwrap();
        let id = store.allocate_id().await.unwrap();
        let resolved = resolved_with_votes(id);
        store.put(&reported(id)).await.unwrap();
        let (holder, release) = hold_connection(&store);

        let stale = tokio::time::timeout(Duration::from_millis(50), store.put(&reported(id))).await;
        assert!(stale.is_err());
        release.send(()).unwrap();
        holder.join().unwrap();
        store.put(&resolved).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.get(id).await.unwrap().unwrap(), resolved);
    }

    #[tokio::test]
    async fn test_abandoned_delete_keeps_row() {
        let store = SqliteProblemStore::open_in_memory().unwrap();
        let id = store.allocate_id().await.unwrap();
        store.put(&reported(id)).await.unwrap();
        let (holder, release) = hold_connection(&store);

        let timed_out = tokio::time::timeout(Duration::from_millis(50), store.delete(id)).await;
        assert!(timed_out.is_err());
        release.send(()).unwrap();
        holder.join().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_reporter_vote_is_corrupt() {
        let store = SqliteProblemStore::open_in_memory().unwrap();
        let id = store.allocate_id().await.unwrap();
        store.put(&reported(id)).await.unwrap();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute("DELETE FROM problem_votes", []).unwrap();
        }

        assert!(matches!(
            store.list().await,
            Err(StoreError::Corrupt(DomainError::CorruptRecord { .. }))
        ));
    }
}
