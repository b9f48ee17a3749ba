//! Embedded SQLite backend.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`; nothing is read or
//!   written before migrations succeed.
//! - Blocking SQLite calls run on tokio's blocking pool, one at a time.
//! - Missing rows and constraint failures are `Transport`, unreadable rows
//!   are `Decoding`, matching the HTTP backend.

use crate::error::{StoreError, StoreResult};
use crate::model::{Event, EventPatch, EventTime, Priority};
use crate::store::{EventStore, join_error};
use async_trait::async_trait;
use log::{error, info};
use rusqlite::types::FromSql;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/0001_init.sql"),
}];

const EVENT_SELECT_SQL: &str = r#"SELECT id, title, start, "end", allDay, priority FROM CalendarEvent"#;

/// Latest schema version known by this binary.
pub fn latest_schema_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

#[derive(Clone)]
pub struct SqliteEventStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEventStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::transport(format!(
                    "failed to create database directory `{}`: {e}",
                    parent.display()
                ))
            })?;
        }
        let conn = Connection::open(path).map_err(|e| {
            error!(
                "event=db_open module=store backend=sqlite status=error mode=file error_code=db_open_failed error={e}"
            );
            db_error(e)
        })?;
        Self::bootstrap(conn, "file", started_at)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let started_at = Instant::now();
        let conn = Connection::open_in_memory().map_err(db_error)?;
        Self::bootstrap(conn, "memory", started_at)
    }

    fn bootstrap(mut conn: Connection, mode: &str, started_at: Instant) -> StoreResult<Self> {
        let result = conn
            .busy_timeout(Duration::from_secs(5))
            .map_err(db_error)
            .and_then(|_| apply_migrations(&mut conn));
        match result {
            Ok(()) => {
                info!(
                    "event=db_open module=store backend=sqlite status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    conn: Arc::new(Mutex::new(conn)),
                })
            }
            Err(err) => {
                error!(
                    "event=db_open module=store backend=sqlite status=error mode={mode} error_code=db_bootstrap_failed error={err}"
                );
                Err(err)
            }
        }
    }

    pub fn schema_version(&self) -> StoreResult<u32> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::transport("sqlite connection lock poisoned"))?;
        current_user_version(&conn)
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::transport("sqlite connection lock poisoned"))?;
            f(&mut guard)
        })
        .await
        .map_err(join_error)?
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn list(&self) -> StoreResult<Vec<Event>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!("{EVENT_SELECT_SQL} ORDER BY rowid ASC;"))
                .map_err(db_error)?;
            let mut rows = stmt.query([]).map_err(db_error)?;
            let mut events = Vec::new();
            while let Some(row) = rows.next().map_err(db_error)? {
                events.push(parse_event_row(row)?);
            }
            Ok(events)
        })
        .await
    }

    async fn create(&self, event: &Event) -> StoreResult<Event> {
        let event = event.clone();
        self.with_conn(move |conn| {
            conn.execute(
                r#"INSERT INTO CalendarEvent (id, title, start, "end", allDay, priority)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6);"#,
                params![
                    event.id.as_str(),
                    event.title.as_str(),
                    event.start.map(|t| t.to_string()),
                    event.end.map(|t| t.to_string()),
                    bool_to_int(event.all_day),
                    i64::from(event.priority.ordinal()),
                ],
            )
            .map_err(db_error)?;
            fetch_event(conn, &event.id)?.ok_or_else(|| not_found(&event.id))
        })
        .await
    }

    async fn update(&self, id: &str, patch: &EventPatch) -> StoreResult<Event> {
        let id = id.to_string();
        let patch = patch.clone();
        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    r#"UPDATE CalendarEvent
                       SET
                          title = COALESCE(?1, title),
                          start = COALESCE(?2, start),
                          "end" = COALESCE(?3, "end"),
                          allDay = COALESCE(?4, allDay),
                          priority = COALESCE(?5, priority)
                       WHERE id = ?6;"#,
                    params![
                        patch.title.as_deref(),
                        patch.start.map(|t| t.to_string()),
                        patch.end.map(|t| t.to_string()),
                        patch.all_day.map(bool_to_int),
                        patch.priority.map(|p| i64::from(p.ordinal())),
                        id.as_str(),
                    ],
                )
                .map_err(db_error)?;
            if changed == 0 {
                return Err(not_found(&id));
            }
            fetch_event(conn, &id)?.ok_or_else(|| not_found(&id))
        })
        .await
    }

    async fn delete(&self, id: &str) -> StoreResult<Event> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(db_error)?;
            let existing = fetch_event(&tx, &id)?.ok_or_else(|| not_found(&id))?;
            tx.execute("DELETE FROM CalendarEvent WHERE id = ?1;", [id.as_str()])
                .map_err(db_error)?;
            tx.commit().map_err(db_error)?;
            Ok(existing)
        })
        .await
    }
}

fn apply_migrations(conn: &mut Connection) -> StoreResult<()> {
    let current = current_user_version(conn)?;
    let latest = latest_schema_version();

    if current > latest {
        return Err(StoreError::transport(format!(
            "database schema version {current} is newer than supported {latest}"
        )));
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction().map_err(db_error)?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql).map_err(db_error)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            .map_err(db_error)?;
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}

fn current_user_version(conn: &Connection) -> StoreResult<u32> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))
        .map_err(db_error)
}

fn fetch_event(conn: &Connection, id: &str) -> StoreResult<Option<Event>> {
    let mut stmt = conn
        .prepare(&format!("{EVENT_SELECT_SQL} WHERE id = ?1;"))
        .map_err(db_error)?;
    let row = stmt
        .query_row([id], |row| Ok(parse_event_row(row)))
        .optional()
        .map_err(db_error)?;
    row.transpose()
}

fn parse_event_row(row: &Row<'_>) -> StoreResult<Event> {
    let id: String = column(row, "id")?;
    let start = parse_time(column(row, "start")?, &id)?;
    let end = parse_time(column(row, "end")?, &id)?;

    let all_day = match column::<i64>(row, "allDay")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::decoding(format!(
                "invalid allDay value `{other}` for event `{id}`"
            )));
        }
    };

    let raw_priority: i64 = column(row, "priority")?;
    let priority = u8::try_from(raw_priority)
        .map_err(|_| format!("priority must be 1, 2 or 3, got {raw_priority}"))
        .and_then(Priority::try_from)
        .map_err(|e| StoreError::decoding(format!("{e} for event `{id}`")))?;

    Ok(Event {
        title: column(row, "title")?,
        id,
        start,
        end,
        all_day,
        priority,
    })
}

fn column<T: FromSql>(row: &Row<'_>, name: &str) -> StoreResult<T> {
    row.get(name)
        .map_err(|e| StoreError::decoding(format!("column `{name}`: {e}")))
}

fn parse_time(raw: Option<String>, id: &str) -> StoreResult<Option<EventTime>> {
    raw.map(|s| {
        s.parse::<EventTime>()
            .map_err(|e| StoreError::decoding(format!("{e} for event `{id}`")))
    })
    .transpose()
}

fn db_error(err: rusqlite::Error) -> StoreError {
    StoreError::transport(format!("sqlite: {err}"))
}

fn not_found(id: &str) -> StoreError {
    StoreError::transport(format!("event `{id}` not found"))
}

fn bool_to_int(value: bool) -> i64 {
    if value { 1 } else { 0 }
}
