//! SQLite-backed remote store.
//!
//! One connection behind a mutex. Callers on the async side run these
//! methods on the blocking pool.

mod accounts;
mod records;

pub use records::StoredRecord;

use crate::error::{StoreError, StoreResult};
use keeper_types::{is_unset, now_millis, truncate_millis, RecordKind};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    login TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS logo_passes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    login TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    description TEXT NOT NULL,
    secret_login TEXT NOT NULL,
    secret_password TEXT NOT NULL,
    UNIQUE (login, description)
);
CREATE TABLE IF NOT EXISTS text_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    login TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    description TEXT NOT NULL,
    text TEXT NOT NULL,
    UNIQUE (login, description)
);
CREATE TABLE IF NOT EXISTS credit_cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    login TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    number TEXT NOT NULL,
    holder TEXT NOT NULL,
    due_date TEXT NOT NULL,
    cvv TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    UNIQUE (login, number)
);
CREATE TABLE IF NOT EXISTS binary_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    login TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    description TEXT NOT NULL,
    content TEXT,
    UNIQUE (login, description)
);
";

/// The remote store.
#[derive(Clone)]
pub struct RemoteStore {
    conn: Arc<Mutex<Connection>>,
}

impl RemoteStore {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        info!("opened remote store at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    /// Stores `record` for `owner` under last-writer-wins rules and returns
    /// the stored record's id.
    ///
    /// - no record with the same key: inserted
    /// - record exists and `overwrite` is unset: [`StoreError::AlreadyExists`]
    /// - stored clock newer than the incoming one: [`StoreError::OldData`]
    /// - otherwise the stored record is replaced, keeping its id
    ///
    /// The incoming clock is kept (at millisecond precision); an unset clock
    /// is stamped with the current time.
    pub fn put<R: StoredRecord>(&self, owner: &str, record: &R) -> StoreResult<u64> {
        let table = R::KIND.table_name();
        let key = record.unique_key();
        let incoming = if is_unset(&record.updated_at()) {
            now_millis()
        } else {
            truncate_millis(record.updated_at())
        };
        let incoming_ms = incoming.timestamp_millis();

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<(i64, i64)> = tx
            .query_row(
                &format!(
                    "SELECT id, updated_at FROM {table} WHERE login = ?1 AND {} = ?2",
                    R::KEY_COLUMN
                ),
                params![owner, key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let id = match existing {
            None => {
                let mut values = vec![Value::Text(owner.to_string()), Value::Integer(incoming_ms)];
                values.extend(record.column_values());
                let placeholders: Vec<String> =
                    (3..=R::COLUMNS.len() + 2).map(|i| format!("?{i}")).collect();
                tx.execute(
                    &format!(
                        "INSERT INTO {table} (login, updated_at, {}) VALUES (?1, ?2, {})",
                        R::COLUMNS.join(", "),
                        placeholders.join(", ")
                    ),
                    params_from_iter(values),
                )?;
                tx.last_insert_rowid()
            }
            Some(_) if !record.meta().overwrite => {
                return Err(StoreError::AlreadyExists(key.to_string()));
            }
            Some((_, stored_ms)) if stored_ms > incoming_ms => {
                debug!("{owner}/{}/{key}: rejecting stale overwrite", R::KIND);
                return Err(StoreError::OldData);
            }
            Some((id, _)) => {
                // ?1 = clock, ?2.. = payload, last = id. The clock guard repeats
                // the comparison inside the write itself.
                let assignments: Vec<String> = R::COLUMNS
                    .iter()
                    .enumerate()
                    .map(|(i, col)| format!("{col} = COALESCE(?{}, {col})", i + 2))
                    .collect();
                let id_param = R::COLUMNS.len() + 2;
                let mut values = vec![Value::Integer(incoming_ms)];
                values.extend(record.column_values());
                values.push(Value::Integer(id));
                let changed = tx.execute(
                    &format!(
                        "UPDATE {table} SET updated_at = ?1, {} WHERE id = ?{id_param} AND updated_at <= ?1",
                        assignments.join(", ")
                    ),
                    params_from_iter(values),
                )?;
                if changed == 0 {
                    return Err(StoreError::OldData);
                }
                id
            }
        };

        tx.commit()?;
        debug!("{owner}/{}/{key}: stored as id {id}", R::KIND);
        Ok(id as u64)
    }

    /// Every record of one kind for `owner`, in insertion order. Blobs are
    /// listed without content.
    pub fn list_all<R: StoredRecord>(&self, owner: &str) -> StoreResult<Vec<R>> {
        let columns = R::LISTING_COLUMNS;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, updated_at, {} FROM {} WHERE login = ?1 ORDER BY id",
            columns.join(", "),
            R::KIND.table_name()
        ))?;
        let rows = stmt
            .query_map(params![owner], |row| R::from_row(row, columns))?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Err(StoreError::Empty);
        }
        Ok(rows)
    }

    /// One full record by uniqueness key.
    pub fn get_one<R: StoredRecord>(&self, owner: &str, key: &str) -> StoreResult<R> {
        let columns = R::COLUMNS;
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT id, updated_at, {} FROM {} WHERE login = ?1 AND {} = ?2",
                columns.join(", "),
                R::KIND.table_name(),
                R::KEY_COLUMN
            ),
            params![owner, key],
            |row| R::from_row(row, columns),
        )
        .optional()?
        .ok_or(StoreError::Empty)
    }

    /// Removes every user and record. Administrative only.
    pub fn delete_all(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        for kind in RecordKind::ALL {
            conn.execute(&format!("DELETE FROM {}", kind.table_name()), [])?;
        }
        conn.execute("DELETE FROM users", [])?;
        info!("remote store wiped");
        Ok(())
    }
}
