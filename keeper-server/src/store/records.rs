//! Column mapping for each record kind.

use chrono::{DateTime, Utc};
use keeper_types::{BlobRecord, CardSecret, LoginSecret, Record, RecordMeta, TextSecret};
use rusqlite::Row;
use rusqlite::types::Value;

/// A record kind the remote store can persist.
///
/// Every table has `id`, `login` and `updated_at` columns followed by the
/// kind's payload columns.
pub trait StoredRecord: Record {
    /// Column holding the uniqueness key.
    const KEY_COLUMN: &'static str;

    /// Payload columns in bind order, key column included.
    const COLUMNS: &'static [&'static str];

    /// Payload columns returned by listings.
    const LISTING_COLUMNS: &'static [&'static str] = Self::COLUMNS;

    /// Values for [`Self::COLUMNS`]. `Null` leaves the stored value alone
    /// on overwrite.
    fn column_values(&self) -> Vec<Value>;

    /// Rebuilds a record from a row selected with `id, updated_at` followed
    /// by `columns`.
    fn from_row(row: &Row<'_>, columns: &[&str]) -> rusqlite::Result<Self>;
}

fn read_meta(row: &Row<'_>) -> rusqlite::Result<RecordMeta> {
    let id: i64 = row.get("id")?;
    let updated_ms: i64 = row.get("updated_at")?;
    Ok(RecordMeta {
        id: id as u64,
        updated_at: DateTime::<Utc>::from_timestamp_millis(updated_ms).unwrap_or_default(),
        overwrite: false,
    })
}

impl StoredRecord for LoginSecret {
    const KEY_COLUMN: &'static str = "description";
    const COLUMNS: &'static [&'static str] = &["description", "secret_login", "secret_password"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.description.clone()),
            Value::Text(self.secret_login.clone()),
            Value::Text(self.secret_password.clone()),
        ]
    }

    fn from_row(row: &Row<'_>, _columns: &[&str]) -> rusqlite::Result<Self> {
        Ok(Self {
            meta: read_meta(row)?,
            description: row.get("description")?,
            secret_login: row.get("secret_login")?,
            secret_password: row.get("secret_password")?,
        })
    }
}

impl StoredRecord for TextSecret {
    const KEY_COLUMN: &'static str = "description";
    const COLUMNS: &'static [&'static str] = &["description", "text"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.description.clone()),
            Value::Text(self.text.clone()),
        ]
    }

    fn from_row(row: &Row<'_>, _columns: &[&str]) -> rusqlite::Result<Self> {
        Ok(Self {
            meta: read_meta(row)?,
            description: row.get("description")?,
            text: row.get("text")?,
        })
    }
}

impl StoredRecord for CardSecret {
    const KEY_COLUMN: &'static str = "number";
    const COLUMNS: &'static [&'static str] = &["number", "holder", "due_date", "cvv", "description"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.number.clone()),
            Value::Text(self.holder.clone()),
            Value::Text(self.due_date.clone()),
            Value::Text(self.cvv.clone()),
            Value::Text(self.description.clone()),
        ]
    }

    fn from_row(row: &Row<'_>, _columns: &[&str]) -> rusqlite::Result<Self> {
        Ok(Self {
            meta: read_meta(row)?,
            number: row.get("number")?,
            holder: row.get("holder")?,
            due_date: row.get("due_date")?,
            cvv: row.get("cvv")?,
            description: row.get("description")?,
        })
    }
}

impl StoredRecord for BlobRecord {
    const KEY_COLUMN: &'static str = "description";
    const COLUMNS: &'static [&'static str] = &["description", "content"];
    const LISTING_COLUMNS: &'static [&'static str] = &["description"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.description.clone()),
            self.content.clone().map_or(Value::Null, Value::Text),
        ]
    }

    fn from_row(row: &Row<'_>, columns: &[&str]) -> rusqlite::Result<Self> {
        let content = if columns.contains(&"content") {
            row.get("content")?
        } else {
            None
        };
        Ok(Self {
            meta: read_meta(row)?,
            description: row.get("description")?,
            content,
        })
    }
}
