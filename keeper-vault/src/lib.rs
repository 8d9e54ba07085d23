//! Local record vault.
//!
//! Each owner gets a directory under the vault base path holding one flat
//! JSON file per record kind. Secret fields arrive already encrypted; the
//! vault never sees plaintext or key material.
//!
//! Writes replace a collection file atomically (temp file + rename), and
//! every read-modify-write of a collection runs under a named lock for that
//! (owner, kind) file, so a user save and a background reconciliation can
//! never interleave and lose an update.

use keeper_types::Record;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, warn};

// ============================================================================
// Error types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("record already exists: {0}")]
    AlreadyExists(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("corrupt collection {path}: {reason}")]
    Decode { path: String, reason: String },
}

pub type VaultResult<T> = Result<T, VaultError>;

// ============================================================================
// Collection locks
// ============================================================================

/// One lock per collection file, shared by every `LocalVault` in the process.
static COLLECTION_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

fn collection_lock(path: &Path) -> VaultResult<Arc<Mutex<()>>> {
    let mut locks = COLLECTION_LOCKS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .map_err(|e| VaultError::Storage(e.to_string()))?;
    Ok(locks
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone())
}

/// Directory name for an owner. Characters outside `[A-Za-z0-9._-]` and a
/// leading dot are replaced; when that happens a hash suffix keeps distinct
/// owners apart.
fn owner_dir_name(owner: &str) -> String {
    let sanitized: String = owner
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-') || (c == '.' && i > 0) {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized == owner && !owner.is_empty() {
        return sanitized;
    }
    let digest = Sha256::digest(owner.as_bytes());
    format!("{sanitized}-{}", &hex::encode(digest)[..12])
}

/// Next local id: highest existing id + 1.
fn next_id<R: Record>(records: &[R]) -> u64 {
    records.iter().map(|r| r.meta().id).max().unwrap_or(0) + 1
}

// ============================================================================
// LocalVault
// ============================================================================

/// The local vault bound to one owner.
#[derive(Debug, Clone)]
pub struct LocalVault {
    base: PathBuf,
    root: PathBuf,
    owner: String,
}

impl LocalVault {
    /// Opens the vault for `owner` under `base`, creating its directory.
    pub fn open(base: impl Into<PathBuf>, owner: &str) -> VaultResult<Self> {
        let base = base.into();
        let root = base.join(owner_dir_name(owner));
        fs::create_dir_all(&root).map_err(|e| VaultError::Storage(e.to_string()))?;
        debug!("opened vault for {owner} at {}", root.display());
        Ok(Self {
            base,
            root,
            owner: owner.to_string(),
        })
    }

    /// Rebinds the vault to another owner's directory.
    pub fn set_root_path(&mut self, owner: &str) -> VaultResult<()> {
        let root = self.base.join(owner_dir_name(owner));
        fs::create_dir_all(&root).map_err(|e| VaultError::Storage(e.to_string()))?;
        self.root = root;
        self.owner = owner.to_string();
        Ok(())
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path<R: Record>(&self) -> PathBuf {
        self.root.join(R::KIND.file_name())
    }

    /// Reads the whole collection. A missing file is an empty collection.
    pub fn load_collection<R: Record>(&self) -> VaultResult<Vec<R>> {
        let path = self.collection_path::<R>();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(VaultError::Storage(e.to_string())),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| VaultError::Decode {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Replaces the whole collection.
    pub fn save_collection<R: Record>(&self, records: &[R]) -> VaultResult<()> {
        let path = self.collection_path::<R>();
        let lock = collection_lock(&path)?;
        let _guard = lock.lock().map_err(|e| VaultError::Storage(e.to_string()))?;
        self.write_collection(&path, records)
    }

    fn write_collection<R: Record>(&self, path: &Path, records: &[R]) -> VaultResult<()> {
        let stored: Vec<R> = records
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.meta_mut().overwrite = false;
                r
            })
            .collect();
        let json =
            serde_json::to_vec_pretty(&stored).map_err(|e| VaultError::Storage(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        tmp.write_all(&json)
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        tmp.persist(path)
            .map_err(|e| VaultError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Runs `f` over the collection while holding its lock, then saves what
    /// `f` returns. Nothing is written when `f` fails.
    pub fn modify_collection<R, T, F>(&self, f: F) -> VaultResult<T>
    where
        R: Record,
        F: FnOnce(Vec<R>) -> VaultResult<(Vec<R>, T)>,
    {
        let path = self.collection_path::<R>();
        let lock = collection_lock(&path)?;
        let _guard = lock.lock().map_err(|e| VaultError::Storage(e.to_string()))?;

        let current = self.load_collection::<R>()?;
        let (updated, out) = f(current)?;
        self.write_collection(&path, &updated)?;
        Ok(out)
    }

    /// Inserts or, when the record's overwrite flag is set, replaces the
    /// record with the same uniqueness key. Returns the stored record.
    ///
    /// New records get the next local id (highest id + 1). Replacements keep
    /// the id of the record they replace.
    pub fn upsert_one<R: Record>(&self, record: R) -> VaultResult<R> {
        Ok(self.upsert_tracked(record)?.0)
    }

    /// Like [`Self::upsert_one`], also returning the record it replaced, if
    /// any, so the caller can undo the write with [`Self::restore_one`].
    pub fn upsert_tracked<R: Record>(&self, record: R) -> VaultResult<(R, Option<R>)> {
        self.modify_collection(|mut records: Vec<R>| {
            let key = record.unique_key().to_string();
            let mut stored = record;
            let overwrite = std::mem::take(&mut stored.meta_mut().overwrite);
            let previous = match records.iter().position(|r| r.unique_key() == key) {
                Some(_) if !overwrite => {
                    return Err(VaultError::AlreadyExists(key));
                }
                Some(idx) => {
                    stored.meta_mut().id = records[idx].meta().id;
                    Some(std::mem::replace(&mut records[idx], stored.clone()))
                }
                None => {
                    stored.meta_mut().id = next_id(&records);
                    records.push(stored.clone());
                    None
                }
            };
            Ok((records, (stored, previous)))
        })
    }

    /// Undoes an upsert of `written`: puts `previous` back, or removes the
    /// record when there was none. Left alone if the stored record no
    /// longer matches `written` (a reconciliation got there first).
    pub fn restore_one<R: Record>(&self, written: &R, previous: Option<R>) -> VaultResult<()> {
        let key = written.unique_key().to_string();
        let clock = written.updated_at();
        self.modify_collection(move |mut records: Vec<R>| {
            let Some(idx) = records.iter().position(|r| r.unique_key() == key) else {
                return Ok((records, ()));
            };
            if records[idx].updated_at() != clock {
                debug!("{key}: changed since write, not restoring");
                return Ok((records, ()));
            }
            match previous {
                Some(prev) => records[idx] = prev,
                None => {
                    records.remove(idx);
                }
            }
            Ok((records, ()))
        })
    }

    /// Looks up one record by uniqueness key.
    pub fn find<R: Record>(&self, key: &str) -> VaultResult<Option<R>> {
        Ok(self
            .load_collection::<R>()?
            .into_iter()
            .find(|r| r.unique_key() == key))
    }

    /// Removes every collection of this owner. Administrative only.
    pub fn clear_all(&self) -> VaultResult<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(VaultError::Storage(e.to_string())),
        }
        warn!("cleared local vault for {}", self.owner);
        fs::create_dir_all(&self.root).map_err(|e| VaultError::Storage(e.to_string()))
    }
}
