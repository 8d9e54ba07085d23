use crate::kind::RecordKind;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Bookkeeping fields shared by every record kind.
///
/// `id` is assigned by whichever store holds the record and is not
/// comparable across stores. `overwrite` is a request flag only: it travels
/// on uploads and is never written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub overwrite: bool,
}

/// A storable secret record.
///
/// Implementors are plain serde structs; the vault, the reconciler and the
/// remote store only talk to records through this trait.
pub trait Record:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: RecordKind;

    /// The field that identifies the record within its owner's collection.
    fn unique_key(&self) -> &str;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Fields that hold ciphertext once the record leaves the client.
    fn secret_fields_mut(&mut self) -> Vec<&mut String>;

    fn updated_at(&self) -> DateTime<Utc> {
        self.meta().updated_at
    }

    /// Result of a remote-wins merge of `remote` over `self`.
    fn adopt_remote(&self, remote: &Self) -> Self {
        remote.clone()
    }

    /// Copy of `self` suitable for replaying to the remote store.
    fn for_push(&self) -> Self {
        let mut out = self.clone();
        out.meta_mut().overwrite = true;
        out
    }
}
