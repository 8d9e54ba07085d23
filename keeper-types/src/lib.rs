//! Core types for Keeper.
//!
//! Defines the four record kinds a user can store, the [`Record`] trait the
//! vault, reconciler and remote store are generic over, and the millisecond
//! logical clock every record carries.

mod clock;
mod kind;
mod record;
mod records;

pub use clock::{is_unset, now_millis, truncate_millis};
pub use kind::RecordKind;
pub use record::{Record, RecordMeta};
pub use records::{BlobRecord, BlobSelector, CardSecret, Credentials, LoginSecret, TextSecret};
