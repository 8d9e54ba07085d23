//! Reconciliation for Keeper.
//!
//! A reconciliation pass takes one kind's local collection and the remote
//! snapshot of the same kind and produces the merged local collection plus
//! the records the remote is missing or holds stale. The merge is a pure
//! function; loading, saving and replaying pushes belong to the caller,
//! which runs the merge under the vault's collection lock.

mod reconcile;

pub use reconcile::{reconcile, MergeStats, Reconciliation};
