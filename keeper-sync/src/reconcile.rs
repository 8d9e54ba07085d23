use keeper_types::Record;
use std::collections::HashMap;
use tracing::debug;

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Remote-only records added locally.
    pub adopted: usize,
    /// Local records replaced by a newer remote version.
    pub replaced: usize,
    /// Local records queued for the remote.
    pub pushed: usize,
    /// Records identical in clock on both sides.
    pub unchanged: usize,
}

/// Output of [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<R> {
    /// New local collection: local order, remote-only records appended in
    /// remote order.
    pub merged: Vec<R>,
    /// Records to upload with overwrite set.
    pub push: Vec<R>,
    pub stats: MergeStats,
}

impl<R> Reconciliation<R> {
    pub fn is_converged(&self) -> bool {
        self.push.is_empty() && self.stats.adopted == 0 && self.stats.replaced == 0
    }
}

/// Merges `remote` into `local` by uniqueness key, newest clock wins.
///
/// - key only remote: adopted, with the next local id
/// - remote newer: local record replaced through [`Record::adopt_remote`],
///   keeping its local id
/// - local newer, or key only local: kept, and queued through
///   [`Record::for_push`]
/// - equal clocks: left alone
pub fn reconcile<R: Record>(local: Vec<R>, remote: Vec<R>) -> Reconciliation<R> {
    let mut stats = MergeStats::default();
    let mut push = Vec::new();

    let mut remote_by_key: HashMap<String, R> = HashMap::with_capacity(remote.len());
    let mut remote_order: Vec<String> = Vec::with_capacity(remote.len());
    for r in remote {
        let key = r.unique_key().to_string();
        if remote_by_key.insert(key.clone(), r).is_none() {
            remote_order.push(key);
        }
    }

    // Ids are local to this collection; remote ids are never reused here.
    let mut next_id = local.iter().map(|r| r.meta().id).max().unwrap_or(0) + 1;

    let mut merged = Vec::with_capacity(local.len() + remote_order.len());
    for l in local {
        match remote_by_key.remove(l.unique_key()) {
            None => {
                push.push(l.for_push());
                stats.pushed += 1;
                merged.push(l);
            }
            Some(r) if r.updated_at() > l.updated_at() => {
                let mut replaced = l.adopt_remote(&r);
                replaced.meta_mut().id = l.meta().id;
                merged.push(replaced);
                stats.replaced += 1;
            }
            Some(r) if r.updated_at() < l.updated_at() => {
                push.push(l.for_push());
                stats.pushed += 1;
                merged.push(l);
            }
            Some(_) => {
                stats.unchanged += 1;
                merged.push(l);
            }
        }
    }

    for key in remote_order {
        if let Some(mut r) = remote_by_key.remove(&key) {
            r.meta_mut().id = next_id;
            next_id += 1;
            merged.push(r);
            stats.adopted += 1;
        }
    }

    debug!(
        kind = %R::KIND,
        adopted = stats.adopted,
        replaced = stats.replaced,
        pushed = stats.pushed,
        unchanged = stats.unchanged,
        "reconciled collection"
    );

    Reconciliation {
        merged,
        push,
        stats,
    }
}
