//! Change detection between two snapshots
//!
//! A topic counts as changed when its file contents differ byte for byte,
//! or when it exists in only one of the two snapshots. Run over
//! (baseline, working) this yields the topics with unpushed local edits.

use std::collections::BTreeSet;

use tracing::debug;

use crate::storage::{Snapshot, SnapshotStore, StorageResult};

/// Names of the topics that differ between `left` and `right`
pub fn changed_topics(
    store: &SnapshotStore,
    left: Snapshot,
    right: Snapshot,
) -> StorageResult<BTreeSet<String>> {
    let left_names: BTreeSet<String> = store.read_snapshot_names(left)?.into_iter().collect();
    let right_names: BTreeSet<String> = store.read_snapshot_names(right)?.into_iter().collect();

    let mut changed = BTreeSet::new();
    for name in left_names.union(&right_names) {
        if !left_names.contains(name) || !right_names.contains(name) {
            changed.insert(name.clone());
            continue;
        }

        // A file vanishing between listing and reading reads as None, which
        // still compares unequal to a present file
        let left_bytes = store.read_topic_bytes(left, name)?;
        let right_bytes = store.read_topic_bytes(right, name)?;
        if left_bytes != right_bytes {
            changed.insert(name.clone());
        }
    }

    debug!(?left, ?right, changed = changed.len(), "compared snapshots");
    Ok(changed)
}
