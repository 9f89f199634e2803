//! Storage layer
//!
//! Everything the mirror keeps on disk, under one root directory:
//!
//! - **Snapshots**: `old/`, `new/` and `tmp/`, one `<name>.md` file per topic
//! - **Topic Index**: `topics.json`, the identities of the known topics

pub mod error;
pub mod index;
pub mod snapshot;

pub use error::{StorageError, StorageResult};
pub use index::TopicIndex;
pub use snapshot::{Snapshot, SnapshotStore, TOPIC_EXTENSION};
