//! Mirror engine
//!
//! Keeps the local mirror and the server in step:
//!
//! - **fetch** (server to local) refuses to run while the working snapshot
//!   has unpushed edits, then rebuilds staging and promotes it into both
//!   baseline and working.
//! - **push** (local to server) sends each topic on its own and promotes
//!   into the baseline only the topics the server confirmed. Failures are
//!   collected, never fatal, and stay pending for the next push.
//! - **create / delete / rename** make one server call and touch the index
//!   and the baseline/working files only once the server has confirmed.
//!
//! Operations run synchronously, one at a time. Nothing guards against two
//! processes sharing a mirror directory.
//!
//! ## Usage
//!
//! ```ignore
//! let config = Config::load()?;
//! let server = HttpTopicServer::from_config(&config)?;
//! let mirror = Mirror::new(&config, server);
//! mirror.initialize()?;
//! mirror.fetch()?;
//! let report = mirror.push()?;
//! ```

mod error;
mod suggest;

pub use error::{MirrorError, MirrorResult};
pub use suggest::similar_names;

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::changes::changed_topics;
use crate::config::Config;
use crate::models::{PushReport, Topic};
use crate::remote::{RemoteError, TopicServer};
use crate::storage::{Snapshot, SnapshotStore, TopicIndex};

/// The local mirror of a server's topics
pub struct Mirror<S> {
    server: S,
    store: SnapshotStore,
    index_path: PathBuf,
}

impl<S: TopicServer> Mirror<S> {
    /// Create a mirror at the configured location
    pub fn new(config: &Config, server: S) -> Self {
        Self {
            server,
            store: SnapshotStore::new(config.mirror_dir.clone()),
            index_path: config.topics_path(),
        }
    }

    /// The snapshot directories
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// The server collaborator
    pub fn server(&self) -> &S {
        &self.server
    }

    /// Load the Topic Index
    pub fn index(&self) -> MirrorResult<TopicIndex> {
        Ok(TopicIndex::load(&self.index_path)?)
    }

    /// Create the snapshot directories if needed; safe to call every run
    pub fn initialize(&self) -> MirrorResult<()> {
        self.store.initialize()?;
        debug!(root = ?self.store.root(), "mirror initialized");
        Ok(())
    }

    /// Topics edited locally since the last fetch or push
    pub fn pending_changes(&self) -> MirrorResult<BTreeSet<String>> {
        Ok(changed_topics(
            &self.store,
            Snapshot::Baseline,
            Snapshot::Working,
        )?)
    }

    /// Names of the topics in the working snapshot
    pub fn list_local_topics(&self) -> MirrorResult<Vec<String>> {
        Ok(self.store.read_snapshot_names(Snapshot::Working)?)
    }

    /// Replace the local mirror with the server's topics
    ///
    /// Fails with [`MirrorError::PendingChanges`] without touching anything
    /// when the working snapshot has unpushed edits. Returns the new index
    /// entries.
    pub fn fetch(&self) -> MirrorResult<Vec<Topic>> {
        let pending = self.pending_changes()?;
        if !pending.is_empty() {
            return Err(MirrorError::PendingChanges {
                topics: pending.into_iter().collect(),
            });
        }

        let topics = self.server.list_topics()?;
        check_listing(&topics)?;
        info!(count = topics.len(), "fetched topics");

        self.store.clear(Snapshot::Staging)?;
        for topic in &topics {
            self.store
                .write_topic(Snapshot::Staging, &topic.name, &topic.contents)?;
        }

        // Not crash-atomic across the two snapshots: a crash in between
        // leaves baseline and working divergent
        self.store
            .replace_snapshot(Snapshot::Baseline, Snapshot::Staging)?;
        self.store
            .replace_snapshot(Snapshot::Working, Snapshot::Staging)?;

        let index = TopicIndex::from_topics(&self.index_path, &topics);
        index.save()?;
        Ok(index.topics().to_vec())
    }

    /// Send every topic of the working snapshot to the server
    ///
    /// Topics the server confirms are promoted into the baseline; the rest
    /// are reported as failed and stay pending. Only failing to read the
    /// index aborts the push.
    pub fn push(&self) -> MirrorResult<PushReport> {
        let index = self.index()?;
        let total = index.len();
        let mut sent = Vec::new();
        let mut failed = Vec::new();

        for (i, topic) in index.topics().iter().enumerate() {
            debug!(name = %topic.name, "pushing {}/{}", i + 1, total);

            let contents = match self.store.read_topic(Snapshot::Working, &topic.name) {
                Ok(contents) => contents.unwrap_or_default(),
                Err(e) => {
                    warn!(name = %topic.name, error = %e, "could not read topic");
                    failed.push(topic.name.clone());
                    continue;
                }
            };

            // Nothing to send; leaves topics created empty on the server alone
            if contents.is_empty() {
                sent.push(topic.name.clone());
                continue;
            }

            match self.server.update_topic(&topic.id, &contents) {
                Ok(_) => sent.push(topic.name.clone()),
                Err(e) => {
                    warn!(name = %topic.name, error = %e, "push failed");
                    failed.push(topic.name.clone());
                }
            }
        }

        let mut pushed = Vec::with_capacity(sent.len());
        for name in sent {
            match self
                .store
                .copy_topic(Snapshot::Baseline, &name, Snapshot::Working)
            {
                Ok(()) => pushed.push(name),
                Err(e) => {
                    warn!(%name, error = %e, "could not promote pushed topic");
                    failed.push(name);
                }
            }
        }

        info!(pushed = pushed.len(), failed = failed.len(), "push finished");
        Ok(PushReport { pushed, failed })
    }

    /// Create a topic on the server and add it, empty, to the mirror
    pub fn create_topic(&self, name: &str) -> MirrorResult<Topic> {
        validate_name(name)?;
        let mut index = self.index()?;
        if index.contains(name) {
            return Err(MirrorError::DuplicateName(name.to_string()));
        }

        let mut topic = self.server.create_topic(name)?;
        if topic.name.is_empty() {
            topic.name = name.to_string();
        }
        validate_name(&topic.name)?;
        // Writing it would clobber the files of the topic holding that name
        if topic.name != name && index.contains(&topic.name) {
            return Err(RemoteError::InvalidResponse {
                details: format!(
                    "asked to create '{}' but the server created '{}', which already exists",
                    name, topic.name
                ),
            }
            .into());
        }

        self.store
            .write_topic(Snapshot::Baseline, &topic.name, &topic.contents)?;
        if let Err(e) = self
            .store
            .write_topic(Snapshot::Working, &topic.name, &topic.contents)
        {
            self.store.remove_topic(Snapshot::Baseline, &topic.name)?;
            return Err(e.into());
        }
        index.insert(&topic);
        index.save()?;

        info!(name = %topic.name, id = %topic.id, "created topic");
        Ok(topic.identity())
    }

    /// Delete a topic on the server and drop it from the mirror
    pub fn delete_topic(&self, name: &str) -> MirrorResult<Topic> {
        let mut index = self.index()?;
        let topic = match index.get(name) {
            Some(topic) => topic.clone(),
            None => return Err(unknown_topic(&index, name)),
        };

        self.server.delete_topic(&topic.id)?;

        for snapshot in [Snapshot::Baseline, Snapshot::Working] {
            self.store.remove_topic(snapshot, name)?;
        }
        index.remove(name);
        index.save()?;

        info!(%name, id = %topic.id, "deleted topic");
        Ok(topic)
    }

    /// Rename a topic on the server, then its index entry and files
    pub fn rename_topic(&self, old_name: &str, new_name: &str) -> MirrorResult<Topic> {
        validate_name(new_name)?;
        let mut index = self.index()?;
        let topic = match index.get(old_name) {
            Some(topic) => topic.clone(),
            None => return Err(unknown_topic(&index, old_name)),
        };
        if old_name == new_name {
            return Ok(topic);
        }
        if index.contains(new_name) {
            return Err(MirrorError::DuplicateName(new_name.to_string()));
        }

        self.server.rename_topic(&topic.id, new_name)?;

        // The server keeps the new name either way; the next fetch picks it up
        self.store
            .rename_topic(Snapshot::Baseline, old_name, new_name)?;
        if let Err(e) = self
            .store
            .rename_topic(Snapshot::Working, old_name, new_name)
        {
            warn!(from = %old_name, to = %new_name, error = %e, "could not rename working copy");
            self.store
                .rename_topic(Snapshot::Baseline, new_name, old_name)?;
            return Err(e.into());
        }
        index.rename(old_name, new_name);
        index.save()?;

        info!(from = %old_name, to = %new_name, "renamed topic");
        Ok(Topic {
            name: new_name.to_string(),
            ..topic
        })
    }

    /// Remove the whole mirror from disk
    pub fn destroy(self) -> MirrorResult<()> {
        self.store.destroy()?;
        info!(root = ?self.store.root(), "mirror removed");
        Ok(())
    }
}

/// Build the "unknown topic" error with suggestions from the index
fn unknown_topic(index: &TopicIndex, name: &str) -> MirrorError {
    let suggestions = similar_names(index.topics().iter().map(|t| t.name.as_str()), name);
    MirrorError::UnknownTopic {
        name: name.to_string(),
        suggestions,
    }
}

/// Topic names become file names, so keep them to a single plain component
fn validate_name(name: &str) -> MirrorResult<()> {
    let reason = if name.is_empty() {
        "the name is empty"
    } else if name.contains(['/', '\\']) {
        "the name contains a path separator"
    } else if name.contains('\0') {
        "the name contains a NUL byte"
    } else if name.starts_with('.') {
        "the name starts with a dot"
    } else {
        return Ok(());
    };

    Err(MirrorError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// A listing is only usable if every name is valid and unique
fn check_listing(topics: &[Topic]) -> MirrorResult<()> {
    let mut seen = HashSet::new();
    for topic in topics {
        if validate_name(&topic.name).is_err() {
            return Err(RemoteError::InvalidResponse {
                details: format!("the server sent an invalid topic name '{}'", topic.name),
            }
            .into());
        }
        if !seen.insert(topic.name.as_str()) {
            return Err(RemoteError::InvalidResponse {
                details: format!("the server sent the topic '{}' twice", topic.name),
            }
            .into());
        }
    }
    Ok(())
}
