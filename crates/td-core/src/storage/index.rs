//! Topic Index persistence
//!
//! `topics.json` lists the identity (id, name) of every topic known to the
//! mirror. Bodies never go in here; the file is rewritten as a whole on
//! every change using an atomic write (temp file, then rename).

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{StorageError, StorageResult};
use crate::models::Topic;

/// The local list of topic identities
#[derive(Debug, Clone)]
pub struct TopicIndex {
    path: PathBuf,
    topics: Vec<Topic>,
}

impl TopicIndex {
    /// Load the index at `path`
    ///
    /// A missing or empty file is an empty index.
    pub fn load(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let body = match fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(StorageError::from_read(e, path)),
        };

        let topics = if body.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&body).map_err(|e| StorageError::InvalidIndex {
                path: path.clone(),
                details: e.to_string(),
            })?
        };

        Ok(Self { path, topics })
    }

    /// An index holding `topics`, not yet saved
    pub fn from_topics(path: impl Into<PathBuf>, topics: &[Topic]) -> Self {
        Self {
            path: path.into(),
            topics: topics.iter().map(Topic::identity).collect(),
        }
    }

    /// Write the whole index to disk
    pub fn save(&self) -> StorageResult<()> {
        let body = serde_json::to_vec(&self.topics).map_err(|e| StorageError::InvalidIndex {
            path: self.path.clone(),
            details: e.to_string(),
        })?;
        debug!(path = ?self.path, topics = self.topics.len(), "saving topic index");
        atomic_write(&self.path, &body)
    }

    /// Path of the index file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, in stored order
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// All topic names, in stored order
    pub fn names(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Look up a topic by name
    pub fn get(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add a topic, replacing any entry with the same name
    pub fn insert(&mut self, topic: &Topic) {
        let identity = topic.identity();
        match self.topics.iter_mut().find(|t| t.name == identity.name) {
            Some(existing) => *existing = identity,
            None => self.topics.push(identity),
        }
    }

    /// Remove a topic by name, returning it
    pub fn remove(&mut self, name: &str) -> Option<Topic> {
        let pos = self.topics.iter().position(|t| t.name == name)?;
        Some(self.topics.remove(pos))
    }

    /// Rename an entry in place; returns false if `old` is unknown
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        match self.topics.iter_mut().find(|t| t.name == old) {
            Some(topic) => {
                topic.name = new.to_string();
                true
            }
            None => false,
        }
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = path.with_extension("json.tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::RenameFailed {
        from: temp_path,
        to: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<Topic> {
        vec![
            Topic::new("1", "topic1").with_contents("1111"),
            Topic::new("2", "topic2").with_contents("2222"),
        ]
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let index = TopicIndex::load(temp_dir.path().join("topics.json")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_load_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("topics.json");
        fs::write(&path, "").unwrap();

        assert!(TopicIndex::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("topics.json");
        fs::write(&path, "{not json").unwrap();

        let err = TopicIndex::load(&path).unwrap_err();
        assert!(matches!(err, StorageError::InvalidIndex { .. }));
    }

    #[test]
    fn test_save_clears_contents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("topics.json");

        let mut topics = sample();
        topics[0].markdown = "<p>1111</p>".to_string();
        TopicIndex::from_topics(&path, &topics).save().unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"[{"id":"1","name":"topic1"},{"id":"2","name":"topic2"}]"#);
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = TopicIndex::load(&path).unwrap();
        assert_eq!(loaded.names(), vec!["topic1", "topic2"]);
        assert_eq!(loaded.get("topic2").unwrap().id, "2");
        assert!(loaded.topics().iter().all(|t| t.contents.is_empty()));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("topics.json");

        TopicIndex::from_topics(&path, &sample()).save().unwrap();
        assert_eq!(TopicIndex::load(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_insert_remove_rename() {
        let temp_dir = TempDir::new().unwrap();
        let mut index = TopicIndex::from_topics(temp_dir.path().join("topics.json"), &sample());

        index.insert(&Topic::new("3", "topic3").with_contents("body"));
        assert_eq!(index.len(), 3);
        assert!(index.get("topic3").unwrap().contents.is_empty());

        // Same name replaces rather than duplicating
        index.insert(&Topic::new("33", "topic3"));
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("topic3").unwrap().id, "33");

        assert!(index.rename("topic1", "first"));
        assert!(!index.rename("missing", "x"));
        assert!(index.contains("first"));
        assert!(!index.contains("topic1"));

        let removed = index.remove("topic2").unwrap();
        assert_eq!(removed.id, "2");
        assert!(index.remove("topic2").is_none());
        assert_eq!(index.names(), vec!["first", "topic3"]);
    }
}
