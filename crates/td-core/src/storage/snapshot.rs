//! Snapshot directories
//!
//! The mirror keeps three snapshots side by side, each a flat directory with
//! one `<name>.md` file per topic holding that topic's contents verbatim:
//!
//! - `old` - the baseline, last contents known to match the server
//! - `new` - the working copy the user edits
//! - `tmp` - staging area rebuilt on every fetch
//!
//! Replacing a whole snapshot builds the new contents in a sibling
//! `<dir>.partial` directory and swaps it in with two renames, so a crash
//! leaves either the old or the new contents in place. [`SnapshotStore::initialize`]
//! finishes or discards an interrupted swap.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{StorageError, StorageResult};

/// File extension of every topic file
pub const TOPIC_EXTENSION: &str = "md";

/// One of the three snapshot directories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Snapshot {
    /// Last contents confirmed to match the server
    Baseline,
    /// The user's editable copy
    Working,
    /// Scratch area used while fetching
    Staging,
}

impl Snapshot {
    /// All snapshots, in creation order
    pub const ALL: [Snapshot; 3] = [Snapshot::Baseline, Snapshot::Working, Snapshot::Staging];

    /// Directory name inside the mirror root
    pub fn dir_name(self) -> &'static str {
        match self {
            Snapshot::Baseline => "old",
            Snapshot::Working => "new",
            Snapshot::Staging => "tmp",
        }
    }
}

/// Directory-backed key/value store: topic name to topic contents
///
/// Holds no state besides the mirror root; every call goes to disk.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at the mirror directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The mirror root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a snapshot
    pub fn path(&self, snapshot: Snapshot) -> PathBuf {
        self.root.join(snapshot.dir_name())
    }

    /// Path of a topic file inside a snapshot
    pub fn topic_path(&self, snapshot: Snapshot, name: &str) -> PathBuf {
        self.path(snapshot)
            .join(format!("{}.{}", name, TOPIC_EXTENSION))
    }

    /// Make sure the three snapshot directories exist with owner-only permissions
    ///
    /// Idempotent. Also completes or discards a snapshot swap that was
    /// interrupted by a crash.
    pub fn initialize(&self) -> StorageResult<()> {
        ensure_dir(&self.root)?;
        for snapshot in Snapshot::ALL {
            self.recover(snapshot)?;
            ensure_dir(&self.path(snapshot))?;
        }
        Ok(())
    }

    /// Create or overwrite `<name>.md` in a snapshot
    pub fn write_topic(&self, snapshot: Snapshot, name: &str, contents: &str) -> StorageResult<()> {
        let path = self.topic_path(snapshot, name);
        debug!(?snapshot, name, bytes = contents.len(), "writing topic");
        fs::write(&path, contents).map_err(|e| StorageError::from_io(e, path))
    }

    /// Read a topic as text; `None` when the file does not exist
    pub fn read_topic(&self, snapshot: Snapshot, name: &str) -> StorageResult<Option<String>> {
        let path = self.topic_path(snapshot, name);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_read(e, path)),
        }
    }

    /// Read a topic's raw bytes; `None` when the file does not exist
    pub fn read_topic_bytes(&self, snapshot: Snapshot, name: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.topic_path(snapshot, name);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_read(e, path)),
        }
    }

    /// List topic names in a snapshot, in directory order
    ///
    /// A snapshot directory that does not exist yet lists as empty.
    pub fn read_snapshot_names(&self, snapshot: Snapshot) -> StorageResult<Vec<String>> {
        let dir = self.path(snapshot);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from_read(e, dir)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::from_read(e, dir.clone()))?;
            let file_type = entry
                .file_type()
                .map_err(|e| StorageError::from_read(e, entry.path()))?;
            if !file_type.is_file() {
                continue;
            }
            match topic_name(&entry.path()) {
                Some(name) => names.push(name),
                None => debug!(path = ?entry.path(), "skipping non-topic file"),
            }
        }
        Ok(names)
    }

    /// Remove everything in a snapshot, leaving it empty
    pub fn clear(&self, snapshot: Snapshot) -> StorageResult<()> {
        let dir = self.path(snapshot);
        remove_dir_if_exists(&dir)?;
        ensure_dir(&dir)
    }

    /// Make `dest` an exact copy of `source`
    ///
    /// The copy is assembled in `<dest>.partial` first; the live directory is
    /// then retired and the partial one renamed into its place.
    pub fn replace_snapshot(&self, dest: Snapshot, source: Snapshot) -> StorageResult<()> {
        if dest == source {
            return Ok(());
        }

        let live = self.path(dest);
        let partial = sibling(&live, "partial");
        let retired = sibling(&live, "retired");

        remove_dir_if_exists(&partial)?;
        ensure_dir(&partial)?;
        let copied = copy_files(&self.path(source), &partial)?;

        if live.exists() {
            rename(&live, &retired)?;
        }
        rename(&partial, &live)?;
        remove_dir_if_exists(&retired)?;

        debug!(?dest, ?source, files = copied, "replaced snapshot");
        Ok(())
    }

    /// Copy one topic file from `from` into `snapshot`
    ///
    /// A topic missing from `from` is removed from `snapshot`, so the two
    /// agree on that topic afterwards either way.
    pub fn copy_topic(&self, snapshot: Snapshot, name: &str, from: Snapshot) -> StorageResult<()> {
        let src = self.topic_path(from, name);
        let dst = self.topic_path(snapshot, name);
        match fs::copy(&src, &dst) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound && !src.exists() => {
                self.remove_topic(snapshot, name)
            }
            Err(e) => Err(StorageError::from_io(e, dst)),
        }
    }

    /// Remove a topic file; a missing file is not an error
    pub fn remove_topic(&self, snapshot: Snapshot, name: &str) -> StorageResult<()> {
        let path = self.topic_path(snapshot, name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_io(e, path)),
        }
    }

    /// Rename a topic file inside a snapshot; a missing file is not an error
    pub fn rename_topic(&self, snapshot: Snapshot, old: &str, new: &str) -> StorageResult<()> {
        let from = self.topic_path(snapshot, old);
        if !from.exists() {
            return Ok(());
        }
        rename(&from, &self.topic_path(snapshot, new))
    }

    /// Remove the whole mirror directory
    pub fn destroy(&self) -> StorageResult<()> {
        remove_dir_if_exists(&self.root)
    }

    /// Finish or discard an interrupted [`replace_snapshot`](Self::replace_snapshot)
    fn recover(&self, snapshot: Snapshot) -> StorageResult<()> {
        let live = self.path(snapshot);
        let partial = sibling(&live, "partial");
        let retired = sibling(&live, "retired");

        // The partial directory is only renamed once fully written, so if the
        // live one is gone the partial one is complete.
        if !live.exists() && partial.exists() {
            debug!(?snapshot, "restoring interrupted snapshot swap");
            rename(&partial, &live)?;
        }
        remove_dir_if_exists(&partial)?;
        remove_dir_if_exists(&retired)
    }
}

/// Topic name of a snapshot file, if it is one
fn topic_name(path: &Path) -> Option<String> {
    if path.extension()? != TOPIC_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(stem.to_string())
}

/// `<dir>.<suffix>` next to `dir`
fn sibling(dir: &Path, suffix: &str) -> PathBuf {
    let mut name = dir.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    dir.with_file_name(name)
}

/// Copy every regular file of `source` into `dest`, returning how many
fn copy_files(source: &Path, dest: &Path) -> StorageResult<usize> {
    let entries = fs::read_dir(source).map_err(|e| StorageError::from_read(e, source.into()))?;

    let mut copied = 0;
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::from_read(e, source.into()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let target = dest.join(entry.file_name());
        fs::copy(&path, &target).map_err(|e| StorageError::from_io(e, target))?;
        copied += 1;
    }
    Ok(copied)
}

fn rename(from: &Path, to: &Path) -> StorageResult<()> {
    fs::rename(from, to).map_err(|source| StorageError::RenameFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

fn remove_dir_if_exists(dir: &Path) -> StorageResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::from_io(e, dir.to_path_buf())),
    }
}

/// Create a directory (and parents) and restrict it to its owner
fn ensure_dir(dir: &Path) -> StorageResult<()> {
    fs::create_dir_all(dir).map_err(|source| StorageError::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| StorageError::from_io(e, dir.to_path_buf()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> SnapshotStore {
        let store = SnapshotStore::new(temp_dir.path().join("mirror"));
        store.initialize().unwrap();
        store
    }

    fn names(store: &SnapshotStore, snapshot: Snapshot) -> BTreeSet<String> {
        store.read_snapshot_names(snapshot).unwrap().into_iter().collect()
    }

    #[test]
    fn test_initialize_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        for snapshot in Snapshot::ALL {
            assert!(store.path(snapshot).is_dir());
        }
        assert!(store.path(Snapshot::Baseline).ends_with("old"));
        assert!(store.path(Snapshot::Working).ends_with("new"));
        assert!(store.path(Snapshot::Staging).ends_with("tmp"));
    }

    #[cfg(unix)]
    #[test]
    fn test_initialize_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        let mode = fs::metadata(store.path(Snapshot::Working))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        store.write_topic(Snapshot::Working, "a", "x").unwrap();

        store.initialize().unwrap();

        assert_eq!(
            store.read_topic(Snapshot::Working, "a").unwrap().as_deref(),
            Some("x")
        );
    }

    #[test]
    fn test_write_and_read_topic() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        store.write_topic(Snapshot::Working, "notes", "line 1\nline 2\n").unwrap();

        let path = store.topic_path(Snapshot::Working, "notes");
        assert!(path.ends_with("new/notes.md"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "line 1\nline 2\n");
        assert_eq!(
            store.read_topic(Snapshot::Working, "notes").unwrap().as_deref(),
            Some("line 1\nline 2\n")
        );
        assert!(store.read_topic(Snapshot::Baseline, "notes").unwrap().is_none());
    }

    #[test]
    fn test_write_topic_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        store.write_topic(Snapshot::Baseline, "a", "first").unwrap();
        store.write_topic(Snapshot::Baseline, "a", "second").unwrap();

        assert_eq!(
            store.read_topic(Snapshot::Baseline, "a").unwrap().as_deref(),
            Some("second")
        );
    }

    #[test]
    fn test_write_topic_missing_snapshot_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("never-initialized"));

        let err = store.write_topic(Snapshot::Working, "a", "x").unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_read_snapshot_names_strips_extension() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        store.write_topic(Snapshot::Working, "a", "").unwrap();
        store.write_topic(Snapshot::Working, "v1.2", "x").unwrap();
        fs::write(store.path(Snapshot::Working).join("stray.txt"), "x").unwrap();
        fs::create_dir(store.path(Snapshot::Working).join("sub.md")).unwrap();

        let expected: BTreeSet<String> = ["a", "v1.2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names(&store, Snapshot::Working), expected);
    }

    #[test]
    fn test_read_snapshot_names_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path().join("nothing"));

        assert!(store.read_snapshot_names(Snapshot::Baseline).unwrap().is_empty());
    }

    #[test]
    fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        store.write_topic(Snapshot::Staging, "a", "x").unwrap();

        store.clear(Snapshot::Staging).unwrap();

        assert!(store.path(Snapshot::Staging).is_dir());
        assert!(names(&store, Snapshot::Staging).is_empty());
    }

    #[test]
    fn test_replace_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        store.write_topic(Snapshot::Baseline, "gone", "old").unwrap();
        store.write_topic(Snapshot::Baseline, "a", "stale").unwrap();
        store.write_topic(Snapshot::Staging, "a", "fresh").unwrap();
        store.write_topic(Snapshot::Staging, "b", "").unwrap();

        store.replace_snapshot(Snapshot::Baseline, Snapshot::Staging).unwrap();

        let expected: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names(&store, Snapshot::Baseline), expected);
        assert_eq!(
            store.read_topic(Snapshot::Baseline, "a").unwrap().as_deref(),
            Some("fresh")
        );
        assert_eq!(
            store.read_topic(Snapshot::Baseline, "b").unwrap().as_deref(),
            Some("")
        );
        // Source untouched, no swap leftovers
        assert_eq!(names(&store, Snapshot::Staging), expected);
        assert!(!sibling(&store.path(Snapshot::Baseline), "partial").exists());
        assert!(!sibling(&store.path(Snapshot::Baseline), "retired").exists());
    }

    #[test]
    fn test_replace_snapshot_with_itself() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        store.write_topic(Snapshot::Working, "a", "x").unwrap();

        store.replace_snapshot(Snapshot::Working, Snapshot::Working).unwrap();

        assert_eq!(
            store.read_topic(Snapshot::Working, "a").unwrap().as_deref(),
            Some("x")
        );
    }

    #[test]
    fn test_recover_completed_partial() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);

        // Crash right after the live directory was retired
        let live = store.path(Snapshot::Baseline);
        let partial = sibling(&live, "partial");
        let retired = sibling(&live, "retired");
        fs::create_dir(&partial).unwrap();
        fs::write(partial.join("a.md"), "new").unwrap();
        fs::rename(&live, &retired).unwrap();

        store.initialize().unwrap();

        assert_eq!(
            store.read_topic(Snapshot::Baseline, "a").unwrap().as_deref(),
            Some("new")
        );
        assert!(!partial.exists());
        assert!(!retired.exists());
    }

    #[test]
    fn test_recover_discards_incomplete_partial() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        store.write_topic(Snapshot::Working, "a", "kept").unwrap();

        // Crash while the partial directory was still being filled
        let partial = sibling(&store.path(Snapshot::Working), "partial");
        fs::create_dir(&partial).unwrap();
        fs::write(partial.join("b.md"), "half").unwrap();

        store.initialize().unwrap();

        assert!(!partial.exists());
        assert_eq!(
            store.read_snapshot_names(Snapshot::Working).unwrap(),
            vec!["a".to_string()]
        );
    }

    #[test]
    fn test_copy_topic() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        store.write_topic(Snapshot::Working, "a", "edited").unwrap();
        store.write_topic(Snapshot::Baseline, "a", "original").unwrap();

        store.copy_topic(Snapshot::Baseline, "a", Snapshot::Working).unwrap();

        assert_eq!(
            store.read_topic(Snapshot::Baseline, "a").unwrap().as_deref(),
            Some("edited")
        );
    }

    #[test]
    fn test_copy_missing_topic_removes_destination() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        store.write_topic(Snapshot::Baseline, "a", "original").unwrap();

        store.copy_topic(Snapshot::Baseline, "a", Snapshot::Working).unwrap();

        assert!(store.read_topic(Snapshot::Baseline, "a").unwrap().is_none());
    }

    #[test]
    fn test_remove_and_rename_topic() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        store.write_topic(Snapshot::Working, "a", "x").unwrap();

        store.rename_topic(Snapshot::Working, "a", "b").unwrap();
        assert!(store.read_topic(Snapshot::Working, "a").unwrap().is_none());
        assert_eq!(
            store.read_topic(Snapshot::Working, "b").unwrap().as_deref(),
            Some("x")
        );

        // Missing files are fine for both
        store.rename_topic(Snapshot::Baseline, "a", "b").unwrap();
        store.remove_topic(Snapshot::Working, "b").unwrap();
        store.remove_topic(Snapshot::Working, "b").unwrap();
        assert!(names(&store, Snapshot::Working).is_empty());
    }

    #[test]
    fn test_destroy() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        store.write_topic(Snapshot::Working, "a", "x").unwrap();

        store.destroy().unwrap();
        assert!(!store.root().exists());

        // Destroying twice is fine
        store.destroy().unwrap();
    }
}
