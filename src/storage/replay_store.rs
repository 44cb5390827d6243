//! A persistent replay cache: an append-only log of seen tags on disk,
//! replayed into an in-memory `HashSet` at startup, grounded on the
//! teacher's `storage::cache::Cache` (`Arc<RwLock<HashMap<..>>>`) shape but
//! backed by a file instead of held purely in memory.
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use thiserror::Error;

use crate::sphinx::replay::{ReplayCache, ReplayTag};

#[derive(Debug, Error)]
pub enum ReplayStoreError {
    #[error("failed to create parent directory for {0:?}: {1}")]
    CreateDir(PathBuf, std::io::Error),
    #[error("failed to open replay log at {0:?}: {1}")]
    Open(PathBuf, std::io::Error),
    #[error("failed to read replay log at {0:?}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("corrupt replay log entry at {0:?}: expected 64 hex characters")]
    CorruptEntry(PathBuf),
}

/// A `ReplayCache` backed by an append-only file of hex-encoded tags, one
/// per line. Rebuilds its in-memory index from the file on [`open`].
pub struct FileReplayStore {
    path: PathBuf,
    seen: RwLock<HashSet<ReplayTag>>,
    file: Mutex<File>,
}

impl FileReplayStore {
    /// Opens (creating if absent) the replay log at `path`, replaying any
    /// existing entries into memory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReplayStoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ReplayStoreError::CreateDir(parent.to_path_buf(), e))?;
            }
        }

        let mut seen = HashSet::new();
        if path.exists() {
            let reader = File::open(&path).map_err(|e| ReplayStoreError::Open(path.clone(), e))?;
            for line in BufReader::new(reader).lines() {
                let line = line.map_err(|e| ReplayStoreError::Read(path.clone(), e))?;
                if line.is_empty() {
                    continue;
                }
                seen.insert(decode_tag(&line, &path)?);
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ReplayStoreError::Open(path.clone(), e))?;

        Ok(Self { path, seen: RwLock::new(seen), file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.seen.read().expect("replay store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn decode_tag(line: &str, path: &Path) -> Result<ReplayTag, ReplayStoreError> {
    let bytes = hex::decode(line.trim()).map_err(|_| ReplayStoreError::CorruptEntry(path.to_path_buf()))?;
    bytes.try_into().map_err(|_| ReplayStoreError::CorruptEntry(path.to_path_buf()))
}

impl ReplayCache for FileReplayStore {
    fn has_seen(&self, tag: &ReplayTag) -> bool {
        self.seen.read().expect("replay store lock poisoned").contains(tag)
    }

    fn mark_seen(&self, tag: &ReplayTag) {
        self.check_and_mark(tag);
    }

    fn flush(&self) {
        self.seen.write().expect("replay store lock poisoned").clear();
        let mut file = self.file.lock().expect("replay log file lock poisoned");
        let _ = file.set_len(0);
    }

    fn check_and_mark(&self, tag: &ReplayTag) -> bool {
        let mut seen = self.seen.write().expect("replay store lock poisoned");
        let newly_inserted = seen.insert(*tag);
        drop(seen);
        if !newly_inserted {
            return true;
        }

        let mut file = self.file.lock().expect("replay log file lock poisoned");
        let _ = writeln!(file, "{}", hex::encode(tag));
        let _ = file.flush();
        false
    }
}
