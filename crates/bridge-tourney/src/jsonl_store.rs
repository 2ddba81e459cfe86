//! Append-only action log backed by a JSON-lines file.

use bridge_core::model::ids::HandId;
use bridge_core::store::{EventStore, LoggedAction, StoreError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct StoredAction {
    tournament: String,
    hand: HandId,
    #[serde(flatten)]
    action: LoggedAction,
}

/// One line per accepted action, across all hands. Lines carry the
/// tournament id, so several tournaments can share a file; on open only the
/// lines of the given tournament are indexed for replay.
pub struct JsonlStore {
    path: PathBuf,
    tournament: String,
    inner: Mutex<Inner>,
}

struct Inner {
    file: File,
    logs: HashMap<HandId, Vec<LoggedAction>>,
}

impl JsonlStore {
    pub fn open(path: impl AsRef<Path>, tournament: impl Into<String>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let tournament = tournament.into();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut logs: HashMap<HandId, Vec<LoggedAction>> = HashMap::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let stored: StoredAction = serde_json::from_str(&line)?;
                if stored.tournament != tournament {
                    continue;
                }
                logs.entry(stored.hand).or_default().push(stored.action);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            tournament,
            inner: Mutex::new(Inner { file, logs }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventStore for JsonlStore {
    fn append(&self, hand: HandId, action: &LoggedAction) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let expected = inner.logs.get(&hand).map_or(0, |log| log.len() as u64);
        if action.sequence != expected {
            return Err(StoreError::Sequence {
                hand,
                expected,
                actual: action.sequence,
            });
        }

        let mut line = serde_json::to_vec(&StoredAction {
            tournament: self.tournament.clone(),
            hand,
            action: *action,
        })?;
        line.push(b'\n');
        inner.file.write_all(&line)?;
        inner.file.sync_data()?;
        inner.logs.entry(hand).or_default().push(*action);
        Ok(())
    }

    fn load(&self, hand: HandId) -> Result<Vec<LoggedAction>, StoreError> {
        Ok(self
            .inner
            .lock()
            .logs
            .get(&hand)
            .cloned()
            .unwrap_or_default())
    }
}
