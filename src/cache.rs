// Local snapshot of the authoritative list, kept between sessions
use crate::model::{Event, EventTime, Priority};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The single storage key the snapshot lives under.
pub const SNAPSHOT_KEY: &str = "events";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("snapshot io error at `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed snapshot: {0}")]
    Decoding(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ExtendedProps {
    #[serde(default, deserialize_with = "crate::model::event::priority_or_low")]
    priority: Priority,
}

/// On-disk shape: calendar widgets keep custom fields under `extendedProps`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRecord {
    id: String,
    title: String,
    #[serde(default)]
    start: Option<EventTime>,
    #[serde(default)]
    end: Option<EventTime>,
    #[serde(default)]
    all_day: bool,
    #[serde(default)]
    extended_props: ExtendedProps,
}

impl From<&Event> for SnapshotRecord {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            start: event.start,
            end: event.end,
            all_day: event.all_day,
            extended_props: ExtendedProps {
                priority: event.priority,
            },
        }
    }
}

impl From<SnapshotRecord> for Event {
    fn from(record: SnapshotRecord) -> Self {
        Event {
            id: record.id,
            title: record.title,
            start: record.start,
            end: record.end,
            all_day: record.all_day,
            priority: record.extended_props.priority,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{SNAPSHOT_KEY}.json"))
    }

    pub fn save(&self, events: &[Event]) -> Result<(), CacheError> {
        let records: Vec<SnapshotRecord> = events.iter().map(SnapshotRecord::from).collect();
        let json = serde_json::to_string_pretty(&records)?;
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;
        atomic_write(&self.path(), json)
    }

    /// A missing snapshot is an empty list; a present but unreadable one is an error.
    pub fn load(&self) -> Result<Vec<Event>, CacheError> {
        let path = self.path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&path).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<SnapshotRecord> = serde_json::from_str(&json)?;
        Ok(records.into_iter().map(Event::from).collect())
    }
}

/// Write to a `.tmp` sibling, then rename over the target.
fn atomic_write(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), CacheError> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents).map_err(|source| CacheError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })
}
