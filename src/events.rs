use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::AssetError;

/// Sequence number of a stream entry. Assigned at spawn, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle notifications emitted by the stream scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum StreamEvent {
    Spawned {
        id: EntryId,
        #[serde(with = "humantime_serde")]
        at: Duration,
        photo: Option<String>,
        source: Option<PathBuf>,
        #[serde(with = "humantime_serde")]
        delay: Duration,
        #[serde(with = "humantime_serde")]
        removal_at: Duration,
    },
    Removed {
        id: EntryId,
        #[serde(with = "humantime_serde")]
        at: Duration,
    },
    Suppressed {
        id: EntryId,
        #[serde(with = "humantime_serde")]
        at: Duration,
    },
    Stopped {
        #[serde(with = "humantime_serde")]
        at: Duration,
    },
}

/// Request for the loader to probe one photo asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAsset {
    pub id: EntryId,
    pub path: PathBuf,
}

/// Completion of an asset probe. May arrive after the entry was removed.
#[derive(Debug)]
pub enum AssetEvent {
    Loaded { id: EntryId, width: u32, height: u32 },
    Failed { id: EntryId, error: AssetError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(String),
}

/// Discrete user interactions delivered to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    PhotoClicked(EntryId),
    CloseClicked,
    OverlayClicked { on_image: bool },
    KeyPressed(Key),
    ToggleMusic,
    StopStream,
}
