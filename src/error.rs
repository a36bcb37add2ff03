use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that abort stream startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    /// The container the stream attaches photos to does not exist.
    #[error("mount point `{0}` not found on the render surface")]
    MissingMountPoint(String),

    /// A zero stagger would refill the stream without pause.
    #[error("stagger delay must be positive")]
    ZeroStagger,

    #[error("animation duration must be positive")]
    ZeroDuration,

    /// The initial batch would be scheduled past the end of stream time.
    #[error("{count} photos staggered by {stagger:?} do not fit in stream time")]
    ScheduleOverflow { count: usize, stagger: Duration },
}

/// A photo or audio asset could not be loaded. Always recoverable.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The asset file does not exist.
    #[error("asset missing: {}", .0.display())]
    Missing(PathBuf),

    /// The asset exists but could not be decoded.
    #[error("asset {} could not be decoded: {reason}", path.display())]
    Undecodable { path: PathBuf, reason: String },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The audio backend refused to start playback.
#[derive(Debug, Error)]
#[error("playback refused: {0}")]
pub struct PlaybackError(pub String);

/// Directory scanning errors.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The configured photos folder is missing or not a directory.
    #[error("invalid photo directory: {}", .0.display())]
    BadDir(PathBuf),
}

/// Rejected quote sets for the lightbox.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteSetError {
    #[error("quote set must contain at least one quote")]
    Empty,

    #[error("quote {0} is blank")]
    Blank(usize),
}
