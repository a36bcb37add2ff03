//! Background music toggle.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{AssetError, PlaybackError};

pub trait AudioSink {
    fn set_volume(&mut self, volume: f32);
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Paused,
    Playing,
    /// The track failed to load; the toggle no longer does anything.
    Disabled,
}

pub struct MusicPlayer<A> {
    sink: A,
    state: PlaybackState,
}

impl<A: AudioSink> MusicPlayer<A> {
    pub fn new(mut sink: A, volume: f32) -> Self {
        sink.set_volume(volume);
        Self {
            sink,
            state: PlaybackState::Paused,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn sink(&self) -> &A {
        &self.sink
    }

    /// The track could not be loaded. Playback stays off for the session.
    pub fn disable(&mut self, error: &AssetError) {
        warn!(%error, "background music unavailable");
        if self.state == PlaybackState::Playing {
            self.sink.pause();
        }
        self.state = PlaybackState::Disabled;
    }

    /// Play when paused, pause when playing. A refused play leaves the
    /// toggle paused so the user can try again.
    pub fn toggle(&mut self) -> PlaybackState {
        match self.state {
            PlaybackState::Disabled => debug!("music toggle ignored; track unavailable"),
            PlaybackState::Playing => {
                self.sink.pause();
                self.state = PlaybackState::Paused;
                info!("music paused");
            }
            PlaybackState::Paused => match self.sink.play() {
                Ok(()) => {
                    self.state = PlaybackState::Playing;
                    info!("music playing");
                }
                Err(error) => warn!(%error, "music playback refused"),
            },
        }
        self.state
    }
}

/// Headless sink for the binary: validates the track exists and logs transport calls.
#[derive(Debug, Clone)]
pub struct TracingAudio {
    path: PathBuf,
    volume: f32,
}

impl TracingAudio {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            volume: 1.0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the track is present before offering the toggle.
    pub fn probe(&self) -> Result<(), AssetError> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(AssetError::Missing(self.path.clone()))
        }
    }
}

impl AudioSink for TracingAudio {
    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if !self.path.is_file() {
            return Err(PlaybackError(format!(
                "{} is no longer available",
                self.path.display()
            )));
        }
        debug!(path = %self.path.display(), volume = self.volume, "audio play");
        Ok(())
    }

    fn pause(&mut self) {
        debug!(path = %self.path.display(), "audio pause");
    }
}
