use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

pub use config_model::{AnniversaryConfig, HeartsConfig, LightboxConfig, MusicConfig};

pub const DEFAULT_CONTAINER: &str = "photo-container";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Folder the photo files are resolved against.
    pub photos_folder: PathBuf,
    /// Photo file names inside `photos-folder`. Empty means scan the folder.
    pub photo_files: Vec<String>,
    /// Render-surface container the stream attaches photos to.
    pub container: String,
    /// Number of photos created up front, staggered by `stagger-delay`.
    pub photo_count: usize,
    /// Time one photo takes to traverse the whole spiral.
    #[serde(with = "humantime_serde")]
    pub animation_duration: Duration,
    /// Spacing between consecutive photos, also the refill cadence.
    #[serde(with = "humantime_serde")]
    pub stagger_delay: Duration,
    /// Optional deterministic seed for the catalog shuffle and quote draws.
    pub shuffle_seed: Option<u64>,
    /// Maximum number of image probes the loader runs at once.
    pub loader_max_concurrent_probes: usize,
    pub lightbox: LightboxConfig,
    /// Background music; no toggle is offered when absent.
    pub music: Option<MusicConfig>,
    pub anniversaries: Vec<AnniversaryConfig>,
    pub hearts: HeartsConfig,
}

/// Timing and placement the stream scheduler runs with. Fixed for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOptions {
    pub container: String,
    pub photos_folder: PathBuf,
    pub initial_count: usize,
    pub animation_duration: Duration,
    pub stagger_delay: Duration,
}

impl StreamOptions {
    /// Entries visible at once after warm-up.
    pub fn steady_state_population(&self) -> usize {
        let stagger = self.stagger_delay.as_secs_f64();
        if stagger <= 0.0 {
            return 0;
        }
        (self.animation_duration.as_secs_f64() / stagger).ceil() as usize
    }
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(self.photo_count > 0, "photo-count must be greater than zero");
        ensure!(
            !self.animation_duration.is_zero(),
            "animation-duration must be positive"
        );
        ensure!(!self.stagger_delay.is_zero(), "stagger-delay must be positive");
        ensure!(
            self.loader_max_concurrent_probes > 0,
            "loader-max-concurrent-probes must be greater than zero"
        );
        ensure!(
            !self.container.trim().is_empty(),
            "container must not be empty"
        );
        for (index, file) in self.photo_files.iter().enumerate() {
            ensure!(
                !file.trim().is_empty(),
                "photo-files[{}] must not be blank",
                index
            );
        }
        self.lightbox
            .validate()
            .context("invalid lightbox configuration")?;
        if let Some(music) = &self.music {
            music.validate().context("invalid music configuration")?;
        }
        for anniversary in &self.anniversaries {
            anniversary
                .validate()
                .context("invalid anniversaries configuration")?;
        }
        self.hearts
            .validate()
            .context("invalid hearts configuration")?;
        Ok(self)
    }

    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions {
            container: self.container.clone(),
            photos_folder: self.photos_folder.clone(),
            initial_count: self.photo_count,
            animation_duration: self.animation_duration,
            stagger_delay: self.stagger_delay,
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            photos_folder: PathBuf::from("pictures"),
            photo_files: Vec::new(),
            container: DEFAULT_CONTAINER.to_string(),
            photo_count: 20,
            animation_duration: Duration::from_secs(40),
            stagger_delay: Duration::from_secs(2),
            shuffle_seed: None,
            loader_max_concurrent_probes: 4,
            lightbox: LightboxConfig::default(),
            music: None,
            anniversaries: Vec::new(),
            hearts: HeartsConfig::default(),
        }
    }
}
