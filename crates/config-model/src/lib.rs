use anyhow::{Result, ensure};
use chrono::NaiveDate;
use serde::Deserialize;

pub use anniversary::AnniversaryConfig;
pub use hearts::HeartsConfig;
pub use lightbox::LightboxConfig;
pub use music::MusicConfig;

mod lightbox {
    use super::*;

    const DEFAULT_QUOTES: &[&str] = &[
        "Every love story is beautiful, but ours is my favorite.",
        "In all the world, there is no heart for me like yours.",
        "You are my today and all of my tomorrows.",
        "I love you not only for what you are, but for what I am when I am with you.",
        "You are the finest, loveliest, tenderest person I have ever known.",
        "I fell in love the way you fall asleep: slowly, and then all at once.",
        "Whatever our souls are made of, yours and mine are the same.",
        "I would rather spend one lifetime with you, than face all the ages of this world alone.",
        "You are my sun, my moon, and all of my stars.",
        "I love you more than there are stars in the sky and fish in the sea.",
    ];

    #[derive(Debug, Clone, Deserialize, Default)]
    #[serde(rename_all = "kebab-case", default)]
    pub struct LightboxConfig {
        /// Quotes shown under the enlarged photo; the built-in set when omitted.
        pub quotes: Option<Vec<String>>,
    }

    impl LightboxConfig {
        pub fn quotes_or_default(&self) -> Vec<String> {
            match &self.quotes {
                Some(quotes) => quotes.clone(),
                None => DEFAULT_QUOTES.iter().map(|q| q.to_string()).collect(),
            }
        }

        pub fn validate(&self) -> Result<()> {
            if let Some(quotes) = &self.quotes {
                ensure!(
                    !quotes.is_empty(),
                    "lightbox.quotes must list at least one quote; omit it for the built-in set"
                );
                for (index, quote) in quotes.iter().enumerate() {
                    ensure!(
                        !quote.trim().is_empty(),
                        "lightbox.quotes[{}] must not be blank",
                        index
                    );
                }
            }
            Ok(())
        }
    }
}

mod music {
    use super::*;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "kebab-case", default)]
    pub struct MusicConfig {
        pub path: PathBuf,
        pub volume: f32,
    }

    impl MusicConfig {
        const DEFAULT_VOLUME: f32 = 0.3;

        pub fn validate(&self) -> Result<()> {
            ensure!(
                self.volume.is_finite() && (0.0..=1.0).contains(&self.volume),
                "music.volume must be within [0, 1]"
            );
            ensure!(
                !self.path.as_os_str().is_empty(),
                "music.path must not be empty"
            );
            Ok(())
        }
    }

    impl Default for MusicConfig {
        fn default() -> Self {
            Self {
                path: PathBuf::from("wedding-song.mp3"),
                volume: Self::DEFAULT_VOLUME,
            }
        }
    }
}

mod anniversary {
    use super::*;

    #[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "kebab-case")]
    pub struct AnniversaryConfig {
        pub label: String,
        pub since: NaiveDate,
    }

    impl AnniversaryConfig {
        pub fn validate(&self) -> Result<()> {
            ensure!(
                !self.label.trim().is_empty(),
                "anniversaries entry for {} must have a label",
                self.since
            );
            Ok(())
        }
    }
}

mod hearts {
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "kebab-case", default)]
    pub struct HeartsConfig {
        pub count: usize,
        pub emojis: Vec<String>,
    }

    impl HeartsConfig {
        pub fn validate(&self) -> Result<()> {
            ensure!(
                self.count == 0 || !self.emojis.is_empty(),
                "hearts.emojis must not be empty when hearts.count is positive"
            );
            Ok(())
        }
    }

    impl Default for HeartsConfig {
        fn default() -> Self {
            Self {
                count: 10,
                emojis: ["❤️", "💕", "💖", "💗", "💓", "💞", "💝"]
                    .iter()
                    .map(|e| e.to_string())
                    .collect(),
            }
        }
    }
}
