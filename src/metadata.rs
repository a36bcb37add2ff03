//! Capture timestamps for the photo catalog.
//!
//! Each photo gets the best timestamp available: EXIF `DateTimeOriginal`,
//! then `DateTimeDigitized` (CreateDate), then `DateTime` (ModifyDate), and
//! finally the file's modification time.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Tag, Value};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AssetError;

/// File written next to the photos by `--extract-metadata`.
pub const METADATA_FILE: &str = "real_metadata.json";

const EXIF_TAGS: [Tag; 3] = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];
const EXIF_FORMATS: [&str; 2] = ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimestampSource {
    Exif,
    FileSystem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoTimestamp {
    pub timestamp: NaiveDateTime,
    pub formatted: String,
    pub source: TimestampSource,
}

impl PhotoTimestamp {
    fn new(timestamp: NaiveDateTime, source: TimestampSource) -> Self {
        Self {
            timestamp,
            formatted: timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            source,
        }
    }
}

/// Parse an EXIF date such as `2023:12:25 14:30:00`. Trailing sub-second or
/// zone text is ignored.
pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    let head = raw.get(..19)?;
    EXIF_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(head, fmt).ok())
}

/// Best EXIF timestamp in `path`, or `None` when the file carries no usable one.
pub fn read_exif_timestamp(path: &Path) -> Option<NaiveDateTime> {
    let file = fs::File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let reader = exif::Reader::new().read_from_container(&mut buf).ok()?;
    EXIF_TAGS.iter().find_map(|tag| {
        let field = reader.get_field(*tag, In::PRIMARY)?;
        match &field.value {
            Value::Ascii(parts) => parts
                .first()
                .and_then(|bytes| std::str::from_utf8(bytes).ok())
                .and_then(parse_exif_datetime),
            _ => None,
        }
    })
}

/// Timestamp for one photo, falling back to its modification time.
pub fn photo_timestamp(path: &Path) -> Result<PhotoTimestamp, AssetError> {
    if !path.is_file() {
        return Err(AssetError::Missing(path.to_path_buf()));
    }
    if let Some(taken) = read_exif_timestamp(path) {
        return Ok(PhotoTimestamp::new(taken, TimestampSource::Exif));
    }
    let modified: DateTime<Local> = fs::metadata(path)?.modified()?.into();
    Ok(PhotoTimestamp::new(
        modified.naive_local(),
        TimestampSource::FileSystem,
    ))
}

/// Timestamps keyed by catalog identifier. Unreadable photos are skipped.
pub fn collect_timestamps(folder: &Path, photos: &[String]) -> BTreeMap<String, PhotoTimestamp> {
    let mut out = BTreeMap::new();
    for photo in photos {
        match photo_timestamp(&folder.join(photo)) {
            Ok(stamp) => {
                debug!(photo = %photo, at = %stamp.formatted, source = ?stamp.source, "photo timestamp");
                out.insert(photo.clone(), stamp);
            }
            Err(error) => warn!(photo = %photo, %error, "no timestamp for photo"),
        }
    }
    out
}

/// Write the timestamps as pretty-printed JSON.
pub fn write_timestamps(path: &Path, stamps: &BTreeMap<String, PhotoTimestamp>) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, stamps)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimestampSummary {
    pub total: usize,
    pub exif: usize,
    pub file_system: usize,
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
}

impl TimestampSummary {
    pub fn of(stamps: &BTreeMap<String, PhotoTimestamp>) -> Self {
        let exif = stamps
            .values()
            .filter(|s| s.source == TimestampSource::Exif)
            .count();
        Self {
            total: stamps.len(),
            exif,
            file_system: stamps.len() - exif,
            earliest: stamps.values().map(|s| s.timestamp).min(),
            latest: stamps.values().map(|s| s.timestamp).max(),
        }
    }

    /// Whole days between the earliest and latest photo.
    pub fn span_days(&self) -> Option<i64> {
        Some((self.latest? - self.earliest?).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn parses_colon_and_dash_dates() {
        assert_eq!(
            parse_exif_datetime("2023:12:25 14:30:00"),
            Some(at(2023, 12, 25, 14, 30, 0))
        );
        assert_eq!(
            parse_exif_datetime("2023-12-25 14:30:00+01:00"),
            Some(at(2023, 12, 25, 14, 30, 0))
        );
        assert_eq!(parse_exif_datetime("0000:00:00 00:00:00"), None);
        assert_eq!(parse_exif_datetime("2023:12"), None);
    }

    #[test]
    fn summary_counts_sources_and_span() {
        let mut stamps = BTreeMap::new();
        stamps.insert(
            "a.jpg".to_string(),
            PhotoTimestamp::new(at(2012, 12, 1, 0, 0, 0), TimestampSource::Exif),
        );
        stamps.insert(
            "b.jpg".to_string(),
            PhotoTimestamp::new(at(2013, 1, 11, 12, 0, 0), TimestampSource::FileSystem),
        );
        let summary = TimestampSummary::of(&stamps);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.exif, 1);
        assert_eq!(summary.file_system, 1);
        assert_eq!(summary.span_days(), Some(41));
        assert_eq!(TimestampSummary::default().span_days(), None);
    }
}
