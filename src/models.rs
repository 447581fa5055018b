use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::format::{format_float, round2};

/// Column names of the technical fields every record carries.
pub const TECHNICAL_COLUMNS: [&str; 8] = [
    "filename",
    "normalized_lufs",
    "true_peak_limit_db",
    "duration_sec",
    "bitrate_kbps",
    "samplerate",
    "channels",
    "format",
];

/// One successfully normalized and probed input file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Name of the original input file.
    pub filename: String,
    pub normalized_lufs: f64,
    pub true_peak_limit_db: f64,
    pub duration_sec: f64,
    pub bitrate_kbps: f64,
    pub samplerate: u32,
    pub channels: usize,
    pub format: String,
    /// Tag name to string value; multi-valued tags are already joined.
    pub tags: BTreeMap<String, String>,
}

impl FileRecord {
    /// Build a record from raw probe figures, rounding the derived values.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        filename: String,
        normalized_lufs: f64,
        true_peak_limit_db: f64,
        duration_sec: f64,
        bitrate_kbps: f64,
        samplerate: u32,
        channels: usize,
        format: String,
        tags: BTreeMap<String, String>,
    ) -> Self {
        Self {
            filename,
            normalized_lufs,
            true_peak_limit_db,
            duration_sec: round2(duration_sec),
            bitrate_kbps: round2(bitrate_kbps),
            samplerate,
            channels,
            format,
            tags,
        }
    }

    /// Render the value stored under `key`. Technical fields shadow tags of the same name.
    pub fn value(&self, key: &str) -> Option<String> {
        let technical = match key {
            "filename" => Some(self.filename.clone()),
            "normalized_lufs" => Some(format_float(self.normalized_lufs)),
            "true_peak_limit_db" => Some(format_float(self.true_peak_limit_db)),
            "duration_sec" => Some(format_float(self.duration_sec)),
            "bitrate_kbps" => Some(format_float(self.bitrate_kbps)),
            "samplerate" => Some(self.samplerate.to_string()),
            "channels" => Some(self.channels.to_string()),
            "format" => Some(self.format.clone()),
            _ => None,
        };
        technical.or_else(|| self.tags.get(key).cloned())
    }

    /// All keys this record supplies a value for.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        TECHNICAL_COLUMNS
            .iter()
            .copied()
            .chain(self.tags.keys().map(String::as_str))
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_duration_seconds: f64,
    pub files_recorded: usize,
    pub files_failed: usize,
    pub report_path: PathBuf,
}

/// Stage at which a file left the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalizing,
    Probing,
}

/// Sent from the pipeline driver as each file moves through its states.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Normalizing { index: usize, total: usize, filename: String },
    Probing { index: usize, filename: String },
    Recorded { index: usize, filename: String, duration_sec: f64 },
    Failed { index: usize, filename: String, stage: Stage, message: String },
}
