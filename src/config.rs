/// Integrated loudness target in LUFS.
pub const TARGET_LUFS: f64 = -20.0;
/// True-peak ceiling in dB.
pub const TRUE_PEAK_LIMIT_DB: f64 = -1.0;
/// Loudness range in LU.
pub const LOUDNESS_RANGE: f64 = 11.0;

pub const DEFAULT_EXTENSION: &str = ".flac";
pub const OUTPUT_DIR_NAME: &str = "to_upload";
pub const OUTPUT_PREFIX: &str = "normalized_";
pub const REPORT_FILENAME: &str = "combined_audio_report.csv";

/// Parameters fixed for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub target_lufs: f64,
    pub true_peak_limit_db: f64,
    pub loudness_range: f64,
    /// File name suffix selecting inputs, matched case-insensitively.
    pub extension: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_lufs: TARGET_LUFS,
            true_peak_limit_db: TRUE_PEAK_LIMIT_DB,
            loudness_range: LOUDNESS_RANGE,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl RunConfig {
    /// Same targets, different input suffix.
    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            ..Self::default()
        }
    }

    /// Check if a file name carries the configured suffix.
    pub fn matches(&self, filename: &str) -> bool {
        filename
            .to_lowercase()
            .ends_with(&self.extension.to_lowercase())
    }
}
