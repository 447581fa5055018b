use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};

use crate::config::RunConfig;
use crate::error::NormalizeError;
use crate::format::format_float;

/// Turns an input file into a loudness-normalized output file.
pub trait Normalizer {
    fn normalize(&self, input: &Path, output: &Path, config: &RunConfig) -> Result<(), NormalizeError>;
}

/// Runs ffmpeg's `loudnorm` filter and downmixes to mono.
///
/// The exit status of ffmpeg is not treated as a failure: once the process has
/// run, the output is handed to the probe step, which rejects anything that is
/// not decodable audio. A non-zero status is only logged.
#[derive(Debug, Clone)]
pub struct FfmpegNormalizer {
    program: PathBuf,
}

impl Default for FfmpegNormalizer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegNormalizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Build the `loudnorm` filter expression for the configured targets.
    pub fn filter(config: &RunConfig) -> String {
        format!(
            "loudnorm=I={}:TP={}:LRA={}",
            format_float(config.target_lufs),
            format_float(config.true_peak_limit_db),
            config.loudness_range,
        )
    }

    /// Full argument list passed to the executable.
    pub fn args(input: &Path, output: &Path, config: &RunConfig) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-i".into(),
            input.into(),
            "-filter_complex".into(),
            Self::filter(config).into(),
            "-ac".into(),
            "1".into(),
            output.into(),
        ]
    }
}

impl Normalizer for FfmpegNormalizer {
    fn normalize(&self, input: &Path, output: &Path, config: &RunConfig) -> Result<(), NormalizeError> {
        let args = Self::args(input, output, config);
        debug!("Running {} {:?}", self.program.display(), args);

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| NormalizeError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(3).collect();
            warn!(
                "{} exited with {} for {}: {}",
                self.program.display(),
                result.status,
                input.display(),
                tail.into_iter().rev().collect::<Vec<_>>().join(" | "),
            );
        }

        Ok(())
    }
}
