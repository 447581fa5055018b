//! Error types for each pipeline stage.

use std::path::PathBuf;

use thiserror::Error;

/// The normalizer could not be run for a file.
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The external executable could not be started.
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Metadata could not be extracted from a normalized file.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not a decodable audio container.
    #[error("failed to probe {path}: {source}")]
    Probe {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    /// The demuxer gave up on a malformed header.
    #[error("failed to probe {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("no audio track found in {0}")]
    NoTrack(PathBuf),

    #[error("sample rate unknown for {0}")]
    MissingSampleRate(PathBuf),

    #[error("channel count unknown for {0}")]
    MissingChannels(PathBuf),

    #[error("{0} has zero duration")]
    ZeroDuration(PathBuf),

    /// Reserved for tag reader failures. Missing tags are not an error.
    #[error("failed to read tags: {0}")]
    Metadata(String),
}

/// Errors that abort a whole run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
