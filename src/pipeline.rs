use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::{RunConfig, OUTPUT_DIR_NAME, OUTPUT_PREFIX, REPORT_FILENAME};
use crate::error::RunError;
use crate::extractor;
use crate::models::{PipelineEvent, RunSummary, Stage};
use crate::normalizer::Normalizer;
use crate::report::ReportBuilder;

/// Directory that receives normalized files and the report.
pub fn output_dir(dir: &Path) -> PathBuf {
    dir.join(OUTPUT_DIR_NAME)
}

/// Where the normalized copy of `filename` is written.
pub fn output_path(dir: &Path, filename: &str) -> PathBuf {
    output_dir(dir).join(format!("{}{}", OUTPUT_PREFIX, filename))
}

pub fn report_path(dir: &Path) -> PathBuf {
    output_dir(dir).join(REPORT_FILENAME)
}

/// List input files carrying the configured extension, sorted by name.
pub fn scan_inputs(dir: &Path, config: &RunConfig) -> Result<Vec<PathBuf>, RunError> {
    let entries = std::fs::read_dir(dir).map_err(|source| RunError::ReadDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| config.matches(n))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Normalize every matching file in `dir`, write the combined report, and
/// return the run totals.
///
/// A file that fails to normalize or probe is reported through `on_event` and
/// skipped; it adds nothing to the report or the total. Only setup and report
/// writing errors abort the run.
pub fn run(
    dir: &Path,
    config: &RunConfig,
    normalizer: &dyn Normalizer,
    mut on_event: impl FnMut(PipelineEvent),
) -> Result<RunSummary, RunError> {
    let out_dir = output_dir(dir);
    std::fs::create_dir_all(&out_dir).map_err(|source| RunError::OutputDirectory {
        path: out_dir.clone(),
        source,
    })?;

    let files = scan_inputs(dir, config)?;
    let total = files.len();
    info!("Found {} {} files in {}", total, config.extension, dir.display());

    let mut builder = ReportBuilder::new();
    let mut failed = 0usize;

    for (index, input) in files.iter().enumerate() {
        let filename = match input.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let output = output_path(dir, &filename);

        on_event(PipelineEvent::Normalizing {
            index,
            total,
            filename: filename.clone(),
        });
        if let Err(e) = normalizer.normalize(input, &output, config) {
            debug!("Normalization failed for {}: {}", filename, e);
            failed += 1;
            on_event(PipelineEvent::Failed {
                index,
                filename,
                stage: Stage::Normalizing,
                message: e.to_string(),
            });
            continue;
        }

        on_event(PipelineEvent::Probing {
            index,
            filename: filename.clone(),
        });
        match extractor::extract(&output, &filename, config) {
            Ok(record) => {
                let duration_sec = record.duration_sec;
                debug!("Recorded {} ({} s, {} tags)", filename, duration_sec, record.tags.len());
                builder.add(record);
                on_event(PipelineEvent::Recorded {
                    index,
                    filename,
                    duration_sec,
                });
            }
            Err(e) => {
                debug!("Metadata extraction failed for {}: {}", filename, e);
                failed += 1;
                on_event(PipelineEvent::Failed {
                    index,
                    filename,
                    stage: Stage::Probing,
                    message: e.to_string(),
                });
            }
        }
    }

    let total_duration_seconds = builder.total();
    let table = builder.finalize();
    let report = report_path(dir);
    table.write_csv(&report)?;

    Ok(RunSummary {
        total_duration_seconds,
        files_recorded: table.records().len(),
        files_failed: failed,
        report_path: report,
    })
}
