use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use loudnorm_report::config::RunConfig;
use loudnorm_report::format::format_total_duration;
use loudnorm_report::models::{PipelineEvent, Stage};
use loudnorm_report::normalizer::FfmpegNormalizer;
use loudnorm_report::pipeline;

#[derive(Parser)]
#[command(
    name = "loudnorm-report",
    about = "Loudness-normalize a folder of audio files and write a combined metadata report"
)]
struct Cli {
    /// Folder containing the audio files (prompted for when omitted)
    path: Option<PathBuf>,

    /// ffmpeg executable used for normalization
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

/// Ask for the folder on stdin.
fn prompt_for_folder() -> Result<PathBuf> {
    println!("Folder path example for Windows:\nC:\\Users\\<your_username>\\Music\\Voice\n");
    println!("Folder path example for MacOS:\n/Users/<your_username>/Voice\n");
    print!("Enter the full folder path: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read folder path")?;
    Ok(expand_home(line.trim()))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') {
            if let Some(home) = std::env::var_os("HOME") {
                return PathBuf::from(home).join(rest.trim_start_matches(&['/', '\\'][..]));
            }
        }
    }
    PathBuf::from(path)
}

fn print_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::Normalizing {
            index,
            total,
            filename,
        } => println!("[{}/{}] Normalizing: {}", index + 1, total, filename),
        PipelineEvent::Probing { .. } | PipelineEvent::Recorded { .. } => {}
        PipelineEvent::Failed {
            filename,
            stage,
            message,
            ..
        } => {
            let what = match stage {
                Stage::Normalizing => "Normalization",
                Stage::Probing => "Probe",
            };
            eprintln!("  {} error with {}: {}", what, filename, message);
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let path = match cli.path {
        Some(path) => path,
        None => prompt_for_folder()?,
    };
    if !path.is_dir() {
        anyhow::bail!("Path '{}' is not a directory", path.display());
    }
    let path = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;

    let config = RunConfig::default();
    let normalizer = FfmpegNormalizer::new(cli.ffmpeg);

    let summary = pipeline::run(&path, &config, &normalizer, |event| print_event(&event))?;

    println!("\nDone! Report saved to {}", summary.report_path.display());
    println!(
        "Total audio duration: {}",
        format_total_duration(summary.total_duration_seconds)
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
