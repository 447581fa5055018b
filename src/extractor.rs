use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use symphonia::core::codecs::{CodecParameters, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, MetadataRevision};
use symphonia::core::probe::Hint;

use crate::config::RunConfig;
use crate::error::ExtractError;
use crate::models::FileRecord;

/// Structural facts about an audio container.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeInfo {
    pub frames: u64,
    pub samplerate: u32,
    pub channels: usize,
    pub format: String,
}

impl ProbeInfo {
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.samplerate as f64
    }

    /// Duration when it is finite and positive; anything else can't yield a bitrate.
    pub fn usable_duration(&self) -> Option<f64> {
        let duration = self.duration_secs();
        (duration.is_finite() && duration > 0.0).then_some(duration)
    }
}

/// Probe a normalized file and merge its technical fields and tags into one record.
///
/// `source_name` is the name of the original input file, which is what the
/// report lists.
pub fn extract(path: &Path, source_name: &str, config: &RunConfig) -> Result<FileRecord, ExtractError> {
    let (info, tags) = probe(path)?;

    let duration_sec = info
        .usable_duration()
        .ok_or_else(|| ExtractError::ZeroDuration(path.to_path_buf()))?;

    let file_size = std::fs::metadata(path)
        .map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    Ok(FileRecord::new(
        source_name.to_string(),
        config.target_lufs,
        config.true_peak_limit_db,
        duration_sec,
        bitrate_kbps(file_size, duration_sec),
        info.samplerate,
        info.channels,
        info.format,
        tags,
    ))
}

/// Average bitrate in kbit/s over the whole file.
pub fn bitrate_kbps(file_size_bytes: u64, duration_sec: f64) -> f64 {
    (file_size_bytes as f64 * 8.0 / duration_sec) / 1000.0
}

/// Read container structure and tags without decoding audio.
///
/// Some malformed headers (e.g. a zero sample rate) make the demuxer panic;
/// that is reported as a probe failure for this file only.
pub fn probe(path: &Path) -> Result<(ProbeInfo, BTreeMap<String, String>), ExtractError> {
    panic::catch_unwind(AssertUnwindSafe(|| probe_container(path))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "demuxer panicked".to_string());
        Err(ExtractError::Malformed {
            path: path.to_path_buf(),
            message,
        })
    })
}

fn probe_container(path: &Path) -> Result<(ProbeInfo, BTreeMap<String, String>), ExtractError> {
    let mut file = File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut header = [0u8; 12];
    let header_len = file.read(&mut header).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let container = sniff_container(&header[..header_len]);
    drop(file);

    let file = File::open(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|source| ExtractError::Probe {
            path: path.to_path_buf(),
            source,
        })?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ExtractError::NoTrack(path.to_path_buf()))?;
    let codec_params = track.codec_params.clone();
    let track_id = track.id;

    let samplerate = codec_params
        .sample_rate
        .ok_or_else(|| ExtractError::MissingSampleRate(path.to_path_buf()))?;
    let channels = codec_params
        .channels
        .map(|c| c.count())
        .ok_or_else(|| ExtractError::MissingChannels(path.to_path_buf()))?;

    // Container-level tags come after probe-level ones (e.g. a leading ID3v2 block).
    let mut pairs = Vec::new();
    if let Some(metadata) = probed.metadata.get() {
        if let Some(revision) = metadata.current() {
            pairs.extend(revision_pairs(revision));
        }
    }
    if let Some(revision) = probed.format.metadata().current() {
        pairs.extend(revision_pairs(revision));
    }
    let tags = collect_tags(pairs);

    let frames = match codec_params.n_frames {
        Some(n) => n,
        None => count_frames(probed.format.as_mut(), track_id).map_err(|source| {
            ExtractError::Probe {
                path: path.to_path_buf(),
                source,
            }
        })?,
    };

    let info = ProbeInfo {
        frames,
        samplerate,
        channels,
        format: container
            .map(str::to_string)
            .unwrap_or_else(|| container_label(path, &codec_params)),
    };
    Ok((info, tags))
}

/// Sum packet durations for containers that don't declare a frame count.
fn count_frames(format: &mut dyn FormatReader, track_id: u32) -> Result<u64, SymphoniaError> {
    let mut frames = 0u64;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e),
        };
        if packet.track_id() == track_id {
            frames += packet.dur;
        }
    }
    Ok(frames)
}

fn revision_pairs(revision: &MetadataRevision) -> Vec<(String, String)> {
    revision
        .tags()
        .iter()
        .map(|tag| (tag.key.clone(), clean_value(&tag.value.to_string())))
        .collect()
}

/// RIFF INFO strings carry their NUL terminator and pad byte.
fn clean_value(raw: &str) -> String {
    raw.trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .trim_start()
        .to_string()
}

/// Identify the container from its leading bytes.
fn sniff_container(header: &[u8]) -> Option<&'static str> {
    match header {
        [b'f', b'L', b'a', b'C', ..] => Some("FLAC"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some("WAV"),
        [b'R', b'F', b'6', b'4', ..] => Some("WAV"),
        [b'O', b'g', b'g', b'S', ..] => Some("OGG"),
        [b'F', b'O', b'R', b'M', _, _, _, _, b'A', b'I', b'F', _, ..] => Some("AIFF"),
        [b'c', b'a', b'f', b'f', ..] => Some("CAF"),
        [0x1A, 0x45, 0xDF, 0xA3, ..] => Some("MKV"),
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => Some("MP4"),
        [b'I', b'D', b'3', ..] => Some("MP3"),
        [0xFF, b, ..] if b & 0xE0 == 0xE0 => Some("MP3"),
        _ => None,
    }
}

/// Fold raw tag entries into one string per key.
///
/// Keys are lower-cased. A key that appears more than once is a multi-valued
/// tag; its values are joined with ", " in order of appearance.
pub fn collect_tags<I>(pairs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in pairs {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        grouped.entry(key).or_default().push(value);
    }
    grouped
        .into_iter()
        .map(|(key, values)| (key, values.join(", ")))
        .collect()
}

/// Container name from the file extension, for content `sniff_container` doesn't recognize.
fn container_label(path: &Path, codec_params: &CodecParameters) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("flac") => "FLAC".to_string(),
        Some("wav") | Some("wave") => "WAV".to_string(),
        Some("ogg") | Some("oga") | Some("opus") => "OGG".to_string(),
        Some("aif") | Some("aiff") | Some("aifc") => "AIFF".to_string(),
        Some("mp3") => "MP3".to_string(),
        Some("m4a") | Some("mp4") => "MP4".to_string(),
        Some("mkv") | Some("mka") | Some("webm") => "MKV".to_string(),
        Some("caf") => "CAF".to_string(),
        _ => symphonia::default::get_codecs()
            .get_codec(codec_params.codec)
            .map(|d| d.short_name.to_uppercase())
            .unwrap_or_else(|| "UNKNOWN".to_string()),
    }
}
