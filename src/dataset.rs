//! Song dataset ingestion
//!
//! Turns annotated recordings into the symbol sequences the learner consumes.
//! A recording arrives as per-syllable onset/offset times; syllables are
//! re-ordered by onset (annotation maps carry no order), then flattened into
//! label sequences either as-sung or with each syllable repeated in
//! proportion to its duration. Recording filenames carry the animal id and
//! capture time, recovered here with a named-group pattern. Per-bird
//! annotation tables arrive as csv with the onset/offset map serialized as a
//! python dict literal per row; [`load_syllable_csv`] parses those rows into
//! ready-to-train [`SongRecord`]s.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use thiserror::Error;

/// One sung syllable with its time span in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SyllableEvent {
    /// Syllable label.
    pub label: String,
    /// Onset time (ms).
    pub onset_ms: f64,
    /// Offset time (ms).
    pub offset_ms: f64,
}

impl SyllableEvent {
    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.offset_ms - self.onset_ms
    }
}

/// One annotated song: syllables in singing order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SongRecord {
    /// Ordered syllables.
    pub syllables: Vec<SyllableEvent>,
}

/// Flatten a label -> [(onset, offset)] annotation map into one onset-sorted
/// syllable list.
pub fn ordered_syllables(onsets_offsets: &HashMap<String, Vec<(f64, f64)>>) -> Vec<SyllableEvent> {
    let mut events: Vec<SyllableEvent> = onsets_offsets
        .iter()
        .flat_map(|(label, times)| {
            times.iter().map(|&(onset_ms, offset_ms)| SyllableEvent {
                label: label.clone(),
                onset_ms,
                offset_ms,
            })
        })
        .collect();
    events.sort_by(|a, b| a.onset_ms.total_cmp(&b.onset_ms));
    events
}

/// Label sequences in singing order; songs without syllables are skipped.
pub fn song_sequences_simple(records: &[SongRecord]) -> Vec<Vec<String>> {
    records
        .iter()
        .filter(|record| !record.syllables.is_empty())
        .map(|record| {
            record
                .syllables
                .iter()
                .map(|syllable| syllable.label.clone())
                .collect()
        })
        .collect()
}

/// Label sequences with duration folded in: each syllable repeats
/// `ceil(duration / corpus mean duration for that label)` times, so drawn-out
/// renditions weigh more than clipped ones.
pub fn song_sequences_with_timing(records: &[SongRecord]) -> Vec<Vec<String>> {
    let mut sums: HashMap<&str, (f64, f64)> = HashMap::new();
    for record in records {
        for syllable in &record.syllables {
            let entry = sums.entry(syllable.label.as_str()).or_insert((0.0, 0.0));
            entry.0 += syllable.duration_ms();
            entry.1 += 1.0;
        }
    }
    let means: HashMap<&str, f64> = sums
        .into_iter()
        .map(|(label, (total, count))| (label, total / count))
        .collect();

    records
        .iter()
        .filter(|record| !record.syllables.is_empty())
        .map(|record| {
            let mut song = Vec::new();
            for syllable in &record.syllables {
                let mean = means.get(syllable.label.as_str()).copied().unwrap_or(0.0);
                let repeats = if mean > 0.0 {
                    (syllable.duration_ms() / mean).ceil().max(1.0) as usize
                } else {
                    1
                };
                song.extend(std::iter::repeat(syllable.label.clone()).take(repeats));
            }
            song
        })
        .collect()
}

/// Animal id and capture time recovered from a recording filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingMetadata {
    /// Animal identifier prefix.
    pub animal_id: String,
    /// Capture timestamp (recordings carry no year; fixed to 2024).
    pub recorded_at: NaiveDateTime,
}

fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?P<animal_id>[\w\d]+)_\d+\.\d+_(?P<month>\d+)_(?P<day>\d+)_(?P<hour>\d+)_(?P<minute>\d+)_(?P<second>\d+)\.wav$",
        )
        .expect("filename pattern compiles")
    })
}

/// Parse animal id and capture time out of a `.wav` recording path. Returns
/// `None` for names that do not match the convention or encode an invalid
/// time.
pub fn recording_metadata(path: &str) -> Option<RecordingMetadata> {
    let captures = filename_pattern().captures(path)?;
    let field = |name: &str| -> Option<u32> { captures.name(name)?.as_str().parse().ok() };

    let date = NaiveDate::from_ymd_opt(2024, field("month")?, field("day")?)?;
    let recorded_at = date.and_hms_opt(field("hour")?, field("minute")?, field("second")?)?;
    Some(RecordingMetadata {
        animal_id: captures["animal_id"].to_string(),
        recorded_at,
    })
}

/// Errors raised while loading a per-bird syllable csv.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The csv file could not be read.
    #[error("failed to read {path}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },

    /// The header lacks a required column.
    #[error("syllable csv header lacks required column '{0}'")]
    MissingColumn(&'static str),

    /// A data row is narrower than the header demands.
    #[error("row {line} has {found} fields, expected at least {expected}")]
    RowTooShort {
        /// 1-based line number.
        line: usize,
        /// Fields found in the row.
        found: usize,
        /// Fields the referenced columns require.
        expected: usize,
    },

    /// The song-present cell is not a boolean.
    #[error("row {line}: '{value}' is not a boolean")]
    InvalidBool {
        /// 1-based line number.
        line: usize,
        /// Offending cell content.
        value: String,
    },

    /// An onset/offset value failed to parse as a number.
    #[error("row {line}: malformed onset/offset value")]
    InvalidTime {
        /// 1-based line number.
        line: usize,
    },
}

/// One row of a per-bird syllable annotation table.
#[derive(Debug, Clone, PartialEq)]
pub struct SyllableCsvRecord {
    /// Recording file the annotations belong to.
    pub file_name: String,
    /// Whether the annotator flagged a song in the recording.
    pub song_present: bool,
    /// Animal id and capture time, when the filename follows the convention.
    pub metadata: Option<RecordingMetadata>,
    /// Syllables in singing order.
    pub song: SongRecord,
}

/// Load a per-bird syllable annotation csv.
///
/// Each row names a recording (`file_name`), whether a song was detected
/// (`song_present`), and a `syllable_onsets_offsets_ms` cell holding a
/// label -> \[(onset, offset)\] map serialized as a python dict literal.
/// Rows come back with their syllables onset-ordered and the filename
/// metadata already extracted; extra columns are ignored.
pub fn load_syllable_csv(path: &Path) -> Result<Vec<SyllableCsvRecord>, DatasetError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_syllable_csv(&raw)
}

/// Songs flagged present, in row order.
pub fn present_songs(records: &[SyllableCsvRecord]) -> Vec<SongRecord> {
    records
        .iter()
        .filter(|record| record.song_present)
        .map(|record| record.song.clone())
        .collect()
}

fn parse_syllable_csv(raw: &str) -> Result<Vec<SyllableCsvRecord>, DatasetError> {
    let mut lines = raw.lines().enumerate();
    let header = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, line)) => break split_csv_line(line),
            None => return Ok(Vec::new()),
        }
    };
    let column = |name: &'static str| {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(DatasetError::MissingColumn(name))
    };
    let file_name_col = column("file_name")?;
    let song_present_col = column("song_present")?;
    let times_col = column("syllable_onsets_offsets_ms")?;
    let expected = file_name_col.max(song_present_col).max(times_col) + 1;

    let mut records = Vec::new();
    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let fields = split_csv_line(line);
        if fields.len() < expected {
            return Err(DatasetError::RowTooShort {
                line: line_no,
                found: fields.len(),
                expected,
            });
        }
        let file_name = fields[file_name_col].trim().to_string();
        let song_present = parse_song_present(&fields[song_present_col], line_no)?;
        let times = parse_onsets_offsets(&fields[times_col], line_no)?;
        records.push(SyllableCsvRecord {
            metadata: recording_metadata(&file_name),
            song: SongRecord {
                syllables: ordered_syllables(&times),
            },
            file_name,
            song_present,
        });
    }
    Ok(records)
}

// Minimal quoted-field splitter: commas inside double-quoted cells are
// literal, doubled double-quotes escape one quote.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);
    fields
}

fn parse_song_present(value: &str, line: usize) -> Result<bool, DatasetError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(DatasetError::InvalidBool {
            line,
            value: value.to_string(),
        }),
    }
}

fn label_entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"'(?P<label>[^']+)'\s*:\s*\[(?P<times>[^\]]*)\]")
            .expect("label entry pattern compiles")
    })
}

fn time_pair_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"\(\s*(?P<onset>-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)\s*,\s*(?P<offset>-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)\s*\)",
        )
        .expect("time pair pattern compiles")
    })
}

// Parses the python dict literal without evaluating it; stray quote escaping
// around the cell is ignored because only the entry shapes are matched.
fn parse_onsets_offsets(
    cell: &str,
    line: usize,
) -> Result<HashMap<String, Vec<(f64, f64)>>, DatasetError> {
    let mut map: HashMap<String, Vec<(f64, f64)>> = HashMap::new();
    for entry in label_entry_pattern().captures_iter(cell) {
        let spans = map.entry(entry["label"].to_string()).or_default();
        for pair in time_pair_pattern().captures_iter(&entry["times"]) {
            let onset = pair["onset"]
                .parse()
                .map_err(|_| DatasetError::InvalidTime { line })?;
            let offset = pair["offset"]
                .parse()
                .map_err(|_| DatasetError::InvalidTime { line })?;
            spans.push((onset, offset));
        }
    }
    Ok(map)
}
