use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::error::SubtitleError;

static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n)+").expect("valid pattern"));
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>|\{\\[^}]*\}").expect("valid pattern"));

/// One timed caption
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubtitleEntry {
    /// Sequence number assigned in parse order, starting at 1
    pub id: u32,
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
    /// Caption text
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(id: u32, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            id,
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{} --> {}\n{}\n",
            self.id,
            format_timestamp(self.start),
            format_timestamp(self.end),
            self.text
        )
    }
}

/// Parser switches
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseOptions {
    /// Remove inline tags such as `<i>` or `{\an8}` from caption text
    pub strip_markup: bool,
    /// Drop entries whose text ends up empty
    pub ignore_empty: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strip_markup: true,
            ignore_empty: true,
        }
    }
}

/// Parse a subtitle track with default options
pub fn parse(raw: &str) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    parse_with_options(raw, &ParseOptions::default())
}

/// Parse blank-line separated caption blocks.
///
/// Blocks without a timecode line are skipped. A timecode whose fields are
/// not numbers is an error.
pub fn parse_with_options(raw: &str, options: &ParseOptions) -> Result<Vec<SubtitleEntry>, SubtitleError> {
    let content = raw
        .strip_prefix('\u{feff}')
        .unwrap_or(raw)
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for block in BLOCK_SEPARATOR.split(&content) {
        let lines: Vec<&str> = block
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if lines.len() < 2 {
            if !lines.is_empty() {
                skipped += 1;
            }
            continue;
        }

        // optional cue identifier before the timecode
        let body = if !lines[0].contains("-->") && lines[1].contains("-->") {
            &lines[1..]
        } else {
            &lines[..]
        };

        let Some((timing, text_lines)) = body.split_first() else {
            skipped += 1;
            continue;
        };
        let Some((start_raw, end_raw)) = timing.split_once("-->") else {
            skipped += 1;
            continue;
        };

        let start = parse_timestamp(start_raw)?;
        let mut end = parse_timestamp(end_raw)?;
        if end < start {
            warn!("Caption ends before it starts ({} --> {}), clamping", start_raw.trim(), end_raw.trim());
            end = start;
        }

        let mut text = text_lines.join(" ");
        if options.strip_markup {
            text = MARKUP.replace_all(&text, "").into_owned();
        }
        let text = clean_text(&text);

        if options.ignore_empty && text.is_empty() {
            continue;
        }

        let id = entries.len() as u32 + 1;
        entries.push(SubtitleEntry::new(id, start, end, text));
    }

    if skipped > 0 {
        debug!("Skipped {} malformed subtitle blocks", skipped);
    }

    Ok(entries)
}

/// Parse `HH:MM:SS,mmm`, `HH:MM:SS.mmm` or `MM:SS.mmm` into seconds.
///
/// Cue settings after the time (`00:00:01.000 align:start`) are ignored.
pub fn parse_timestamp(timestamp: &str) -> Result<f64, SubtitleError> {
    let invalid = || SubtitleError::InvalidTimestamp {
        value: timestamp.trim().to_string(),
    };

    let value = timestamp.split_whitespace().next().ok_or_else(invalid)?;
    let (clock, millis) = match value.split_once([',', '.']) {
        Some((clock, millis)) => (clock, Some(millis)),
        None => (value, None),
    };

    let fields: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match fields.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => ("0", *m, *s),
        _ => return Err(invalid()),
    };

    let number = |field: &str| -> Result<u64, SubtitleError> {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        field.parse::<u64>().map_err(|_| invalid())
    };

    let hours = number(hours)?;
    let minutes = number(minutes)?;
    let seconds = number(seconds)?;
    let millis = match millis {
        Some(ms) => number(ms)?,
        None => 0,
    };

    let total = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .ok_or_else(invalid)?;

    Ok(total as f64 + millis as f64 / 1000.0)
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm)
pub fn format_timestamp(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Collapse whitespace runs to single spaces and trim
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A parsed subtitle track used for playback sync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtitleTrack {
    entries: Vec<SubtitleEntry>,
}

impl SubtitleTrack {
    pub fn new(entries: Vec<SubtitleEntry>) -> Self {
        Self { entries }
    }

    /// Parse raw track text with default options
    pub fn from_srt(raw: &str) -> Result<Self, SubtitleError> {
        Ok(Self::new(parse(raw)?))
    }

    pub fn entries(&self) -> &[SubtitleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the caption showing at `time`, for highlight-on-playback
    pub fn position_at(&self, time: f64) -> Option<usize> {
        let after = self.entries.partition_point(|entry| entry.start <= time);
        let candidate = after.checked_sub(1)?;
        let entry = &self.entries[candidate];
        (time < entry.end || (entry.start == entry.end && time == entry.start)).then_some(candidate)
    }

    /// Caption showing at `time`
    pub fn entry_at(&self, time: f64) -> Option<&SubtitleEntry> {
        self.position_at(time).map(|index| &self.entries[index])
    }

    /// Playback position for click-to-seek on a caption
    pub fn seek_time(&self, index: usize) -> Option<f64> {
        self.entries.get(index).map(|entry| entry.start)
    }

    /// Entries fully inside a time range
    pub fn entries_in_range(&self, start: f64, end: f64) -> Vec<&SubtitleEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.start >= start && entry.end <= end)
            .collect()
    }

    /// End of the last caption
    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(|entry| entry.end).fold(0.0, f64::max)
    }

    /// Serialize back to SRT text
    pub fn to_srt(&self) -> String {
        let mut srt_content = String::new();

        for entry in &self.entries {
            srt_content.push_str(&entry.to_string());
            srt_content.push('\n');
        }

        srt_content
    }

    /// Validate entries for common issues
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (i, entry) in self.entries.iter().enumerate() {
            if entry.end <= entry.start {
                issues.push(format!("Entry {}: End time is not after start time", i + 1));
            }

            if entry.text.trim().is_empty() {
                issues.push(format!("Entry {}: Empty text", i + 1));
            }
        }

        for pair in self.entries.windows(2) {
            if pair[1].start < pair[0].start {
                issues.push(format!("Entries {} and {}: Out of order", pair[0].id, pair[1].id));
            } else if pair[0].end > pair[1].start {
                issues.push(format!("Entries {} and {}: Overlapping timestamps", pair[0].id, pair[1].id));
            }
        }

        issues
    }
}
