use serde::{Deserialize, Serialize};
use tracing::debug;

use super::srt::SubtitleEntry;

/// A contiguous run of paragraph text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    /// Text matched to the subtitle at `subtitle_index` in the track
    Subtitle { text: String, subtitle_index: usize },
    /// Text not covered by any subtitle
    Other { text: String },
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Subtitle { text, .. } | Segment::Other { text } => text,
        }
    }

    pub fn subtitle_index(&self) -> Option<usize> {
        match self {
            Segment::Subtitle { subtitle_index, .. } => Some(*subtitle_index),
            Segment::Other { .. } => None,
        }
    }
}

/// Segments for one paragraph plus the track cursor to resume from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Alignment {
    pub segments: Vec<Segment>,
    pub next_cursor: usize,
    /// Index of the first segment forced in without matching paragraph text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_from: Option<usize>,
}

impl Alignment {
    /// Number of subtitles this paragraph consumed
    pub fn consumed(&self) -> usize {
        self.segments.iter().filter(|s| s.subtitle_index().is_some()).count()
    }
}

/// Partition a paragraph into subtitle and other segments.
///
/// Subtitles are matched in order as exact substrings of the text left after
/// the previous match. The first miss ends matching. If non-blank text is
/// left over while subtitles remain, every remaining subtitle is emitted with
/// its own caption text so playback highlighting never loses captions.
///
/// A leftover made only of whitespace does not force: it stays an `Other`
/// segment and the remaining subtitles wait for the next paragraph.
pub fn align(paragraph_text: &str, subtitles: &[SubtitleEntry], start_cursor: usize) -> Alignment {
    let mut segments = Vec::new();
    let mut remaining = paragraph_text;
    let mut cursor = start_cursor.min(subtitles.len());
    let mut forced_from = None;

    while cursor < subtitles.len() {
        let needle = subtitles[cursor].text.trim();
        let Some(position) = remaining.find(needle) else {
            break;
        };

        if position > 0 {
            segments.push(Segment::Other {
                text: remaining[..position].to_string(),
            });
        }
        let end = position + needle.len();
        segments.push(Segment::Subtitle {
            text: remaining[position..end].to_string(),
            subtitle_index: cursor,
        });

        remaining = &remaining[end..];
        cursor += 1;
    }

    if !remaining.is_empty() {
        if cursor < subtitles.len() && !remaining.trim().is_empty() {
            debug!(
                "Forcing {} unmatched subtitles into paragraph (from #{})",
                subtitles.len() - cursor,
                cursor
            );
            forced_from = Some(segments.len());
            for (index, entry) in subtitles.iter().enumerate().skip(cursor) {
                segments.push(Segment::Subtitle {
                    text: entry.text.clone(),
                    subtitle_index: index,
                });
            }
            cursor = subtitles.len();
        } else {
            segments.push(Segment::Other {
                text: remaining.to_string(),
            });
        }
    }

    Alignment {
        segments,
        next_cursor: cursor,
        forced_from,
    }
}

/// Align a sequence of paragraphs, threading the subtitle cursor through them
pub fn align_paragraphs<S: AsRef<str>>(paragraphs: &[S], subtitles: &[SubtitleEntry]) -> Vec<Alignment> {
    let mut cursor = 0;
    paragraphs
        .iter()
        .map(|paragraph| {
            let alignment = align(paragraph.as_ref(), subtitles, cursor);
            cursor = alignment.next_cursor;
            alignment
        })
        .collect()
}
