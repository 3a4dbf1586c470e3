/// Subtitle tracks and their placement in paragraph text
///
/// Two placement strategies exist: the strict in-order aligner, used when
/// subtitles are known before rendering, and the fuzzy tagger for text
/// that was rendered first.

pub mod srt;
pub mod align;
pub mod fuzzy;

pub use srt::{format_timestamp, parse, parse_timestamp, parse_with_options, ParseOptions, SubtitleEntry, SubtitleTrack};
pub use align::{align, align_paragraphs, Alignment, Segment};
pub use fuzzy::{overlap_score, tag, tag_with_threshold, TagOutcome};

use serde::{Deserialize, Serialize};

/// Which placement strategy chapter rendering uses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleStrategy {
    #[default]
    Align,
    Fuzzy,
}
