/// Vocab Reader
///
/// Renders chapter text as HTML with vocabulary tooltips, frequency-sized
/// words and subtitle spans for audio-synced reading.

pub mod config;
pub mod error;
pub mod library;
pub mod render;
pub mod state;
pub mod subtitles;
pub mod text;
pub mod video;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{ReaderError, Result, SubtitleError};
pub use crate::library::{Chapter, ChapterIndex, ChapterSummary, Library, Paragraph, TooltipEntry, TooltipTable};
pub use crate::render::{PageOptions, RenderOptions, Renderer};
pub use crate::state::{ReaderState, Route};
pub use crate::subtitles::{align, tag, Alignment, Segment, SubtitleEntry, SubtitleStrategy, SubtitleTrack};
pub use crate::text::{count, tokenize, Token, TokenKind, WhitespaceMode, WordFrequencyTable, WordSet};
pub use crate::video::{FloatingVideo, PlayerMessage, PlayerState};
