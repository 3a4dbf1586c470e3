//! API data models

use serde::{Deserialize, Serialize};

use crate::library::{Chapter, ChapterSummary};
use crate::subtitles::SubtitleEntry;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Chapter index entry for API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ChapterListItem {
    #[serde(flatten)]
    pub summary: ChapterSummary,
    pub loaded: bool,
    pub has_subtitles: bool,
}

/// Chapter content with its rendered page
#[derive(Debug, Serialize, Deserialize)]
pub struct ChapterDetail {
    pub chapter: Chapter,
    pub html: String,
    pub subtitles: Vec<SubtitleEntry>,
}

/// Counts after a state reload
#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadSummary {
    pub chapters: usize,
    pub tooltips: usize,
    pub words: usize,
    pub subtitle_tracks: usize,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}
