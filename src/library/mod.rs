/// Chapter content, tooltip data and the sources they are loaded from
///
/// Loading never fails the caller: every `load_*` on [`Library`] logs the
/// problem and hands back an empty default.

pub mod source;
pub mod loader;
pub mod tooltips;

pub use source::{ContentSource, FsSource, HttpSource};
pub use loader::Library;
pub use tooltips::{TooltipEntry, TooltipTable};

use serde::{Deserialize, Deserializer, Serialize};

/// Entry in the chapter index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChapterSummary {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    /// Content file name relative to the data directory
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// `chapters.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChapterIndex {
    #[serde(default)]
    pub chapters: Vec<ChapterSummary>,
}

impl ChapterIndex {
    pub fn get(&self, id: &str) -> Option<&ChapterSummary> {
        self.chapters.iter().find(|chapter| chapter.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.chapters.iter().position(|chapter| chapter.id == id)
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}

/// A paragraph is markdown text or an embedded video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Paragraph {
    Text(String),
    Video { video: String },
}

impl Paragraph {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Paragraph::Text(text) => Some(text),
            Paragraph::Video { .. } => None,
        }
    }
}

/// Chapter content file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Source file, filled in from the index entry
    #[serde(default)]
    pub file: String,
    /// Narration audio for subtitle-synced playback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Subtitle track file relative to the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<String>,
}

impl Chapter {
    /// Markdown paragraphs only
    pub fn text_paragraphs(&self) -> impl Iterator<Item = &str> {
        self.paragraphs.iter().filter_map(Paragraph::as_text)
    }
}

/// Ids appear as strings or numbers in data files
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid chapter id: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_with_mixed_paragraphs() {
        let json = r#"{
            "id": 3,
            "title": "The Fox",
            "paragraphs": ["A [[fox|fox]] appears.", {"video": "https://youtu.be/abc123"}, "It leaves."]
        }"#;
        let chapter: Chapter = serde_json::from_str(json).unwrap();

        assert_eq!(chapter.id, "3");
        assert_eq!(chapter.paragraphs.len(), 3);
        assert_eq!(
            chapter.paragraphs[1],
            Paragraph::Video {
                video: "https://youtu.be/abc123".to_string()
            }
        );
        assert_eq!(chapter.text_paragraphs().count(), 2);
        assert!(chapter.subtitles.is_none());
    }

    #[test]
    fn test_index_lookup() {
        let json = r#"{"chapters": [
            {"id": "intro", "title": "Intro", "file": "intro.json"},
            {"id": "fox", "title": "Fox", "file": "fox.json", "thumbnail": "fox.png", "categories": ["animals"]}
        ]}"#;
        let index: ChapterIndex = serde_json::from_str(json).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.position("fox"), Some(1));
        assert_eq!(index.get("fox").unwrap().categories, vec!["animals"]);
        assert!(index.get("missing").is_none());
    }

    #[test]
    fn test_invalid_id_rejected() {
        let json = r#"{"id": [1], "title": "x"}"#;
        assert!(serde_json::from_str::<Chapter>(json).is_err());
    }
}
