use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::source::{ContentSource, FsSource, HttpSource};
use super::{Chapter, ChapterIndex, ChapterSummary, TooltipTable};
use crate::config::DataConfig;
use crate::error::Result;
use crate::subtitles::{parse_with_options, ParseOptions, SubtitleTrack};

/// Loads the chapter index, chapter contents, tooltips and subtitle tracks
#[derive(Clone)]
pub struct Library {
    source: Arc<dyn ContentSource>,
    index_file: String,
    tooltips_file: String,
}

impl Library {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            index_file: "chapters.json".to_string(),
            tooltips_file: "tooltips.json".to_string(),
        }
    }

    /// Pick an HTTP source when a base URL is configured, the data directory otherwise
    pub fn from_config(config: &DataConfig) -> Result<Self> {
        let source: Arc<dyn ContentSource> = match &config.base_url {
            Some(base_url) => Arc::new(HttpSource::new(base_url, config.request_timeout_seconds)?),
            None => Arc::new(FsSource::new(config.data_dir.clone())),
        };
        info!("📁 Chapter data source: {}", source.describe());

        Ok(Self {
            source,
            index_file: config.index_file.clone(),
            tooltips_file: config.tooltips_file.clone(),
        })
    }

    pub fn source(&self) -> &dyn ContentSource {
        self.source.as_ref()
    }

    pub async fn try_load_index(&self) -> Result<ChapterIndex> {
        let content = self.source.fetch_text(&self.index_file).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Chapter index, empty when it cannot be loaded
    pub async fn load_index(&self) -> ChapterIndex {
        match self.try_load_index().await {
            Ok(index) => {
                info!("📚 Loaded chapter index with {} chapters", index.len());
                index
            }
            Err(e) => {
                warn!("Failed to load chapter index {}: {}", self.index_file, e);
                ChapterIndex::default()
            }
        }
    }

    pub async fn try_load_chapter(&self, summary: &ChapterSummary) -> Result<Chapter> {
        let content = self.source.fetch_text(&summary.file).await?;
        let mut chapter: Chapter = serde_json::from_str(&content)?;
        chapter.file = summary.file.clone();
        if chapter.thumbnail.is_none() {
            chapter.thumbnail = summary.thumbnail.clone();
        }
        if chapter.categories.is_empty() {
            chapter.categories = summary.categories.clone();
        }
        Ok(chapter)
    }

    /// Chapter content, `None` when it cannot be loaded
    pub async fn load_chapter(&self, summary: &ChapterSummary) -> Option<Chapter> {
        match self.try_load_chapter(summary).await {
            Ok(chapter) => {
                debug!("Loaded chapter {} ({} paragraphs)", chapter.id, chapter.paragraphs.len());
                Some(chapter)
            }
            Err(e) => {
                warn!("Failed to load chapter {} from {}: {}", summary.id, summary.file, e);
                None
            }
        }
    }

    /// Fetch every chapter concurrently and wait for all of them.
    ///
    /// Chapters that fail to load are left out; order follows the index.
    pub async fn load_all_chapters(&self, index: &ChapterIndex) -> Vec<Chapter> {
        let loads = index.chapters.iter().map(|summary| self.load_chapter(summary));
        let chapters: Vec<Chapter> = join_all(loads).await.into_iter().flatten().collect();
        info!("📖 Loaded {}/{} chapters", chapters.len(), index.len());
        chapters
    }

    pub async fn try_load_tooltips(&self) -> Result<TooltipTable> {
        let content = self.source.fetch_text(&self.tooltips_file).await?;
        TooltipTable::from_json(&content)
    }

    /// Tooltip table, empty when it cannot be loaded
    pub async fn load_tooltips(&self) -> TooltipTable {
        self.try_load_tooltips().await.unwrap_or_else(|e| {
            warn!("Failed to load tooltips {}: {}", self.tooltips_file, e);
            TooltipTable::default()
        })
    }

    pub async fn try_load_subtitles(&self, path: &str, options: &ParseOptions) -> Result<SubtitleTrack> {
        let content = self.source.fetch_text(path).await?;
        Ok(SubtitleTrack::new(parse_with_options(&content, options)?))
    }

    /// Subtitle track referenced by a chapter, if any and if it parses
    pub async fn load_subtitles(&self, chapter: &Chapter, options: &ParseOptions) -> Option<SubtitleTrack> {
        let path = chapter.subtitles.as_deref()?;
        match self.try_load_subtitles(path, options).await {
            Ok(track) => {
                debug!("Loaded {} subtitles for chapter {}", track.len(), chapter.id);
                Some(track)
            }
            Err(e) => {
                warn!("Failed to load subtitles {} for chapter {}: {}", path, chapter.id, e);
                None
            }
        }
    }
}
