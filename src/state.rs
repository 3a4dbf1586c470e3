use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ReaderError, Result};
use crate::library::{Chapter, ChapterIndex, Library, TooltipTable};
use crate::render::page::{document, render_chapter_page, render_toc, Navigation, PageOptions};
use crate::render::{strip_tooltip_links, RenderOptions, Renderer};
use crate::subtitles::SubtitleTrack;
use crate::text::{count, WordFrequencyTable};

/// Client-side route taken from the URL hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Toc,
    Chapter(String),
}

impl Route {
    /// `""` and `"#"` mean the table of contents, `"#id"` a chapter
    pub fn from_hash(hash: &str) -> Self {
        let id = hash.strip_prefix('#').unwrap_or(hash).trim();
        if id.is_empty() {
            return Route::Toc;
        }
        let id = urlencoding::decode(id).map(|decoded| decoded.into_owned()).unwrap_or_else(|_| id.to_string());
        Route::Chapter(id)
    }

    pub fn to_hash(&self) -> String {
        match self {
            Route::Toc => "#".to_string(),
            Route::Chapter(id) => format!("#{}", urlencoding::encode(id)),
        }
    }
}

/// Everything needed to render the site, rebuilt wholesale on each load
#[derive(Debug, Clone, Default)]
pub struct ReaderState {
    pub index: ChapterIndex,
    /// Loaded chapters, in index order
    pub chapters: Vec<Chapter>,
    pub tooltips: TooltipTable,
    pub frequency: WordFrequencyTable,
    /// Subtitle tracks by chapter id
    pub subtitles: HashMap<String, SubtitleTrack>,
    pub render_options: RenderOptions,
    pub page_options: PageOptions,
}

impl ReaderState {
    /// Load the index, then every chapter concurrently, then the tooltip
    /// table and subtitle tracks. Frequencies are counted once all chapters
    /// are in.
    pub async fn load(library: &Library, config: &Config) -> Self {
        let index = library.load_index().await;
        let chapters = library.load_all_chapters(&index).await;
        let tooltips = library.load_tooltips().await;

        let parse_options = config.subtitles.parse_options();
        let tracks = join_all(
            chapters
                .iter()
                .map(|chapter| library.load_subtitles(chapter, &parse_options)),
        )
        .await;
        let subtitles: HashMap<String, SubtitleTrack> = chapters
            .iter()
            .zip(tracks)
            .filter_map(|(chapter, track)| track.map(|track| (chapter.id.clone(), track)))
            .collect();

        let state = Self::from_parts(index, chapters, tooltips, subtitles, config);
        info!(
            "✅ Reader state ready: {} chapters, {} tooltips, {} distinct words, {} subtitle tracks",
            state.chapters.len(),
            state.tooltips.len(),
            state.frequency.len(),
            state.subtitles.len()
        );
        state
    }

    /// Assemble state from already-loaded parts
    pub fn from_parts(
        index: ChapterIndex,
        chapters: Vec<Chapter>,
        tooltips: TooltipTable,
        subtitles: HashMap<String, SubtitleTrack>,
        config: &Config,
    ) -> Self {
        let frequency = corpus_frequency(&chapters, config);

        Self {
            index,
            chapters,
            tooltips,
            frequency,
            subtitles,
            render_options: config.render.clone(),
            page_options: PageOptions {
                strategy: config.subtitles.strategy,
                fuzzy_threshold: config.subtitles.fuzzy_threshold,
                ..PageOptions::default()
            },
        }
    }

    pub fn renderer(&self) -> Renderer<'_> {
        Renderer::new(&self.tooltips, &self.frequency, &self.render_options)
    }

    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|chapter| chapter.id == id)
    }

    pub fn subtitles_for(&self, id: &str) -> Option<&SubtitleTrack> {
        self.subtitles.get(id)
    }

    /// Replace the subtitle track of a chapter
    pub fn set_subtitles(&mut self, id: &str, track: SubtitleTrack) {
        let issues = track.validate();
        if !issues.is_empty() {
            warn!("Subtitle track for {} has {} issues: {}", id, issues.len(), issues.join("; "));
        }
        self.subtitles.insert(id.to_string(), track);
    }

    pub fn navigation(&self, id: &str) -> Navigation<'_> {
        Navigation::around(&self.index, id)
    }

    /// Fragment HTML for a route
    pub fn render_route(&self, route: &Route) -> Result<String> {
        match route {
            Route::Toc => Ok(render_toc(&self.index, &self.page_options)),
            Route::Chapter(id) => {
                let chapter = self
                    .chapter(id)
                    .ok_or_else(|| ReaderError::NotFound(format!("chapter {}", id)))?;
                debug!("Rendering chapter {}", id);
                render_chapter_page(
                    chapter,
                    &self.renderer(),
                    self.subtitles_for(id),
                    self.navigation(id),
                    &self.page_options,
                )
            }
        }
    }

    /// Standalone HTML document for a route
    pub fn render_document(&self, route: &Route) -> Result<String> {
        let title = match route {
            Route::Toc => "Contents".to_string(),
            Route::Chapter(id) => self
                .chapter(id)
                .map(|chapter| chapter.title.clone())
                .unwrap_or_else(|| id.clone()),
        };
        Ok(document(&title, &self.render_route(route)?, &self.page_options))
    }
}

/// Word frequencies over every text paragraph of every chapter
pub fn corpus_frequency(chapters: &[Chapter], config: &Config) -> WordFrequencyTable {
    let paragraphs: Vec<String> = chapters
        .iter()
        .flat_map(Chapter::text_paragraphs)
        .map(strip_tooltip_links)
        .collect();

    count(
        paragraphs.as_slice(),
        &config.frequency.stop_set(),
        &config.frequency.protected_set(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::ChapterSummary;

    fn chapter(id: &str, paragraphs: &[&str]) -> Chapter {
        Chapter {
            id: id.to_string(),
            title: format!("Chapter {}", id),
            paragraphs: paragraphs
                .iter()
                .map(|p| crate::library::Paragraph::Text(p.to_string()))
                .collect(),
            categories: Vec::new(),
            thumbnail: None,
            file: format!("{}.json", id),
            audio: None,
            subtitles: None,
        }
    }

    fn summary(id: &str) -> ChapterSummary {
        ChapterSummary {
            id: id.to_string(),
            title: format!("Chapter {}", id),
            file: format!("{}.json", id),
            thumbnail: None,
            categories: Vec::new(),
        }
    }

    #[test]
    fn test_route_from_hash() {
        assert_eq!(Route::from_hash(""), Route::Toc);
        assert_eq!(Route::from_hash("#"), Route::Toc);
        assert_eq!(Route::from_hash("#fox"), Route::Chapter("fox".to_string()));
        assert_eq!(Route::from_hash("#owl%20moon"), Route::Chapter("owl moon".to_string()));
        assert_eq!(Route::Chapter("owl moon".to_string()).to_hash(), "#owl%20moon");
    }

    #[test]
    fn test_frequency_counts_link_surface_words() {
        let chapters = vec![
            chapter("1", &["The [[fox|vulpes]] ran."]),
            chapter("2", &["The fox sat."]),
        ];
        let frequency = corpus_frequency(&chapters, &Config::default());

        assert_eq!(frequency.get("fox"), 2);
        assert_eq!(frequency.get("vulpes"), 0);
        assert_eq!(frequency.get("the"), 0);
        assert_eq!(frequency.max_freq(), 2);
    }

    #[test]
    fn test_render_routes() {
        let index = ChapterIndex {
            chapters: vec![summary("1"), summary("2")],
        };
        let chapters = vec![chapter("1", &["Hello fox."]), chapter("2", &["Bye fox."])];
        let state = ReaderState::from_parts(
            index,
            chapters,
            TooltipTable::default(),
            HashMap::new(),
            &Config::default(),
        );

        let toc = state.render_route(&Route::Toc).unwrap();
        assert!(toc.contains("href=\"#2\""));

        let page = state.render_route(&Route::Chapter("2".to_string())).unwrap();
        assert!(page.contains("<a class=\"prev\" href=\"#1\">"));
        assert!(page.contains("font-size: 28px"));

        assert!(matches!(
            state.render_route(&Route::Chapter("9".to_string())),
            Err(ReaderError::NotFound(_))
        ));

        let doc = state.render_document(&Route::Chapter("1".to_string())).unwrap();
        assert!(doc.contains("<title>Chapter 1</title>"));
    }
}
