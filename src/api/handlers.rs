//! API request handlers

use anyhow::{anyhow, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::models::{ChapterDetail, ChapterListItem, ReloadSummary};
use crate::config::Config;
use crate::library::Library;
use crate::render::PageOptions;
use crate::state::{ReaderState, Route};

/// Handle health check requests
pub async fn health_check() -> Result<Value> {
    Ok(serde_json::json!({
        "status": "healthy",
        "service": "vocab-reader",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Link chapter pages to server routes instead of URL hashes
pub fn server_page_options(base: &PageOptions, config: &Config) -> PageOptions {
    PageOptions {
        chapter_prefix: "/chapter/".to_string(),
        toc_href: "/".to_string(),
        stylesheet: config
            .server
            .static_dir
            .as_ref()
            .map(|_| "/static/reader.css".to_string()),
        ..base.clone()
    }
}

/// Handle chapter listing requests
pub async fn list_chapters(reader: &Arc<RwLock<ReaderState>>) -> Result<Vec<ChapterListItem>> {
    let state = reader.read().await;

    Ok(state
        .index
        .chapters
        .iter()
        .map(|summary| ChapterListItem {
            summary: summary.clone(),
            loaded: state.chapter(&summary.id).is_some(),
            has_subtitles: state.subtitles_for(&summary.id).is_some(),
        })
        .collect())
}

/// Handle chapter detail requests
pub async fn get_chapter(reader: &Arc<RwLock<ReaderState>>, id: &str) -> Result<ChapterDetail> {
    let state = reader.read().await;
    let chapter = state
        .chapter(id)
        .ok_or_else(|| anyhow!("Chapter not found: {}", id))?;
    let html = state.render_route(&Route::Chapter(id.to_string()))?;

    Ok(ChapterDetail {
        chapter: chapter.clone(),
        html,
        subtitles: state
            .subtitles_for(id)
            .map(|track| track.entries().to_vec())
            .unwrap_or_default(),
    })
}

/// Handle tooltip table requests
pub async fn get_tooltips(reader: &Arc<RwLock<ReaderState>>) -> Result<Value> {
    let state = reader.read().await;
    Ok(serde_json::to_value(&state.tooltips)?)
}

/// Render a full HTML page for a route
pub async fn render_page(reader: &Arc<RwLock<ReaderState>>, route: &Route) -> Result<String> {
    let state = reader.read().await;
    Ok(state.render_document(route)?)
}

/// Load fresh state for the server
pub async fn load_state(library: &Library, config: &Config) -> ReaderState {
    let mut state = ReaderState::load(library, config).await;
    state.page_options = server_page_options(&state.page_options, config);
    state
}

/// Handle reload requests.
///
/// The new state is built without holding the lock and swapped in whole.
pub async fn reload(reader: &Arc<RwLock<ReaderState>>, library: &Library, config: &Config) -> Result<ReloadSummary> {
    let state = load_state(library, config).await;
    let summary = ReloadSummary {
        chapters: state.chapters.len(),
        tooltips: state.tooltips.len(),
        words: state.frequency.len(),
        subtitle_tracks: state.subtitles.len(),
    };

    *reader.write().await = state;
    info!("🔄 Reader state reloaded: {} chapters", summary.chapters);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{Chapter, ChapterIndex, ChapterSummary, Paragraph, TooltipTable};
    use std::collections::HashMap;

    fn reader() -> Arc<RwLock<ReaderState>> {
        let index = ChapterIndex {
            chapters: vec![ChapterSummary {
                id: "1".to_string(),
                title: "One".to_string(),
                file: "1.json".to_string(),
                thumbnail: None,
                categories: Vec::new(),
            }],
        };
        let chapter = Chapter {
            id: "1".to_string(),
            title: "One".to_string(),
            paragraphs: vec![Paragraph::Text("A fox.".to_string())],
            categories: Vec::new(),
            thumbnail: None,
            file: "1.json".to_string(),
            audio: None,
            subtitles: None,
        };
        let config = Config::default();
        let mut state = ReaderState::from_parts(index, vec![chapter], TooltipTable::default(), HashMap::new(), &config);
        state.page_options = server_page_options(&state.page_options, &config);
        Arc::new(RwLock::new(state))
    }

    #[tokio::test]
    async fn test_health_check() {
        let health = health_check().await.unwrap();
        assert_eq!(health["status"], "healthy");
    }

    #[tokio::test]
    async fn test_chapter_handlers() {
        let reader = reader();

        let list = list_chapters(&reader).await.unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].loaded);
        assert!(!list[0].has_subtitles);

        let detail = get_chapter(&reader, "1").await.unwrap();
        assert!(detail.html.contains("<a class=\"toc\" href=\"/\">Contents</a>"));
        assert!(get_chapter(&reader, "2").await.is_err());

        let page = render_page(&reader, &Route::Toc).await.unwrap();
        assert!(page.contains("href=\"/chapter/1\""));
    }
}
