//! Two-phase markdown rendering.
//!
//! `[[word|id]]` links are swapped for opaque placeholders before the
//! markdown engine runs, then replaced by their tooltip span markup. The
//! resulting tree goes through the word-sizing walk.

use markdown::{to_html_with_options, Options as MarkdownOptions};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use super::dom::{self, Node};
use super::Renderer;
use crate::error::{ReaderError, Result};

static TOOLTIP_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]|]+)\|([^\[\]|]+)\]\]").expect("valid pattern"));

// Private-use delimiters: no markdown meaning and never produced by the engine.
const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Markdown with tooltip links replaced by placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protected {
    pub text: String,
    /// Placeholder and the span markup it stands for, in order of appearance
    pub placeholders: Vec<(String, String)>,
}

impl Protected {
    /// Put the recorded span markup back in place of each placeholder
    pub fn restore(&self, html: &str) -> String {
        self.placeholders
            .iter()
            .fold(html.to_string(), |acc, (placeholder, markup)| acc.replace(placeholder, markup))
    }
}

/// Swap every `[[word|id]]` for a placeholder, recording its rendered span
pub fn protect_tooltip_links(markdown: &str, renderer: &Renderer<'_>) -> Protected {
    let mut placeholders = Vec::new();

    let text = TOOLTIP_LINK
        .replace_all(markdown, |caps: &Captures<'_>| {
            let word = caps[1].trim();
            let id = caps[2].trim().to_lowercase();
            let placeholder = format!("{PLACEHOLDER_OPEN}tooltip{}{PLACEHOLDER_CLOSE}", placeholders.len());
            let span = renderer.word_span(word, Some(&id));
            placeholders.push((placeholder.clone(), dom::to_html(&[span.into()])));
            placeholder
        })
        .into_owned();

    Protected { text, placeholders }
}

fn markdown_options() -> MarkdownOptions {
    let mut options = MarkdownOptions::gfm();
    // Chapter text is trusted and may carry inline HTML.
    options.compile.allow_dangerous_html = true;
    options.compile.gfm_tagfilter = false;
    options
}

/// Run the markdown engine
pub fn markdown_to_html(markdown: &str) -> Result<String> {
    to_html_with_options(markdown, &markdown_options()).map_err(|e| ReaderError::Markdown(e.to_string()))
}

impl Renderer<'_> {
    /// Render markdown into a sized node tree
    pub fn render_markdown(&self, markdown: &str) -> Result<Vec<Node>> {
        let protected = protect_tooltip_links(markdown, self);
        let html = protected.restore(&markdown_to_html(&protected.text)?);
        debug!("Rendered markdown with {} tooltip links", protected.placeholders.len());

        let nodes = dom::parse_fragment(&html);
        Ok(self.size_words(&nodes))
    }

    /// Render markdown straight to an HTML string
    pub fn render_markdown_html(&self, markdown: &str) -> Result<String> {
        Ok(dom::to_html(&self.render_markdown(markdown)?))
    }
}

/// Markdown with every `[[word|id]]` reduced to `word`
pub fn strip_tooltip_links(markdown: &str) -> String {
    TOOLTIP_LINK
        .replace_all(markdown, |caps: &Captures<'_>| caps[1].trim().to_string())
        .into_owned()
}

/// Text content of rendered markdown, tooltip links reduced to their word
pub fn plain_text(markdown: &str) -> Result<String> {
    let html = markdown_to_html(&strip_tooltip_links(markdown))?;
    Ok(dom::text_content(&dom::parse_fragment(&html)).trim().to_string())
}
