/// HTML rendering: frequency-sized words, tooltip bindings, subtitle markers

pub mod dom;
pub mod markdown;
pub mod segments;
pub mod page;

pub use dom::{Element, Node};
pub use markdown::{plain_text, protect_tooltip_links, strip_tooltip_links, Protected};
pub use segments::subtitle_marker;
pub use page::{render_chapter_page, render_toc, Navigation, PageOptions};

use serde::{Deserialize, Serialize};

use crate::library::TooltipTable;
use crate::text::{tokenize, WhitespaceMode, WordFrequencyTable};

/// Elements whose text is never split into word spans
const UNSIZED_ELEMENTS: &[&str] = &["code", "pre", "script", "style", "kbd", "samp"];

/// Attribute that binds a span to a tooltip entry
pub const TOOLTIP_ATTR: &str = "data-tooltip-id";

/// Font sizing and class names used for word spans
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderOptions {
    /// Size in px for words with no recorded frequency
    pub base_font_size: f64,

    /// Extra px added for the most frequent word
    pub max_font_size_increase: f64,

    /// Class for spans bound to a tooltip
    pub tooltip_class: String,

    /// Class for plain frequency-sized spans
    pub frequency_class: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            base_font_size: 16.0,
            max_font_size_increase: 12.0,
            tooltip_class: "tooltip-word".to_string(),
            frequency_class: "freq-word".to_string(),
        }
    }
}

impl RenderOptions {
    /// Linear interpolation between the base size and base + increase
    pub fn font_size(&self, freq: u32, max_freq: u32) -> f64 {
        if freq == 0 {
            return self.base_font_size;
        }
        let ratio = freq as f64 / max_freq.max(1) as f64;
        self.base_font_size + ratio * self.max_font_size_increase
    }
}

/// CSS pixel value with at most two decimals
pub fn format_px(size: f64) -> String {
    let rounded = (size * 100.0).round() / 100.0;
    format!("{}px", rounded)
}

/// Borrowed view over everything word rendering needs
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    pub tooltips: &'a TooltipTable,
    pub frequency: &'a WordFrequencyTable,
    pub options: &'a RenderOptions,
}

impl<'a> Renderer<'a> {
    pub fn new(tooltips: &'a TooltipTable, frequency: &'a WordFrequencyTable, options: &'a RenderOptions) -> Self {
        Self {
            tooltips,
            frequency,
            options,
        }
    }

    /// Frequency-derived size for a word
    pub fn size_of(&self, word: &str) -> f64 {
        let freq = self.frequency.get(&word.to_lowercase());
        self.options.font_size(freq, self.frequency.max_freq())
    }

    /// Span for a word, bound to `tooltip_id` when given
    pub fn word_span(&self, word: &str, tooltip_id: Option<&str>) -> Element {
        let size = format!("font-size: {}", format_px(self.size_of(word)));
        let span = match tooltip_id {
            Some(id) => Element::new("span")
                .with_attr("class", self.options.tooltip_class.as_str())
                .with_attr(TOOLTIP_ATTR, id),
            None => Element::new("span").with_attr("class", self.options.frequency_class.as_str()),
        };
        span.with_attr("style", size).with_children(vec![Node::text(word)])
    }

    /// Split one text run into sized word spans and plain text
    pub fn size_text(&self, text: &str) -> Vec<Node> {
        let mut nodes = Vec::new();

        for token in tokenize(text, WhitespaceMode::Emit) {
            if !token.is_word() {
                dom::push_text(&mut nodes, &token.word);
                continue;
            }

            let lower = token.word.to_lowercase();
            if self.tooltips.contains(&lower) {
                nodes.push(self.word_span(&token.word, Some(&lower)).into());
            } else if self.frequency.get(&lower) > 0 {
                nodes.push(self.word_span(&token.word, None).into());
            } else {
                dom::push_text(&mut nodes, &token.word);
            }
        }

        nodes
    }

    /// Rebuild a tree with every text node split into sized words.
    ///
    /// Element structure is kept as is. Tooltip spans and code-like
    /// elements are copied untouched.
    pub fn size_words(&self, nodes: &[Node]) -> Vec<Node> {
        let mut out = Vec::with_capacity(nodes.len());

        for node in nodes {
            match node {
                Node::Text(text) => {
                    for sized in self.size_text(text) {
                        match sized {
                            Node::Text(plain) => dom::push_text(&mut out, &plain),
                            other => out.push(other),
                        }
                    }
                }
                Node::Element(element)
                    if element.has_attr(TOOLTIP_ATTR) || UNSIZED_ELEMENTS.contains(&element.name.as_str()) =>
                {
                    out.push(node.clone());
                }
                Node::Element(element) => {
                    out.push(Node::Element(Element {
                        name: element.name.clone(),
                        attrs: element.attrs.clone(),
                        children: self.size_words(&element.children),
                    }));
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::TooltipEntry;
    use crate::text::{count, WordSet};

    fn fixtures() -> (TooltipTable, WordFrequencyTable, RenderOptions) {
        let mut tooltips = TooltipTable::default();
        tooltips.insert("fox", TooltipEntry::with_description("A small wild canine"));
        let frequency = count(
            &["fox fox fox fox", "quick quick", "lazy"],
            &WordSet::default(),
            &WordSet::default(),
        );
        (tooltips, frequency, RenderOptions::default())
    }

    #[test]
    fn test_font_size_law() {
        let options = RenderOptions::default();
        assert_eq!(options.font_size(0, 10), 16.0);
        assert_eq!(options.font_size(5, 10), 22.0);
        assert_eq!(options.font_size(10, 10), 28.0);
        assert_eq!(format_px(16.0), "16px");
        assert_eq!(format_px(19.0 + 1.0 / 3.0), "19.33px");
    }

    #[test]
    fn test_size_text_wraps_known_words() {
        let (tooltips, frequency, options) = fixtures();
        let renderer = Renderer::new(&tooltips, &frequency, &options);

        let html = dom::to_html(&renderer.size_text("The quick Fox, unseen."));
        assert_eq!(
            html,
            "The <span class=\"freq-word\" style=\"font-size: 22px\">quick</span> \
             <span class=\"tooltip-word\" data-tooltip-id=\"fox\" style=\"font-size: 28px\">Fox</span>, unseen."
        );
    }

    #[test]
    fn test_size_words_keeps_structure() {
        let (tooltips, frequency, options) = fixtures();
        let renderer = Renderer::new(&tooltips, &frequency, &options);

        let nodes = dom::parse_fragment("<p><em>lazy</em> dog <code>fox</code></p>");
        let sized = renderer.size_words(&nodes);
        let paragraph = sized[0].as_element().unwrap();

        assert_eq!(paragraph.name, "p");
        assert_eq!(paragraph.children.len(), 3);
        assert_eq!(
            dom::to_html(&sized),
            "<p><em><span class=\"freq-word\" style=\"font-size: 19px\">lazy</span></em> dog <code>fox</code></p>"
        );
        assert_eq!(dom::text_content(&sized), dom::text_content(&nodes));
    }
}
