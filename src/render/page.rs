//! Chapter and table-of-contents pages.

use std::collections::BTreeSet;
use tracing::debug;

use super::dom::{self, Element, Node};
use super::{Renderer, TOOLTIP_ATTR};
use crate::error::Result;
use crate::library::{Chapter, ChapterIndex, ChapterSummary, Paragraph};
use crate::subtitles::fuzzy::DEFAULT_THRESHOLD;
use crate::subtitles::{align, tag_with_threshold, SubtitleStrategy, SubtitleTrack};
use crate::video::embed_element;

/// Link targets and subtitle placement for rendered pages
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Prepended to the url-encoded chapter id in chapter links
    pub chapter_prefix: String,
    /// Link back to the table of contents
    pub toc_href: String,
    /// Stylesheet linked from full documents
    pub stylesheet: Option<String>,
    pub strategy: SubtitleStrategy,
    pub fuzzy_threshold: f64,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            chapter_prefix: "#".to_string(),
            toc_href: "#".to_string(),
            stylesheet: None,
            strategy: SubtitleStrategy::Align,
            fuzzy_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl PageOptions {
    pub fn chapter_href(&self, id: &str) -> String {
        format!("{}{}", self.chapter_prefix, urlencoding::encode(id))
    }
}

/// Chapters either side of the one being rendered
#[derive(Debug, Clone, Copy, Default)]
pub struct Navigation<'a> {
    pub previous: Option<&'a ChapterSummary>,
    pub next: Option<&'a ChapterSummary>,
}

impl<'a> Navigation<'a> {
    pub fn around(index: &'a ChapterIndex, id: &str) -> Self {
        match index.position(id) {
            Some(position) => Self {
                previous: position.checked_sub(1).and_then(|p| index.chapters.get(p)),
                next: index.chapters.get(position + 1),
            },
            None => Self::default(),
        }
    }
}

/// Render one chapter as an `<article>` fragment.
///
/// With a non-empty subtitle track, text paragraphs are placed against it
/// using the configured strategy.
pub fn render_chapter_page(
    chapter: &Chapter,
    renderer: &Renderer<'_>,
    subtitles: Option<&SubtitleTrack>,
    navigation: Navigation<'_>,
    options: &PageOptions,
) -> Result<String> {
    let track = subtitles.filter(|track| !track.is_empty());

    let body = match (track, options.strategy) {
        (None, _) => render_paragraphs(chapter, renderer)?,
        (Some(track), SubtitleStrategy::Align) => render_aligned(chapter, renderer, track)?,
        (Some(track), SubtitleStrategy::Fuzzy) => {
            let nodes = render_paragraphs(chapter, renderer)?;
            tag_with_threshold(track.entries(), &nodes, options.fuzzy_threshold).nodes
        }
    };

    let mut tooltip_ids = BTreeSet::new();
    collect_tooltip_ids(&body, &mut tooltip_ids);
    let tooltips = renderer.tooltips.subset(tooltip_ids.iter().map(String::as_str));
    debug!(
        "Chapter {} rendered with {} tooltips referenced",
        chapter.id,
        tooltips.len()
    );

    let mut children = vec![Node::Element(
        Element::new("h1").with_children(vec![Node::text(chapter.title.as_str())]),
    )];
    if let Some(audio) = &chapter.audio {
        children.push(Node::Element(
            Element::new("audio")
                .with_attr("class", "chapter-audio")
                .with_attr("controls", "")
                .with_attr("src", audio.as_str()),
        ));
    }
    children.push(Node::Element(
        Element::new("div").with_attr("class", "chapter-content").with_children(body),
    ));
    children.push(Node::Element(navigation_element(navigation, options)));
    children.push(Node::Element(json_script("tooltip-data", &serde_json::to_string(&tooltips)?)));
    if let Some(track) = track {
        children.push(Node::Element(json_script(
            "subtitle-data",
            &serde_json::to_string(track.entries())?,
        )));
    }

    let article = Element::new("article")
        .with_attr("class", "chapter")
        .with_attr("data-chapter-id", chapter.id.as_str())
        .with_children(children);

    Ok(dom::to_html(&[article.into()]))
}

/// Render the chapter list
pub fn render_toc(index: &ChapterIndex, options: &PageOptions) -> String {
    let cards = index
        .chapters
        .iter()
        .map(|summary| {
            let mut link_children = Vec::new();
            if let Some(thumbnail) = &summary.thumbnail {
                link_children.push(Node::Element(
                    Element::new("img")
                        .with_attr("class", "thumbnail")
                        .with_attr("src", thumbnail.as_str())
                        .with_attr("alt", summary.title.as_str()),
                ));
            }
            link_children.push(Node::Element(
                Element::new("span")
                    .with_attr("class", "chapter-title")
                    .with_children(vec![Node::text(summary.title.as_str())]),
            ));

            let mut card_children = vec![Node::Element(
                Element::new("a")
                    .with_attr("href", options.chapter_href(&summary.id))
                    .with_children(link_children),
            )];
            if !summary.categories.is_empty() {
                let categories = summary
                    .categories
                    .iter()
                    .map(|category| Node::Element(Element::new("li").with_children(vec![Node::text(category.as_str())])))
                    .collect();
                card_children.push(Node::Element(
                    Element::new("ul").with_attr("class", "categories").with_children(categories),
                ));
            }

            Node::Element(
                Element::new("li")
                    .with_attr("class", "chapter-card")
                    .with_attr("data-categories", summary.categories.join(" "))
                    .with_children(card_children),
            )
        })
        .collect();

    let toc = Element::new("section").with_attr("class", "toc").with_children(vec![
        Node::Element(Element::new("h1").with_children(vec![Node::text("Contents")])),
        Node::Element(Element::new("ul").with_attr("class", "chapter-list").with_children(cards)),
    ]);

    dom::to_html(&[toc.into()])
}

/// Wrap a rendered fragment in a standalone HTML document
pub fn document(title: &str, body: &str, options: &PageOptions) -> String {
    let stylesheet = options
        .stylesheet
        .as_deref()
        .map(|href| format!("<link rel=\"stylesheet\" href=\"{}\">", dom::escape_attr(href)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n{}\n</head>\n<body>\n{}\n</body>\n</html>\n",
        dom::escape_text(title),
        stylesheet,
        body
    )
}

fn render_paragraphs(chapter: &Chapter, renderer: &Renderer<'_>) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    for paragraph in &chapter.paragraphs {
        match paragraph {
            Paragraph::Text(text) => nodes.extend(renderer.render_markdown(text)?),
            Paragraph::Video { video } => nodes.push(embed_element(video).into()),
        }
    }
    Ok(nodes)
}

fn render_aligned(chapter: &Chapter, renderer: &Renderer<'_>, track: &SubtitleTrack) -> Result<Vec<Node>> {
    let mut cursor = 0;
    let mut nodes = Vec::new();

    for paragraph in &chapter.paragraphs {
        match paragraph {
            Paragraph::Text(text) => {
                let rendered = renderer.render_markdown(text)?;
                let alignment = align(&dom::text_content(&rendered), track.entries(), cursor);
                cursor = alignment.next_cursor;
                nodes.push(renderer.overlay_alignment(rendered, &alignment, track.entries()).into());
            }
            Paragraph::Video { video } => nodes.push(embed_element(video).into()),
        }
    }
    Ok(nodes)
}

fn navigation_element(navigation: Navigation<'_>, options: &PageOptions) -> Element {
    let link = |class: &str, href: String, label: String| {
        Node::Element(
            Element::new("a")
                .with_attr("class", class)
                .with_attr("href", href)
                .with_children(vec![Node::text(label)]),
        )
    };

    let mut links = Vec::new();
    if let Some(previous) = navigation.previous {
        links.push(link("prev", options.chapter_href(&previous.id), format!("← {}", previous.title)));
    }
    links.push(link("toc", options.toc_href.clone(), "Contents".to_string()));
    if let Some(next) = navigation.next {
        links.push(link("next", options.chapter_href(&next.id), format!("{} →", next.title)));
    }

    Element::new("nav").with_attr("class", "chapter-nav").with_children(links)
}

fn json_script(id: &str, json: &str) -> Element {
    Element::new("script")
        .with_attr("type", "application/json")
        .with_attr("id", id)
        .with_children(vec![Node::text(json.replace("</", "<\\/"))])
}

fn collect_tooltip_ids(nodes: &[Node], ids: &mut BTreeSet<String>) {
    for node in nodes {
        if let Node::Element(element) = node {
            if let Some(id) = element.attr(TOOLTIP_ATTR) {
                ids.insert(id.to_string());
            }
            collect_tooltip_ids(&element.children, ids);
        }
    }
}
