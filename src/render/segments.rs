use std::ops::Range;

use super::dom::{self, Element, Node};
use super::Renderer;
use crate::subtitles::{Alignment, Segment, SubtitleEntry};

/// Class shared by aligned and fuzzily tagged subtitle spans
pub const SUBTITLE_CLASS: &str = "subtitle-span";

/// Empty span carrying the timing of a subtitle, for highlight and seek
pub fn subtitle_marker(entry: &SubtitleEntry, index: usize) -> Element {
    Element::new("span")
        .with_attr("class", SUBTITLE_CLASS)
        .with_attr("data-subtitle-index", index.to_string())
        .with_attr("data-subtitle-id", entry.id.to_string())
        .with_attr("data-start", entry.start.to_string())
        .with_attr("data-end", entry.end.to_string())
}

/// Character range over the concatenated text nodes of a tree.
///
/// Text inside the range is wrapped in `marker`, or dropped when there is
/// no marker.
#[derive(Debug, Clone)]
pub struct TextMark {
    pub range: Range<usize>,
    pub marker: Option<Element>,
}

impl TextMark {
    pub fn wrap(range: Range<usize>, marker: Element) -> Self {
        Self {
            range,
            marker: Some(marker),
        }
    }

    pub fn cut(range: Range<usize>) -> Self {
        Self { range, marker: None }
    }
}

/// Apply non-overlapping marks to a tree.
///
/// Elements lying wholly inside one mark are wrapped as they are, so
/// tooltip spans and inline markup survive. Text nodes are split at mark
/// edges. Neighbouring pieces under the same mark share one marker span.
pub fn mark_text(nodes: Vec<Node>, marks: &[TextMark]) -> Vec<Node> {
    mark_children(nodes, marks, &mut 0)
}

fn mark_children(children: Vec<Node>, marks: &[TextMark], offset: &mut usize) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len());
    // mark whose span is the last node of `out`
    let mut open = None;

    for child in children {
        let start = *offset;
        let length = dom::text_content(std::slice::from_ref(&child)).chars().count();
        let end = start + length;

        let enclosing = marks
            .iter()
            .position(|mark| mark.range.start <= start && end <= mark.range.end);
        if let (true, Some(index)) = (length > 0, enclosing) {
            *offset = end;
            place(&mut out, &mut open, index, &marks[index], child);
            continue;
        }

        match child {
            Node::Text(text) => {
                *offset = end;
                let mut cuts = vec![0, length];
                for mark in marks {
                    for edge in [mark.range.start, mark.range.end] {
                        if edge > start && edge < end {
                            cuts.push(edge - start);
                        }
                    }
                }
                cuts.sort_unstable();
                cuts.dedup();

                for pair in cuts.windows(2) {
                    let piece = &text[byte_index(&text, pair[0])..byte_index(&text, pair[1])];
                    let position = start + pair[0];
                    match marks.iter().position(|mark| mark.range.contains(&position)) {
                        Some(index) => place(&mut out, &mut open, index, &marks[index], Node::text(piece)),
                        None => {
                            open = None;
                            dom::push_text(&mut out, piece);
                        }
                    }
                }
            }
            Node::Element(mut element) => {
                element.children = mark_children(element.children, marks, offset);
                *offset = end;
                open = None;
                out.push(Node::Element(element));
            }
        }
    }

    out
}

fn place(out: &mut Vec<Node>, open: &mut Option<usize>, index: usize, mark: &TextMark, node: Node) {
    let Some(marker) = &mark.marker else {
        return;
    };

    if *open == Some(index) {
        if let Some(Node::Element(span)) = out.last_mut() {
            match node {
                Node::Text(text) => dom::push_text(&mut span.children, &text),
                other => span.children.push(other),
            }
            return;
        }
    }

    out.push(Node::Element(marker.clone().with_children(vec![node])));
    *open = Some(index);
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

impl Renderer<'_> {
    fn segment_nodes(&self, segment: &Segment, subtitles: &[SubtitleEntry]) -> Vec<Node> {
        let sized = self.size_text(segment.text());
        match segment.subtitle_index().and_then(|index| subtitles.get(index).map(|entry| (index, entry))) {
            Some((index, entry)) => vec![Node::Element(subtitle_marker(entry, index).with_children(sized))],
            None => sized,
        }
    }

    /// Render an aligned paragraph as a `<p>` of subtitle spans and plain runs
    pub fn render_segments(&self, alignment: &Alignment, subtitles: &[SubtitleEntry]) -> Element {
        let children = alignment
            .segments
            .iter()
            .flat_map(|segment| self.segment_nodes(segment, subtitles))
            .collect();

        Element::new("p").with_attr("class", "aligned").with_children(children)
    }

    /// Lay an alignment over an already-rendered paragraph.
    ///
    /// `alignment` must come from the text content of `rendered`. Matched
    /// subtitles are mapped back onto the tree by character range. Forced
    /// subtitles replace the unmatched tail and are appended, with their
    /// caption text, to the last block.
    pub fn overlay_alignment(&self, rendered: Vec<Node>, alignment: &Alignment, subtitles: &[SubtitleEntry]) -> Element {
        let placed = alignment.forced_from.unwrap_or(alignment.segments.len());
        let (matched, forced) = alignment.segments.split_at(placed.min(alignment.segments.len()));

        let mut marks = Vec::new();
        let mut offset = 0;
        for segment in matched {
            let length = segment.text().chars().count();
            if let Some(index) = segment.subtitle_index() {
                if let Some(entry) = subtitles.get(index) {
                    marks.push(TextMark::wrap(offset..offset + length, subtitle_marker(entry, index)));
                }
            }
            offset += length;
        }
        if !forced.is_empty() {
            marks.push(TextMark::cut(offset..usize::MAX));
        }

        let mut children = mark_text(rendered, &marks);

        let tail: Vec<Node> = forced
            .iter()
            .flat_map(|segment| self.segment_nodes(segment, subtitles))
            .collect();
        match children.iter().rposition(|node| matches!(node, Node::Element(_))) {
            Some(position) => {
                if let Node::Element(block) = &mut children[position] {
                    block.children.extend(tail);
                }
            }
            None => children.extend(tail),
        }

        Element::new("div").with_attr("class", "aligned").with_children(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{TooltipEntry, TooltipTable};
    use crate::render::{dom, RenderOptions};
    use crate::subtitles::align;
    use crate::text::WordFrequencyTable;

    #[test]
    fn test_render_aligned_paragraph() {
        let tooltips = TooltipTable::default();
        let frequency = WordFrequencyTable::default();
        let options = RenderOptions::default();
        let renderer = Renderer::new(&tooltips, &frequency, &options);

        let subtitles = vec![SubtitleEntry::new(7, 1.5, 3.0, "Hello there.")];
        let alignment = align("Well. Hello there.", &subtitles, 0);
        let paragraph = renderer.render_segments(&alignment, &subtitles);

        assert_eq!(
            dom::to_html(&[paragraph.into()]),
            "<p class=\"aligned\">Well. <span class=\"subtitle-span\" data-subtitle-index=\"0\" \
             data-subtitle-id=\"7\" data-start=\"1.5\" data-end=\"3\">Hello there.</span></p>"
        );
    }

    #[test]
    fn test_mark_text_splits_text_and_wraps_whole_elements() {
        let nodes = dom::parse_fragment("<p>He said <em>hi there</em> twice.</p>");
        let marker = Element::new("span").with_attr("class", "m");
        let marked = mark_text(nodes.clone(), &[TextMark::wrap(3..16, marker)]);

        assert_eq!(
            dom::to_html(&marked),
            "<p>He <span class=\"m\">said <em>hi there</em></span> twice.</p>"
        );
        assert_eq!(dom::text_content(&marked), dom::text_content(&nodes));

        let dropped = mark_text(nodes, &[TextMark::cut(8..usize::MAX)]);
        assert_eq!(dom::to_html(&dropped), "<p>He said </p>");
    }

    #[test]
    fn test_overlay_keeps_tooltips_and_markup() {
        let mut tooltips = TooltipTable::default();
        tooltips.insert("vulpes", TooltipEntry::with_description("Genus of foxes"));
        let frequency = WordFrequencyTable::default();
        let options = RenderOptions::default();
        let renderer = Renderer::new(&tooltips, &frequency, &options);

        let rendered = renderer.render_markdown("The **quick** [[fox|vulpes]] jumps. Then rests.").unwrap();
        let subtitles = vec![SubtitleEntry::new(1, 0.0, 1.0, "The quick fox jumps.")];
        let alignment = align(&dom::text_content(&rendered), &subtitles, 0);
        let html = dom::to_html(&[renderer.overlay_alignment(rendered, &alignment, &subtitles).into()]);

        assert!(html.starts_with("<div class=\"aligned\"><p><span class=\"subtitle-span\" data-subtitle-index=\"0\""));
        assert!(html.contains("<strong>quick</strong>"));
        assert!(html.contains("data-tooltip-id=\"vulpes\""));
        assert!(html.contains("jumps.</span> Then rests.</p>"));
        assert_eq!(html.matches("class=\"subtitle-span\"").count(), 1);
    }

    #[test]
    fn test_overlay_forced_subtitles_replace_tail() {
        let tooltips = TooltipTable::default();
        let frequency = WordFrequencyTable::default();
        let options = RenderOptions::default();
        let renderer = Renderer::new(&tooltips, &frequency, &options);

        let rendered = renderer.render_markdown("Alpha. *Something else*").unwrap();
        let subtitles = vec![
            SubtitleEntry::new(1, 0.0, 1.0, "Alpha."),
            SubtitleEntry::new(2, 1.0, 2.0, "Beta."),
        ];
        let alignment = align(&dom::text_content(&rendered), &subtitles, 0);
        assert_eq!(alignment.forced_from, Some(1));

        let html = dom::to_html(&[renderer.overlay_alignment(rendered, &alignment, &subtitles).into()]);
        assert!(!html.contains("Something else"));
        assert!(html.contains("data-subtitle-index=\"1\" data-subtitle-id=\"2\" data-start=\"1\" data-end=\"2\">Beta.</span></p>"));
    }
}
