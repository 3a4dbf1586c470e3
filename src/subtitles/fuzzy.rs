//! Best-effort subtitle tagging for paragraphs rendered before subtitles were known.
//!
//! Each subtitle is wrapped where its text occurs verbatim (ignoring case).
//! Otherwise a paragraph whose word windows overlap the subtitle strongly
//! enough is wrapped as a whole.

use std::collections::HashSet;
use std::hash::Hash;
use std::ops::Range;
use tracing::{debug, info};

use super::srt::SubtitleEntry;
use crate::render::dom::{Element, Node};
use crate::render::segments::{mark_text, TextMark};
use crate::render::subtitle_marker;
use crate::text::words;

/// Set on a paragraph once it holds a subtitle span
pub const TAGGED_ATTR: &str = "data-subtitle-tagged";

/// Default overlap a window must exceed to count as a match
pub const DEFAULT_THRESHOLD: f64 = 0.8;

const PARAGRAPH_ELEMENTS: &[&str] = &["p", "li", "h1", "h2", "h3", "h4", "h5", "h6", "dd", "dt", "figcaption"];

/// Tagged copy of the container plus match statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOutcome {
    pub nodes: Vec<Node>,
    pub exact: usize,
    pub fuzzy: usize,
    pub missed: usize,
}

/// `|A ∩ B| / max(|A|, |B|)`, 0 when both sets are empty
pub fn overlap_score<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let largest = a.len().max(b.len());
    if largest == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / largest as f64
}

/// Tag with the default threshold
pub fn tag(subtitles: &[SubtitleEntry], container: &[Node]) -> TagOutcome {
    tag_with_threshold(subtitles, container, DEFAULT_THRESHOLD)
}

/// Wrap subtitles into a copy of already-rendered paragraphs.
///
/// A paragraph is tagged at most once; paragraphs carrying
/// [`TAGGED_ATTR`] are skipped, so tagging twice changes nothing.
pub fn tag_with_threshold(subtitles: &[SubtitleEntry], container: &[Node], threshold: f64) -> TagOutcome {
    let mut nodes = container.to_vec();
    let mut paragraphs = Vec::new();
    collect_paragraphs(&mut nodes, &mut paragraphs);

    let (mut exact, mut fuzzy, mut missed) = (0, 0, 0);

    for (index, entry) in subtitles.iter().enumerate() {
        let needle = entry.text.trim();
        let subtitle_words: Vec<String> = words(needle).iter().map(|w| w.to_lowercase()).collect();
        if subtitle_words.is_empty() {
            missed += 1;
            continue;
        }
        let subtitle_set: HashSet<&str> = subtitle_words.iter().map(String::as_str).collect();
        let marker = subtitle_marker(entry, index);

        let mut placed = false;
        for paragraph in paragraphs.iter_mut() {
            if paragraph.has_attr(TAGGED_ATTR) {
                continue;
            }
            let text = paragraph.text_content();

            if let Some(range) = find_ignore_case(&text, needle) {
                let children = std::mem::take(&mut paragraph.children);
                paragraph.children = mark_text(children, &[TextMark::wrap(range, marker.clone())]);
                paragraph.set_attr(TAGGED_ATTR, "true");
                exact += 1;
                placed = true;
                break;
            }

            let paragraph_words: Vec<String> = words(&text).iter().map(|w| w.to_lowercase()).collect();
            let score = best_window_score(&paragraph_words, &subtitle_set, subtitle_words.len());
            if score > threshold {
                debug!("Subtitle {} matched paragraph by overlap {:.2}", entry.id, score);
                let children = std::mem::take(&mut paragraph.children);
                paragraph.children = vec![Node::Element(marker.clone().with_children(children))];
                paragraph.set_attr(TAGGED_ATTR, "true");
                fuzzy += 1;
                placed = true;
                break;
            }
        }

        if !placed {
            missed += 1;
        }
    }

    info!("Subtitle tagging: {} exact, {} fuzzy, {} missed", exact, fuzzy, missed);

    TagOutcome {
        nodes,
        exact,
        fuzzy,
        missed,
    }
}

/// Outermost paragraph-like elements in document order
fn collect_paragraphs<'a>(nodes: &'a mut [Node], out: &mut Vec<&'a mut Element>) {
    for node in nodes.iter_mut() {
        if let Node::Element(element) = node {
            if PARAGRAPH_ELEMENTS.contains(&element.name.as_str()) {
                out.push(element);
            } else {
                collect_paragraphs(&mut element.children, out);
            }
        }
    }
}

/// Highest overlap between the subtitle words and any window of paragraph
/// words the length of the subtitle. Paragraphs shorter than the subtitle
/// score 0.
fn best_window_score(paragraph_words: &[String], subtitle_set: &HashSet<&str>, window: usize) -> f64 {
    if window == 0 || paragraph_words.len() < window {
        return 0.0;
    }

    paragraph_words
        .windows(window)
        .map(|chunk| {
            let chunk_set: HashSet<&str> = chunk.iter().map(String::as_str).collect();
            overlap_score(&chunk_set, subtitle_set)
        })
        .fold(0.0, f64::max)
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Character range of the first case-insensitive occurrence of `needle`
fn find_ignore_case(haystack: &str, needle: &str) -> Option<Range<usize>> {
    let hay: Vec<char> = haystack.chars().map(fold_case).collect();
    let pattern: Vec<char> = needle.chars().map(fold_case).collect();
    if pattern.is_empty() || pattern.len() > hay.len() {
        return None;
    }

    (0..=hay.len() - pattern.len())
        .find(|&start| hay[start..start + pattern.len()] == pattern[..])
        .map(|start| start..start + pattern.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::dom::{parse_fragment, text_content, to_html};

    fn entry(id: u32, text: &str) -> SubtitleEntry {
        SubtitleEntry::new(id, id as f64, id as f64 + 1.0, text)
    }

    #[test]
    fn test_overlap_of_identical_sets_is_one() {
        let a: HashSet<&str> = ["red", "fox"].into_iter().collect();
        assert_eq!(overlap_score(&a, &a.clone()), 1.0);

        let b: HashSet<&str> = ["red", "hen", "sky", "fox", "cat"].into_iter().collect();
        assert_eq!(overlap_score(&a, &b), 0.4);
        assert_eq!(overlap_score::<&str>(&HashSet::new(), &HashSet::new()), 0.0);
    }

    #[test]
    fn test_exact_match_wraps_substring() {
        let nodes = parse_fragment("<p>He said: hello World. Then left.</p>");
        let outcome = tag(&[entry(1, "Hello world.")], &nodes);

        assert_eq!(outcome.exact, 1);
        assert_eq!(
            to_html(&outcome.nodes),
            "<p data-subtitle-tagged=\"true\">He said: <span class=\"subtitle-span\" data-subtitle-index=\"0\" \
             data-subtitle-id=\"1\" data-start=\"1\" data-end=\"2\">hello World.</span> Then left.</p>"
        );
    }

    #[test]
    fn test_exact_match_across_inline_elements() {
        let nodes = parse_fragment("<p>the <em>quick brown</em> fox jumps</p>");
        let outcome = tag(&[entry(1, "quick brown fox")], &nodes);

        assert_eq!(outcome.exact, 1);
        let html = to_html(&outcome.nodes);
        assert!(html.starts_with("<p data-subtitle-tagged=\"true\">the <span class=\"subtitle-span\""));
        assert!(html.contains("\"><em>quick brown</em> fox</span> jumps</p>"));
        assert_eq!(html.matches("class=\"subtitle-span\"").count(), 1);
        assert_eq!(text_content(&outcome.nodes), "the quick brown fox jumps");
    }

    #[test]
    fn test_fuzzy_match_wraps_whole_paragraph() {
        let nodes = parse_fragment("<p>The cat, it sat upon the mat today.</p>");
        let outcome = tag(&[entry(3, "the cat sat upon the mat")], &nodes);

        assert_eq!(outcome.exact, 0);
        assert_eq!(outcome.fuzzy, 1);
        let paragraph = outcome.nodes[0].as_element().unwrap();
        assert_eq!(paragraph.children.len(), 1);
        assert_eq!(paragraph.children[0].as_element().unwrap().attr("data-subtitle-id"), Some("3"));
    }

    #[test]
    fn test_low_overlap_is_missed() {
        let nodes = parse_fragment("<p>Completely unrelated sentence here.</p>");
        let outcome = tag(&[entry(1, "the cat sat")], &nodes);

        assert_eq!(outcome.missed, 1);
        assert_eq!(outcome.nodes, nodes);
    }

    #[test]
    fn test_paragraph_shorter_than_subtitle_never_matches_by_overlap() {
        let nodes = parse_fragment("<p>red fox runs far away</p>");
        let outcome = tag(&[entry(1, "red fox runs far away now")], &nodes);

        assert_eq!(outcome.fuzzy, 0);
        assert_eq!(outcome.missed, 1);
        assert_eq!(outcome.nodes, nodes);

        let words: Vec<String> = ["red", "fox"].iter().map(|w| w.to_string()).collect();
        let subtitle: HashSet<&str> = ["red", "fox", "runs"].into_iter().collect();
        assert_eq!(best_window_score(&words, &subtitle, 3), 0.0);
    }

    #[test]
    fn test_paragraph_tagged_once() {
        let nodes = parse_fragment("<p>First line. Second line.</p><p>Second line.</p>");
        let subtitles = [entry(1, "First line."), entry(2, "Second line.")];
        let outcome = tag(&subtitles, &nodes);

        assert_eq!(outcome.exact, 2);
        // the second subtitle lands in the second paragraph
        let second = outcome.nodes[1].as_element().unwrap();
        assert!(second.has_attr(TAGGED_ATTR));

        let again = tag(&subtitles, &outcome.nodes);
        assert_eq!(again.nodes, outcome.nodes);
        assert_eq!(again.missed, 2);
    }
}
