use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9'-]").expect("valid pattern"));

/// Built-in English stop words excluded from frequency counts
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
    "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had",
    "has", "have", "he", "her", "him", "his", "how", "i", "if", "in", "into", "is",
    "it", "its", "just", "me", "my", "no", "not", "of", "on", "one", "or", "our",
    "out", "said", "sat", "she", "so", "some", "than", "that", "the", "their", "them",
    "then", "there", "they", "this", "to", "up", "us", "was", "we", "went", "were",
    "what", "when", "which", "who", "will", "with", "would", "you", "your",
];

/// Lowercase word set used for stop and protected word lists
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordSet(HashSet<String>);

impl WordSet {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(words.into_iter().map(|w| w.as_ref().to_lowercase()).collect())
    }

    /// The built-in English stop word list
    pub fn default_stop_words() -> Self {
        Self::new(DEFAULT_STOP_WORDS.iter())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Corpus-wide word counts keyed by lowercase word
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordFrequencyTable {
    counts: HashMap<String, u32>,
    max_freq: u32,
}

impl WordFrequencyTable {
    /// Count every word of every paragraph, skipping stop words that are not protected
    pub fn count<S: AsRef<str>>(paragraphs: &[S], stop_words: &WordSet, protected_words: &WordSet) -> Self {
        let mut counts: HashMap<String, u32> = HashMap::new();

        for paragraph in paragraphs {
            let lowered = paragraph.as_ref().to_lowercase();
            let cleaned = NON_WORD.replace_all(&lowered, " ");
            for word in cleaned.split_whitespace() {
                if stop_words.contains(word) && !protected_words.contains(word) {
                    continue;
                }
                *counts.entry(word.to_string()).or_insert(0) += 1;
            }
        }

        let max_freq = counts.values().copied().max().unwrap_or(1).max(1);
        Self { counts, max_freq }
    }

    /// Occurrence count for a word, 0 when absent
    pub fn get(&self, word: &str) -> u32 {
        self.counts
            .get(word)
            .or_else(|| self.counts.get(&word.to_lowercase()))
            .copied()
            .unwrap_or(0)
    }

    /// Largest count in the table, never below 1
    pub fn max_freq(&self) -> u32 {
        self.max_freq
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &HashMap<String, u32> {
        &self.counts
    }

    /// Most frequent words first, ties broken alphabetically
    pub fn top(&self, n: usize) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> = self.counts.iter().map(|(w, c)| (w.as_str(), *c)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }
}

impl Default for WordFrequencyTable {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
            max_freq: 1,
        }
    }
}

/// Build a frequency table from a paragraph corpus
pub fn count<S: AsRef<str>>(paragraphs: &[S], stop_words: &WordSet, protected_words: &WordSet) -> WordFrequencyTable {
    WordFrequencyTable::count(paragraphs, stop_words, protected_words)
}
