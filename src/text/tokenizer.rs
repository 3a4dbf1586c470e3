use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Scripts written without spaces between words. Each character is its own token.
const IDEOGRAPHIC: &str = r"\p{Han}\p{Hiragana}\p{Katakana}\p{Bopomofo}";

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let word_char = format!(r"[[\p{{L}}\p{{N}}\p{{M}}]--[{IDEOGRAPHIC}]]");
    let pattern = format!(
        r"(?P<ideograph>[{IDEOGRAPHIC}])|(?P<word>{word_char}+(?:['’]{word_char}+)*)|(?P<space>\s+)|(?P<punct>(?s:.))"
    );
    Regex::new(&pattern).expect("token pattern is valid")
});

/// Lexical class of a token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Run of letters, digits and marks, apostrophes allowed inside
    Word,
    /// Single character from a script without word separators
    Ideograph,
    /// Any single non-space character that is not part of a word
    Punctuation,
    /// Run of whitespace
    Whitespace,
}

/// One lexical unit with its position in the source text.
///
/// `index_in_text` and `length` count characters, `byte_range` addresses
/// the same slice in bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub word: String,
    pub index_in_text: usize,
    pub length: usize,
    pub kind: TokenKind,
    pub byte_range: Range<usize>,
}

impl Token {
    /// True for tokens that carry vocabulary (words and ideographs)
    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Word | TokenKind::Ideograph)
    }
}

/// Whether whitespace runs are returned as tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitespaceMode {
    Skip,
    Emit,
}

/// Split text into word, ideograph, punctuation and (optionally) whitespace tokens
pub fn tokenize(text: &str, mode: WhitespaceMode) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut char_pos = 0;

    for caps in TOKEN_PATTERN.captures_iter(text) {
        let (m, kind) = if let Some(m) = caps.name("ideograph") {
            (m, TokenKind::Ideograph)
        } else if let Some(m) = caps.name("word") {
            (m, TokenKind::Word)
        } else if let Some(m) = caps.name("space") {
            (m, TokenKind::Whitespace)
        } else if let Some(m) = caps.name("punct") {
            (m, TokenKind::Punctuation)
        } else {
            continue;
        };

        let length = m.as_str().chars().count();
        if kind != TokenKind::Whitespace || mode == WhitespaceMode::Emit {
            tokens.push(Token {
                word: m.as_str().to_string(),
                index_in_text: char_pos,
                length,
                kind,
                byte_range: m.range(),
            });
        }
        char_pos += length;
    }

    tokens
}

/// Word and ideograph tokens only, in original case
pub fn words(text: &str) -> Vec<String> {
    tokenize(text, WhitespaceMode::Skip)
        .into_iter()
        .filter(Token::is_word)
        .map(|token| token.word)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_slice(text: &str, token: &Token) -> String {
        text.chars()
            .skip(token.index_in_text)
            .take(token.length)
            .collect()
    }

    #[test]
    fn test_contraction_is_one_token() {
        let tokens = tokenize("I don't know.", WhitespaceMode::Skip);
        let words: Vec<&str> = tokens.iter().map(|t| t.word.as_str()).collect();
        assert_eq!(words, vec!["I", "don't", "know", "."]);
        assert_eq!(tokens[1].kind, TokenKind::Word);
        assert_eq!(tokens[3].kind, TokenKind::Punctuation);
    }

    #[test]
    fn test_ideographs_are_single_characters() {
        let tokens = tokenize("我喜欢cats", WhitespaceMode::Skip);
        let words: Vec<&str> = tokens.iter().map(|t| t.word.as_str()).collect();
        assert_eq!(words, vec!["我", "喜", "欢", "cats"]);
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Ideograph));
        assert_eq!(tokens[3].index_in_text, 3);
    }

    #[test]
    fn test_punctuation_split_per_character() {
        let tokens = tokenize("wait...!", WhitespaceMode::Skip);
        assert_eq!(tokens.len(), 5);
        assert!(tokens[1..].iter().all(|t| t.word.chars().count() == 1));
    }

    #[test]
    fn test_trailing_apostrophe_not_absorbed() {
        let words = words("the dogs' bowls");
        assert_eq!(words, vec!["the", "dogs", "bowls"]);
    }

    #[test]
    fn test_unicode_letters_are_words() {
        let words = words("Señor Müller café");
        assert_eq!(words, vec!["Señor", "Müller", "café"]);
    }

    #[test]
    fn test_emit_mode_reconstructs_text() {
        let text = "  Héllo, wörld!\n我们 don't\tstop ";
        let tokens = tokenize(text, WhitespaceMode::Emit);
        let rebuilt: String = tokens.iter().map(|t| char_slice(text, t)).collect();
        assert_eq!(rebuilt, text);
        let by_bytes: String = tokens.iter().map(|t| &text[t.byte_range.clone()]).collect();
        assert_eq!(by_bytes, text);
    }

    #[test]
    fn test_skip_mode_offsets_interleave_with_whitespace() {
        let text = "one  two\u{3000}三.";
        let tokens = tokenize(text, WhitespaceMode::Skip);
        let chars: Vec<char> = text.chars().collect();

        let mut rebuilt = String::new();
        let mut cursor = 0;
        for token in &tokens {
            rebuilt.extend(&chars[cursor..token.index_in_text]);
            assert!(chars[cursor..token.index_in_text].iter().all(|c| c.is_whitespace()));
            rebuilt.push_str(&char_slice(text, token));
            cursor = token.index_in_text + token.length;
        }
        rebuilt.extend(&chars[cursor..]);
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("", WhitespaceMode::Emit).is_empty());
    }
}
