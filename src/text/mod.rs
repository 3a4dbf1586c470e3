/// Text analysis: tokenization and corpus word frequencies

pub mod tokenizer;
pub mod frequency;

pub use tokenizer::{tokenize, words, Token, TokenKind, WhitespaceMode};
pub use frequency::{count, WordFrequencyTable, WordSet, DEFAULT_STOP_WORDS};
