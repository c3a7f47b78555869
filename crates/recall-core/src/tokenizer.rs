use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{MAX_TOKEN_LEN, MIN_TOKEN_LEN};

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+\s+").unwrap());
static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n[ \t]*\r?\n\s*").unwrap());

/// Query keywords shorter than this are ignored by keyword scoring.
const MIN_KEYWORD_LEN: usize = 4;

/// Tokenize text into lowercase scoring tokens.
/// Non-word characters become separators; tokens outside
/// `MIN_TOKEN_LEN..=MAX_TOKEN_LEN` characters are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_WORD
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|t| is_scoring_token(t))
        .map(str::to_string)
        .collect()
}

pub fn is_scoring_token(token: &str) -> bool {
    let len = token.chars().count();
    (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&len)
}

/// Lowercase keywords longer than three characters, deduplicated, in query order.
pub fn query_keywords(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let mut seen = HashSet::new();
    NON_WORD
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_KEYWORD_LEN)
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}

/// Split text into sentences at runs of `.`, `!` or `?` followed by whitespace.
/// The terminating punctuation stays with its sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last = 0;

    for m in SENTENCE_END.find_iter(text) {
        let sentence = text[last..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        last = m.end();
    }

    let remainder = text[last..].trim();
    if !remainder.is_empty() {
        sentences.push(remainder);
    }

    sentences
}

/// Split text into paragraphs on blank lines. Empty paragraphs are dropped.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    BLANK_LINE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
