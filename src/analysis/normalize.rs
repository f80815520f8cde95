use std::sync::LazyLock;

use regex::Regex;

use super::stopwords::is_stopword;

static PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Fused words a Treebank-style tokenizer splits in two.
const SPLIT_WORDS: &[(&str, &str, &str)] = &[
    ("cannot", "can", "not"),
    ("gimme", "gim", "me"),
    ("gonna", "gon", "na"),
    ("gotta", "got", "ta"),
    ("lemme", "lem", "me"),
    ("wanna", "wan", "na"),
];

fn split_word(word: &str) -> Option<(&'static str, &'static str)> {
    SPLIT_WORDS
        .iter()
        .find(|(w, _, _)| *w == word)
        .map(|(_, a, b)| (*a, *b))
}

/// Flatten raw text blocks into lowercase content tokens.
///
/// Blocks are joined with a space, lowercased, stripped of punctuation and
/// digit runs, split on whitespace, and filtered against the English
/// stopword list. Fused words like "cannot" and "gonna" are split in two
/// before filtering. Apostrophe contractions and diacritics are left as they
/// are ("don't" becomes "dont", "café" stays "café").
pub fn normalize<S: AsRef<str>>(blocks: &[S]) -> Vec<String> {
    if blocks.is_empty() {
        return Vec::new();
    }
    let joined = blocks
        .iter()
        .map(|b| b.as_ref())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let no_punct = PUNCT_RE.replace_all(&joined, "");
    let no_digits = DIGITS_RE.replace_all(&no_punct, "");

    let mut tokens = Vec::new();
    for word in no_digits.split_whitespace() {
        match split_word(word) {
            Some((a, b)) => tokens.extend([a, b]),
            None => tokens.push(word),
        }
    }
    tokens
        .into_iter()
        .filter(|t| !is_stopword(t))
        .map(str::to_string)
        .collect()
}
