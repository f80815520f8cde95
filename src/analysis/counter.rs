use std::collections::{BTreeMap, HashMap};

use crate::settings::MatchMode;

/// Vocabulary term (original case) → occurrence count. Zero counts are never stored.
pub type FrequencyMap = BTreeMap<String, usize>;

/// Lowercase term → original-case term, plus the lowercase terms in first-seen order.
/// A later duplicate replaces the original-case form of an earlier one.
struct Lookup<'a> {
    original: HashMap<String, &'a str>,
    order: Vec<String>,
}

impl<'a> Lookup<'a> {
    fn new<S: AsRef<str>>(vocabulary: &'a [S]) -> Self {
        let mut original = HashMap::new();
        let mut order = Vec::new();
        for term in vocabulary {
            let term = term.as_ref();
            let lower = term.to_lowercase();
            if lower.trim().is_empty() {
                continue;
            }
            if original.insert(lower.clone(), term).is_none() {
                order.push(lower);
            }
        }
        Lookup { original, order }
    }

    fn restore(&self, counts: HashMap<String, usize>) -> FrequencyMap {
        counts
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .filter_map(|(lower, n)| self.original.get(&lower).map(|o| (o.to_string(), n)))
            .collect()
    }
}

/// Whole-token, case-insensitive matches against the vocabulary.
/// Multi-word terms can never match here.
pub fn count_single<T: AsRef<str>, V: AsRef<str>>(tokens: &[T], vocabulary: &[V]) -> FrequencyMap {
    let lookup = Lookup::new(vocabulary);
    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in tokens {
        let lower = token.as_ref().to_lowercase();
        if lookup.original.contains_key(&lower) {
            *counts.entry(lower).or_insert(0) += 1;
        }
    }
    lookup.restore(counts)
}

/// Substring scan over the space-joined tokens, longest term first.
///
/// Every term is counted independently with non-overlapping occurrences, so
/// "java" also counts inside "javascript" and "cloud" also counts inside
/// "google cloud".
pub fn count_phrases<T: AsRef<str>, V: AsRef<str>>(tokens: &[T], vocabulary: &[V]) -> FrequencyMap {
    let lookup = Lookup::new(vocabulary);
    let mut terms: Vec<&String> = lookup.order.iter().collect();
    terms.sort_by(|a, b| b.len().cmp(&a.len()));

    let text = tokens.iter().map(|t| t.as_ref()).collect::<Vec<_>>().join(" ");

    let mut counts: HashMap<String, usize> = HashMap::new();
    for term in terms {
        let n = text.matches(term.as_str()).count();
        if n > 0 {
            *counts.entry(term.clone()).or_insert(0) += n;
        }
    }
    lookup.restore(counts)
}

/// Phrase matching that respects token boundaries.
///
/// At each position the longest vocabulary phrase (in tokens) that matches is
/// counted and its tokens consumed, so a token contributes to at most one term.
pub fn count_phrases_bounded<T: AsRef<str>, V: AsRef<str>>(
    tokens: &[T],
    vocabulary: &[V],
) -> FrequencyMap {
    let lookup = Lookup::new(vocabulary);
    let mut phrases: Vec<(Vec<&str>, &String)> = lookup
        .order
        .iter()
        .map(|lower| (lower.split_whitespace().collect(), lower))
        .collect();
    phrases.sort_by(|(a, la), (b, lb)| b.len().cmp(&a.len()).then_with(|| lb.len().cmp(&la.len())));

    let lowered: Vec<String> = tokens.iter().map(|t| t.as_ref().to_lowercase()).collect();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut i = 0;
    while i < lowered.len() {
        let hit = phrases.iter().find(|(words, _)| {
            i + words.len() <= lowered.len()
                && words.iter().zip(&lowered[i..]).all(|(w, t)| *w == t.as_str())
        });
        match hit {
            Some((words, lower)) => {
                *counts.entry((*lower).clone()).or_insert(0) += 1;
                i += words.len();
            }
            None => i += 1,
        }
    }
    lookup.restore(counts)
}

pub fn count_vocabulary<T: AsRef<str>, V: AsRef<str>>(
    matching: MatchMode,
    tokens: &[T],
    vocabulary: &[V],
) -> FrequencyMap {
    match matching {
        MatchMode::Single => count_single(tokens, vocabulary),
        MatchMode::Substring => count_phrases(tokens, vocabulary),
        MatchMode::Token => count_phrases_bounded(tokens, vocabulary),
    }
}

/// The `n` most common tokens, highest count first; ties keep first-seen order.
pub fn top_words<T: AsRef<str>>(tokens: &[T], n: usize) -> Vec<(String, usize)> {
    let mut seen: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, token) in tokens.iter().enumerate() {
        let entry = seen.entry(token.as_ref()).or_insert((0, idx));
        entry.0 += 1;
    }
    let mut ranked: Vec<(&str, usize, usize)> = seen
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(n)
        .map(|(word, count, _)| (word.to_string(), count))
        .collect()
}
