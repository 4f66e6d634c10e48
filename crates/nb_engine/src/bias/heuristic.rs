//! Lexicon-driven scoring of a single text.

use nb_core::{BiasIndicators, Evidence, Indicator};
use regex::Regex;

use super::lexicon::Lexicon;

/// Weight of one sensational term.
const SENSATIONAL_TERM_WEIGHT: f64 = 0.15;
/// Weight of each title exclamation mark, counted up to three.
const EXCLAMATION_WEIGHT: f64 = 0.15;
const MAX_COUNTED_EXCLAMATIONS: usize = 3;
const LISTICLE_WEIGHT: f64 = 0.2;
const ALL_CAPS_WEIGHT: f64 = 0.3;
/// Titles need this many letters before all-caps counts as shouting.
const ALL_CAPS_MIN_LETTERS: usize = 8;

/// Densities are per hundred words over at least this many words, so short
/// texts are not inflated by a single hit.
const DENSITY_FLOOR_WORDS: usize = 50;
/// Opinion phrases per hundred words that saturate `opinion_mixing`.
const OPINION_SATURATION: f64 = 4.0;
/// Weak attributions per hundred words that drive transparency to zero.
const ATTRIBUTION_SATURATION: f64 = 2.0;

/// Word count at which confidence stops growing.
const CONFIDENT_WORD_COUNT: f64 = 400.0;
const SNIPPET_CONTEXT: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicScore {
    pub indicators: BiasIndicators,
    pub confidence: f64,
    pub evidence: Vec<Evidence>,
    pub word_count: usize,
}

/// Scores `title` and `body` against `lexicon`. `factual_accuracy` is passed
/// through untouched since text alone says nothing about it.
pub fn score(
    lexicon: &Lexicon,
    title: &str,
    body: &str,
    factual_accuracy: f64,
    collect_evidence: bool,
) -> HeuristicScore {
    let title = straighten(title);
    let body = straighten(body);
    let text = if body.is_empty() {
        title.clone()
    } else {
        format!("{}\n{}", title, body)
    };
    let word_count = text.split_whitespace().count();
    let mut evidence = Vec::new();
    let mut note = |text: &str, start: usize, end: usize, indicator: Indicator, explanation: &str| {
        if collect_evidence {
            evidence.push(Evidence {
                text: snippet(text, start, end),
                indicator,
                explanation: explanation.to_string(),
            });
        }
    };

    // Political lean: normalized difference of loaded-term counts, zero
    // when neither side matched.
    let left = collect_matches(&lexicon.left_coded, &text);
    let right = collect_matches(&lexicon.right_coded, &text);
    for &(start, end) in &left {
        note(&text, start, end, Indicator::PoliticalLean, "left-coded framing");
    }
    for &(start, end) in &right {
        note(&text, start, end, Indicator::PoliticalLean, "right-coded framing");
    }
    let loaded = left.len() + right.len();
    let political_lean = if loaded == 0 {
        0.0
    } else {
        (right.len() as f64 - left.len() as f64) / loaded as f64
    };

    let mut sensationalism = 0.0;
    for (start, end) in collect_matches(&lexicon.sensational, &text) {
        sensationalism += SENSATIONAL_TERM_WEIGHT;
        note(&text, start, end, Indicator::Sensationalism, "sensational vocabulary");
    }
    let exclamations = title.matches('!').count();
    if exclamations > 0 {
        sensationalism += EXCLAMATION_WEIGHT * exclamations.min(MAX_COUNTED_EXCLAMATIONS) as f64;
        note(&title, 0, title.len(), Indicator::Sensationalism, "exclamation marks in the title");
    }
    if let Some(m) = lexicon.listicle.find(&title) {
        sensationalism += LISTICLE_WEIGHT;
        note(&title, m.start(), m.end(), Indicator::Sensationalism, "list-style headline");
    }
    if is_all_caps(&title) {
        sensationalism += ALL_CAPS_WEIGHT;
        note(&title, 0, title.len(), Indicator::Sensationalism, "all-caps title");
    }

    let density_words = word_count.max(DENSITY_FLOOR_WORDS) as f64;

    let mut opinion_hits = 0usize;
    for pattern in &lexicon.opinion {
        for (start, end) in collect_matches(&pattern.regex, &text) {
            opinion_hits += 1;
            note(&text, start, end, Indicator::OpinionMixing, &pattern.explanation);
        }
    }
    let opinion_density = opinion_hits as f64 * 100.0 / density_words;

    let mut weak_hits = 0usize;
    for pattern in &lexicon.weak_attribution {
        for (start, end) in collect_matches(&pattern.regex, &text) {
            weak_hits += 1;
            note(&text, start, end, Indicator::Transparency, &pattern.explanation);
        }
    }
    let weak_density = weak_hits as f64 * 100.0 / density_words;

    let indicators = BiasIndicators::new(
        political_lean,
        sensationalism.min(1.0),
        factual_accuracy,
        (opinion_density / OPINION_SATURATION).min(1.0),
        1.0 - (weak_density / ATTRIBUTION_SATURATION).min(1.0),
    );
    let confidence = 0.2 + 0.6 * (word_count as f64 / CONFIDENT_WORD_COUNT).min(1.0);

    HeuristicScore {
        indicators,
        confidence,
        evidence,
        word_count,
    }
}

fn straighten(text: &str) -> String {
    text.trim().replace(['\u{2018}', '\u{2019}'], "'")
}

fn collect_matches(regex: &Regex, text: &str) -> Vec<(usize, usize)> {
    regex.find_iter(text).map(|m| (m.start(), m.end())).collect()
}

fn is_all_caps(title: &str) -> bool {
    let letters = title.chars().filter(|c| c.is_alphabetic()).count();
    letters >= ALL_CAPS_MIN_LETTERS && !title.chars().any(char::is_lowercase)
}

/// The match plus up to `SNIPPET_CONTEXT` characters either side, cut on
/// char boundaries and collapsed to one line.
fn snippet(text: &str, start: usize, end: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(SNIPPET_CONTEXT.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let to = text[end..]
        .char_indices()
        .nth(SNIPPET_CONTEXT)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    text[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}
