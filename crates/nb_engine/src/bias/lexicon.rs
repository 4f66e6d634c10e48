use std::sync::Arc;

use lazy_static::lazy_static;
use nb_core::{Error, Result};
use regex::Regex;

const LEFT_CODED: &[&str] = &[
    "undocumented immigrants",
    "gun violence",
    "gun safety",
    "climate crisis",
    "climate emergency",
    "reproductive rights",
    "reproductive freedom",
    "social justice",
    "systemic racism",
    "income inequality",
    "corporate greed",
    "wealthy elites",
    "tax cuts for the rich",
    "voter suppression",
    "far-right",
    "extremist republicans",
    "marginalized communities",
    "living wage",
    "big oil",
    "white supremacy",
    "book bans",
    "assault weapons",
    "fair share",
    "price gouging",
];

const RIGHT_CODED: &[&str] = &[
    "illegal aliens",
    "illegal immigrants",
    "border crisis",
    "open borders",
    "pro-life",
    "unborn",
    "gun rights",
    "second amendment rights",
    "radical left",
    "far-left",
    "woke",
    "big government",
    "tax relief",
    "job creators",
    "government overreach",
    "law and order",
    "religious liberty",
    "mainstream media",
    "deep state",
    "socialist",
    "election integrity",
    "parental rights",
    "cancel culture",
    "globalist",
];

const SENSATIONAL: &[&str] = &[
    "you won't believe",
    "shocking",
    "stunning",
    "bombshell",
    "outrageous",
    "unbelievable",
    "jaw-dropping",
    "explosive",
    "slams",
    "blasts",
    "destroys",
    "devastating",
    "horrifying",
    "terrifying",
    "insane",
    "epic",
    "chaos",
    "meltdown",
    "mind-blowing",
    "must see",
    "exposed",
    "scandal",
    "furious",
    "catastrophic",
    "nightmare",
    "unprecedented",
];

const OPINION: &[(&str, &str)] = &[
    (
        r"\b(?:clearly|obviously|undeniably|undoubtedly|of course)\b",
        "asserts certainty instead of attributing it",
    ),
    (r"\b(?:should|must|ought to)\b", "prescriptive language"),
    (r"\b(?:i|we) (?:think|believe|feel)\b", "first-person opinion"),
    (
        r"\b(?:disgraceful|shameful|ridiculous|absurd|disastrous|pathetic|reckless|appalling|heroic|brilliant)\b",
        "evaluative adjective",
    ),
    (
        r"\b(?:unfortunately|fortunately|sadly|thankfully|hopefully)\b",
        "editorializing adverb",
    ),
];

const WEAK_ATTRIBUTION: &[(&str, &str)] = &[
    (
        r"\b(?:sources|insiders|officials|critics|experts) (?:say|said|claim|claimed|suggest)\b",
        "unnamed sources",
    ),
    (
        r"\bit is (?:believed|thought|understood|rumou?red|reported|said)\b",
        "passive claim with no one behind it",
    ),
    (
        r"\b(?:some|many) (?:people|observers|critics|analysts) (?:say|believe|think|argue)\b",
        "vague attribution",
    ),
    (
        r"\baccording to (?:sources|reports|people familiar)\b",
        "unspecified source",
    ),
    (r"\b(?:reportedly|allegedly)\b", "hedged claim without a named source"),
    (r"\brumou?rs?\b", "relies on rumor"),
];

const LISTICLE: &str = r"\b\d+\s+(?:\w+\s+)?(?:things|reasons|ways|facts|signs|secrets|tips|times|photos)\b";

lazy_static! {
    static ref ENGLISH: Arc<Lexicon> = Arc::new(
        Lexicon::new(LEFT_CODED, RIGHT_CODED, SENSATIONAL, OPINION, WEAK_ATTRIBUTION)
            .expect("built-in lexicon patterns are valid")
    );
}

/// A compiled phrase family and the note attached to its evidence.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub regex: Regex,
    pub explanation: String,
}

/// Read-only word lists and phrase patterns used by the heuristic scorer.
/// Every pattern matches case-insensitively against text whose curly
/// apostrophes have been straightened.
#[derive(Debug, Clone)]
pub struct Lexicon {
    pub left_coded: Regex,
    pub right_coded: Regex,
    pub sensational: Regex,
    pub listicle: Regex,
    pub opinion: Vec<Pattern>,
    pub weak_attribution: Vec<Pattern>,
}

impl Lexicon {
    /// The built-in English lexicon, compiled once per process.
    pub fn english() -> Arc<Lexicon> {
        Arc::clone(&ENGLISH)
    }

    /// Term lists are matched as literal phrases on word boundaries; the
    /// opinion and attribution entries are `(regex, explanation)` pairs.
    pub fn new(
        left_coded: &[&str],
        right_coded: &[&str],
        sensational: &[&str],
        opinion: &[(&str, &str)],
        weak_attribution: &[(&str, &str)],
    ) -> Result<Self> {
        Ok(Self {
            left_coded: term_alternation(left_coded)?,
            right_coded: term_alternation(right_coded)?,
            sensational: term_alternation(sensational)?,
            listicle: compile(LISTICLE)?,
            opinion: patterns(opinion)?,
            weak_attribution: patterns(weak_attribution)?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i){}", pattern))
        .map_err(|e| Error::Config(format!("invalid lexicon pattern {:?}: {}", pattern, e)))
}

/// An empty list compiles to a pattern that never matches.
fn term_alternation(terms: &[&str]) -> Result<Regex> {
    if terms.is_empty() {
        return compile(r"\b\B");
    }
    let alternation = terms
        .iter()
        .map(|t| regex::escape(&t.to_lowercase()))
        .collect::<Vec<_>>()
        .join("|");
    compile(&format!(r"\b(?:{})\b", alternation))
}

fn patterns(entries: &[(&str, &str)]) -> Result<Vec<Pattern>> {
    entries
        .iter()
        .map(|(pattern, explanation)| {
            Ok(Pattern {
                regex: compile(pattern)?,
                explanation: explanation.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lexicon_compiles_once() {
        let a = Lexicon::english();
        let b = Lexicon::english();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_terms_match_whole_phrases_case_insensitively() {
        let lexicon = Lexicon::english();
        assert!(lexicon.right_coded.is_match("The Radical Left wants more"));
        assert!(lexicon.left_coded.is_match("a climate crisis looms"));
        assert!(!lexicon.right_coded.is_match("awoken early"));
        assert!(lexicon.sensational.is_match("you won't believe this"));
        assert!(lexicon.listicle.is_match("7 Surprising Reasons to Vote"));
    }

    #[test]
    fn test_custom_lexicon_and_bad_patterns() {
        let lexicon = Lexicon::new(&["alpha"], &[], &[], &[], &[]).unwrap();
        assert!(lexicon.left_coded.is_match("ALPHA team"));
        assert!(!lexicon.right_coded.is_match("anything at all"));

        let err = Lexicon::new(&[], &[], &[], &[("(unclosed", "bad")], &[]);
        assert!(matches!(err, Err(Error::Config(_))));
    }
}
