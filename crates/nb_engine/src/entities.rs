//! Proper-noun and keyword extraction.
//!
//! Everything here is pattern-based guessing: capitalized word runs become
//! entity candidates and a handful of suffix/prefix rules assign a kind.
//! Expect false positives. Nothing in clustering depends on these results;
//! they only feed story summaries and keyword matching.

use std::collections::{BTreeMap, HashMap, HashSet};

use lazy_static::lazy_static;
use nb_core::{Article, Entity, EntityKind, ExtractionConfig, VectorizerConfig};

use crate::text::{stopwords, Tokenizer};

lazy_static! {
    /// Capitalized words that start sentences or headlines without naming
    /// anything. Compared lowercase.
    static ref COMMON_CAPITALIZED: HashSet<&'static str> = [
        "the", "this", "that", "these", "those", "a", "an", "and", "but", "or", "nor", "so", "yet",
        "if", "in", "on", "at", "for", "from", "with", "by", "to", "of", "as", "into", "about",
        "it", "its", "he", "she", "they", "we", "i", "you", "his", "her", "their", "our", "my",
        "after", "before", "when", "while", "where", "what", "why", "how", "who", "which", "whose",
        "there", "here", "then", "now", "also", "however", "meanwhile", "still", "some", "many",
        "most", "all", "no", "not", "one", "two", "three", "more", "less", "new", "other",
        "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
        "breaking", "update", "updated", "live", "exclusive", "watch", "opinion", "analysis",
        "today", "yesterday", "tomorrow", "tonight", "said", "says",
    ]
    .into_iter()
    .collect();

    static ref HONORIFICS: HashSet<&'static str> = [
        "mr", "mrs", "ms", "dr", "prof", "sen", "senator", "rep", "representative", "gov",
        "governor", "president", "judge", "justice", "gen", "general", "mayor", "secretary",
        "minister", "chancellor", "king", "queen", "pope", "sir", "dame", "lt", "col", "capt",
    ]
    .into_iter()
    .collect();

    static ref ORGANIZATION_SUFFIXES: HashSet<&'static str> = [
        "inc", "corp", "corporation", "co", "ltd", "llc", "plc", "group", "company", "association",
        "party", "agency", "department", "ministry", "university", "college", "bank", "council",
        "committee", "commission", "foundation", "institute", "court", "union", "administration",
        "authority", "bureau", "office", "service", "organization", "federation", "senate",
        "congress", "parliament", "fund", "board",
    ]
    .into_iter()
    .collect();

    static ref LOCATION_SUFFIXES: HashSet<&'static str> = [
        "city", "county", "state", "province", "river", "island", "islands", "valley", "bay",
        "mountains", "coast", "republic", "kingdom", "district", "region", "strait", "sea", "ocean",
    ]
    .into_iter()
    .collect();

    static ref LOCATION_PREFIXES: HashSet<&'static str> = [
        "lake", "mount", "fort", "port", "north", "south", "east", "west", "new", "san", "los", "st",
    ]
    .into_iter()
    .collect();

    static ref KNOWN_LOCATIONS: HashSet<&'static str> = [
        "u.s.", "us", "usa", "uk", "u.k.", "america", "united states", "united kingdom", "china",
        "russia", "ukraine", "israel", "gaza", "iran", "iraq", "syria", "india", "pakistan",
        "japan", "germany", "france", "italy", "spain", "canada", "mexico", "brazil", "europe",
        "africa", "asia", "taiwan", "korea", "washington", "london", "paris", "berlin", "beijing",
        "moscow", "kyiv", "jerusalem", "brussels", "tokyo", "new york", "california", "texas",
        "florida", "chicago", "ohio", "georgia", "arizona", "michigan", "pennsylvania",
    ]
    .into_iter()
    .collect();
}

/// Lines with at least this many capitalized-start words, mostly
/// capitalized, are treated as title case and skipped.
const TITLE_CASE_MIN_WORDS: usize = 4;
const TITLE_CASE_RATIO: f64 = 0.7;

#[derive(Debug)]
pub struct EntityExtractor {
    config: ExtractionConfig,
    tokenizer: Tokenizer,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default(), &VectorizerConfig::default())
    }
}

impl EntityExtractor {
    /// Keywords use the vectorizer's token length but are never stemmed, so
    /// they read as real words.
    pub fn new(config: ExtractionConfig, vectorizer: &VectorizerConfig) -> Self {
        Self {
            config,
            tokenizer: Tokenizer::with_stopwords(vectorizer.min_token_length, false, stopwords::english()),
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Top entities of `text` by occurrence count, then name.
    pub fn extract_entities(&self, text: &str) -> Vec<Entity> {
        let mut found: HashMap<String, (Entity, usize)> = HashMap::new();
        let mut order = 0usize;
        for line in text.lines() {
            if is_title_case(line) {
                continue;
            }
            for candidate in candidates(line) {
                let key = candidate.name.to_lowercase();
                match found.get_mut(&key) {
                    Some((entity, _)) => {
                        entity.count += 1;
                        if entity.kind == EntityKind::Other {
                            entity.kind = candidate.kind;
                        }
                    }
                    None => {
                        found.insert(
                            key,
                            (
                                Entity {
                                    name: candidate.name,
                                    kind: candidate.kind,
                                    count: 1,
                                },
                                order,
                            ),
                        );
                        order += 1;
                    }
                }
            }
        }

        let mut entities: Vec<(Entity, usize)> = found.into_values().collect();
        entities.sort_by(|(a, ai), (b, bi)| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.name.cmp(&b.name))
                .then(ai.cmp(bi))
        });
        entities
            .into_iter()
            .map(|(entity, _)| entity)
            .take(self.config.max_entities)
            .collect()
    }

    /// Extracts once and caches the result on the article.
    pub fn entities_for<'a>(&self, article: &'a mut Article) -> &'a [Entity] {
        if article.entities.is_none() {
            article.entities = Some(self.extract_entities(&article.text()));
        }
        article.entities.as_deref().unwrap_or_default()
    }

    /// Entities shared across a story: ranked by how many members mention
    /// them, then by total mentions. `count` on the result is the total.
    pub fn common_entities(&self, per_article: &[&[Entity]]) -> Vec<Entity> {
        let mut merged: BTreeMap<String, (Entity, usize)> = BTreeMap::new();
        for entities in per_article {
            for entity in entities.iter() {
                let slot = merged
                    .entry(entity.name.to_lowercase())
                    .or_insert_with(|| (Entity { count: 0, ..entity.clone() }, 0));
                slot.0.count += entity.count;
                slot.1 += 1;
                if slot.0.kind == EntityKind::Other {
                    slot.0.kind = entity.kind;
                }
            }
        }

        let mut ranked: Vec<(Entity, usize)> = merged.into_values().collect();
        ranked.sort_by(|(a, a_docs), (b, b_docs)| {
            b_docs
                .cmp(a_docs)
                .then_with(|| b.count.cmp(&a.count))
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked
            .into_iter()
            .map(|(entity, _)| entity)
            .take(self.config.max_entities)
            .collect()
    }

    /// Token counts after stop-word removal, highest first, ties by term.
    pub fn keyword_counts(&self, text: &str) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for token in self.tokenizer.tokenize(text) {
            *counts.entry(token).or_insert(0) += 1;
        }
        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.config.max_keywords);
        ranked
    }

    pub fn keywords(&self, text: &str) -> Vec<String> {
        self.keyword_counts(text).into_iter().map(|(term, _)| term).collect()
    }
}

struct Candidate {
    name: String,
    kind: EntityKind,
}

/// One whitespace-separated word with its surrounding punctuation split off.
struct Word {
    core: String,
    ends_run: bool,
    ends_sentence: bool,
}

fn split_word(raw: &str) -> Option<Word> {
    let start = raw.find(|c: char| c.is_alphanumeric())?;
    let end = raw
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| i + c.len_utf8())?;
    let mut core = raw[start..end].to_string();
    let trailing = &raw[end..];

    let mut possessive = false;
    for suffix in ["'s", "\u{2019}s"] {
        if core.len() > suffix.len() && core.ends_with(suffix) {
            core.truncate(core.len() - suffix.len());
            possessive = true;
        }
    }

    let dotted = core.contains('.') && trailing.starts_with('.');
    if dotted {
        core.push('.');
    }
    let honorific = HONORIFICS.contains(core.trim_end_matches('.').to_lowercase().as_str());
    let ends_sentence = !dotted && !honorific && trailing.contains(['.', '!', '?']);
    let ends_run = possessive || ends_sentence || trailing.contains([',', ';', ':', ')', '"', '\u{201d}']);

    Some(Word {
        core,
        ends_run,
        ends_sentence,
    })
}

fn is_capitalized(word: &str) -> bool {
    let Some(first) = word.chars().next() else {
        return false;
    };
    if !first.is_uppercase() || COMMON_CAPITALIZED.contains(word.to_lowercase().as_str()) {
        return false;
    }
    word.chars().any(char::is_lowercase) || word.chars().filter(|c| c.is_alphabetic()).count() <= 5
}

fn is_title_case(line: &str) -> bool {
    let words: Vec<&str> = line
        .split_whitespace()
        .filter(|w| w.chars().next().map_or(false, char::is_alphabetic))
        .collect();
    if words.len() < TITLE_CASE_MIN_WORDS {
        return false;
    }
    let capitalized = words
        .iter()
        .filter(|w| w.chars().next().map_or(false, char::is_uppercase))
        .count();
    capitalized as f64 / words.len() as f64 >= TITLE_CASE_RATIO
}

/// Capitalized runs in one line. A run made of a single sentence-initial word
/// is dropped: capitalization there says nothing.
fn candidates(line: &str) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut run: Vec<String> = Vec::new();
    let mut run_at_sentence_start = false;
    let mut sentence_start = true;

    for raw in line.split_whitespace() {
        let Some(word) = split_word(raw) else {
            flush(&mut run, run_at_sentence_start, &mut out);
            continue;
        };
        if is_capitalized(&word.core) {
            if run.is_empty() {
                run_at_sentence_start = sentence_start;
            }
            run.push(word.core);
        } else {
            flush(&mut run, run_at_sentence_start, &mut out);
        }
        if word.ends_run {
            flush(&mut run, run_at_sentence_start, &mut out);
        }
        sentence_start = word.ends_sentence;
    }
    flush(&mut run, run_at_sentence_start, &mut out);
    out
}

fn flush(run: &mut Vec<String>, at_sentence_start: bool, out: &mut Vec<Candidate>) {
    if run.is_empty() || (run.len() == 1 && at_sentence_start) {
        run.clear();
        return;
    }

    let mut honorific = false;
    let mut words: &[String] = run;
    while words.len() > 1 && HONORIFICS.contains(words[0].trim_end_matches('.').to_lowercase().as_str()) {
        honorific = true;
        words = &words[1..];
    }
    if !(words.len() == 1 && HONORIFICS.contains(words[0].trim_end_matches('.').to_lowercase().as_str())) {
        out.push(Candidate {
            name: words.join(" "),
            kind: classify(words, honorific),
        });
    }
    run.clear();
}

fn classify(words: &[String], honorific: bool) -> EntityKind {
    if honorific {
        return EntityKind::Person;
    }
    let lower = |w: &String| w.trim_end_matches('.').to_lowercase();
    let first = words.first().map(lower).unwrap_or_default();
    let last = words.last().map(lower).unwrap_or_default();
    let full = words.join(" ").to_lowercase();

    if KNOWN_LOCATIONS.contains(full.as_str()) {
        return EntityKind::Location;
    }
    if ORGANIZATION_SUFFIXES.contains(last.as_str()) {
        return EntityKind::Organization;
    }
    if LOCATION_SUFFIXES.contains(last.as_str()) || (words.len() > 1 && LOCATION_PREFIXES.contains(first.as_str())) {
        return EntityKind::Location;
    }
    if words.len() == 1 && !words[0].chars().any(char::is_lowercase) {
        return EntityKind::Organization;
    }
    let name_like = |w: &String| {
        let mut chars = w.chars();
        chars.next().map_or(false, char::is_uppercase)
            && chars.all(|c| c.is_lowercase() || c == '-' || c == '\'')
    };
    if words.len() == 2 && words.iter().all(name_like) {
        return EntityKind::Person;
    }
    EntityKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(|e| e.name.as_str()).collect()
    }

    fn find<'a>(entities: &'a [Entity], name: &str) -> &'a Entity {
        entities
            .iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("{} not in {:?}", name, names(entities)))
    }

    #[test]
    fn test_extracts_and_classifies_runs() {
        let extractor = EntityExtractor::default();
        let entities = extractor.extract_entities(
            "Lawmakers met with Sen. Elizabeth Warren in Washington on Tuesday. \
             Officials from Acme Corp and the FBI attended, along with Maria Lopez. \
             Later, Maria Lopez's office confirmed the meeting in Orange County.",
        );

        assert_eq!(find(&entities, "Elizabeth Warren").kind, EntityKind::Person);
        assert_eq!(find(&entities, "Washington").kind, EntityKind::Location);
        assert_eq!(find(&entities, "Acme Corp").kind, EntityKind::Organization);
        assert_eq!(find(&entities, "FBI").kind, EntityKind::Organization);
        assert_eq!(find(&entities, "Orange County").kind, EntityKind::Location);

        let lopez = find(&entities, "Maria Lopez");
        assert_eq!(lopez.kind, EntityKind::Person);
        assert_eq!(lopez.count, 2);
        assert_eq!(entities[0].name, "Maria Lopez");

        // Sentence-initial single words and common words are not entities.
        assert!(!names(&entities).contains(&"Lawmakers"));
        assert!(!names(&entities).contains(&"Officials"));
        assert!(!names(&entities).contains(&"Tuesday"));
        assert!(!names(&entities).contains(&"Later"));
    }

    #[test]
    fn test_deduplicates_case_insensitively() {
        let extractor = EntityExtractor::default();
        let entities = extractor.extract_entities("Talks with NATO continued. Members of Nato met again.");
        let nato: Vec<&Entity> = entities.iter().filter(|e| e.name.eq_ignore_ascii_case("nato")).collect();
        assert_eq!(nato.len(), 1);
        assert_eq!(nato[0].count, 2);
        assert_eq!(nato[0].name, "NATO");
    }

    #[test]
    fn test_title_case_lines_are_skipped() {
        let extractor = EntityExtractor::default();
        assert!(extractor.extract_entities("Senate Passes Budget Bill After Long Night").is_empty());
        assert!(extractor.extract_entities("").is_empty());
    }

    #[test]
    fn test_limit_applies() {
        let extractor = EntityExtractor::new(
            ExtractionConfig {
                max_keywords: 2,
                max_entities: 1,
            },
            &VectorizerConfig::default(),
        );
        let entities = extractor.extract_entities("Visits by Anna Berg and Tom Field, then Anna Berg again.");
        assert_eq!(names(&entities), vec!["Anna Berg"]);
        assert_eq!(extractor.keywords("budget budget senate vote vote vote"), vec!["vote", "budget"]);
    }

    #[test]
    fn test_entities_are_cached_on_the_article() {
        let extractor = EntityExtractor::default();
        let mut article = Article {
            id: "a1".to_string(),
            url: "https://example.com/a1".to_string(),
            title: "Budget vote".to_string(),
            description: "The plan was backed by Anna Berg of Acme Corp.".to_string(),
            content: None,
            published_at: chrono::Utc::now(),
            source_id: "s".to_string(),
            entities: None,
            story_id: None,
        };
        let first = extractor.entities_for(&mut article).to_vec();
        assert!(!first.is_empty());
        article.description.clear();
        assert_eq!(extractor.entities_for(&mut article), first.as_slice());
    }

    #[test]
    fn test_common_entities_prefer_wider_mentions() {
        let extractor = EntityExtractor::default();
        let entity = |name: &str, count| Entity {
            name: name.to_string(),
            kind: EntityKind::Other,
            count,
        };
        let a = vec![entity("Acme Corp", 5), entity("Anna Berg", 1)];
        let b = vec![entity("anna berg", 1)];
        let common = extractor.common_entities(&[a.as_slice(), b.as_slice()]);
        assert_eq!(common[0].name, "Anna Berg");
        assert_eq!(common[0].count, 2);
        assert_eq!(common[1].name, "Acme Corp");
    }

    #[test]
    fn test_keywords_are_unstemmed_and_stopword_free() {
        let extractor = EntityExtractor::default();
        let keywords = extractor.keyword_counts("The running senators were running for the senate");
        assert_eq!(keywords[0], ("running".to_string(), 2));
        assert!(keywords.iter().all(|(k, _)| k != "the" && k != "were"));
    }
}
