use std::collections::HashSet;
use std::fmt;

use nb_core::VectorizerConfig;
use rust_stemmers::{Algorithm, Stemmer};

use super::stopwords;

/// Lowercases, strips punctuation, drops short, numeric and stop-word tokens
/// and optionally stems what is left. Pure: the same input always yields the
/// same tokens.
pub struct Tokenizer {
    min_token_length: usize,
    stemmer: Option<Stemmer>,
    stopwords: &'static HashSet<&'static str>,
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("min_token_length", &self.min_token_length)
            .field("stemming", &self.stemmer.is_some())
            .field("stopwords", &self.stopwords.len())
            .finish()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&VectorizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(config: &VectorizerConfig) -> Self {
        Self::with_stopwords(config.min_token_length, config.stemming, stopwords::english())
    }

    pub fn with_stopwords(
        min_token_length: usize,
        stemming: bool,
        stopwords: &'static HashSet<&'static str>,
    ) -> Self {
        Self {
            min_token_length,
            stemmer: stemming.then(|| Stemmer::create(Algorithm::English)),
            stopwords,
        }
    }

    /// Same settings, no stemming. Used where tokens are shown to people.
    pub fn unstemmed(&self) -> Self {
        Self {
            min_token_length: self.min_token_length,
            stemmer: None,
            stopwords: self.stopwords,
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        normalize(text)
            .split_whitespace()
            .filter(|token| token.chars().count() >= self.min_token_length)
            .filter(|token| !token.chars().all(|c| c.is_numeric()))
            .filter(|token| !self.is_stopword(token))
            .map(|token| match &self.stemmer {
                Some(stemmer) => stemmer.stem(token).into_owned(),
                None => token.to_string(),
            })
            .collect()
    }
}

/// Lowercase, drop apostrophes so contractions stay one word, and turn every
/// other non-word character into a space.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Tokenizer {
        Tokenizer::new(&VectorizerConfig {
            min_token_length: 3,
            stemming: false,
        })
    }

    #[test]
    fn test_tokenize_filters_noise() {
        let tokens = plain().tokenize("The Senate, in 2024, passed a $1.2T budget -- at last!");
        assert_eq!(tokens, vec!["senate", "passed", "budget", "last"]);
    }

    #[test]
    fn test_contractions_stay_whole() {
        let tokens = plain().tokenize("YOU WON’T BELIEVE it");
        assert_eq!(tokens, vec!["wont", "believe"]);
    }

    #[test]
    fn test_stemming_merges_variants() {
        let tokenizer = Tokenizer::default();
        assert_eq!(tokenizer.tokenize("running"), vec!["run"]);
        assert_eq!(tokenizer.tokenize("passes"), tokenizer.tokenize("passed"));
        assert_eq!(tokenizer.unstemmed().tokenize("running"), vec!["running"]);
    }

    #[test]
    fn test_empty_and_stopword_only_input() {
        let tokenizer = Tokenizer::default();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("the and with from that").is_empty());
        assert!(tokenizer.tokenize("12 345 6789").is_empty());
    }
}
