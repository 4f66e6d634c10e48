//! TF-IDF weighting over a single clustering batch.
//!
//! The model is rebuilt for every batch: document frequencies come from the
//! batch itself, never from a persistent corpus.

use std::collections::{BTreeMap, HashMap, HashSet};

use nb_core::ArticleId;
use serde::Serialize;

use crate::text::Tokenizer;

/// Sparse term weights for one document. Terms with zero weight are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentVector {
    pub document_id: ArticleId,
    pub weights: BTreeMap<String, f64>,
    #[serde(skip)]
    norm: f64,
    /// Raw term counts before idf weighting.
    #[serde(skip)]
    term_counts: BTreeMap<String, usize>,
}

impl DocumentVector {
    pub fn new(document_id: ArticleId, weights: BTreeMap<String, f64>) -> Self {
        Self::with_term_counts(document_id, weights, BTreeMap::new())
    }

    pub fn with_term_counts(
        document_id: ArticleId,
        weights: BTreeMap<String, f64>,
        term_counts: BTreeMap<String, usize>,
    ) -> Self {
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        Self {
            document_id,
            weights,
            norm,
            term_counts,
        }
    }

    /// L2 norm of the weights.
    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn term_counts(&self) -> &BTreeMap<String, usize> {
        &self.term_counts
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[derive(Debug)]
pub struct Vectorizer<'t> {
    tokenizer: &'t Tokenizer,
}

impl<'t> Vectorizer<'t> {
    pub fn new(tokenizer: &'t Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Weight of term t in document d is `tf(t, d) * ln(N / df(t))`.
    ///
    /// A batch of one document has no contrast to draw on, so idf is fixed
    /// at 1 and each weight is the raw term frequency.
    pub fn vectorize(&self, documents: &[(ArticleId, String)]) -> Vec<DocumentVector> {
        let n = documents.len();
        let term_counts: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|(_, text)| {
                let mut counts = HashMap::new();
                for token in self.tokenizer.tokenize(text) {
                    *counts.entry(token).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for counts in &term_counts {
            let unique: HashSet<&str> = counts.keys().map(String::as_str).collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        documents
            .iter()
            .zip(&term_counts)
            .map(|((id, _), counts)| {
                let weights = counts
                    .iter()
                    .filter_map(|(term, &tf)| {
                        let df = document_frequency.get(term.as_str()).copied().unwrap_or(1).max(1);
                        let weight = tf as f64 * idf(n, df);
                        (weight > 0.0).then(|| (term.clone(), weight))
                    })
                    .collect();
                let term_counts = counts.iter().map(|(t, &c)| (t.clone(), c)).collect();
                DocumentVector::with_term_counts(id.clone(), weights, term_counts)
            })
            .collect()
    }
}

fn idf(n: usize, df: usize) -> f64 {
    if n <= 1 {
        return 1.0;
    }
    (n as f64 / df as f64).ln()
}
