use std::cmp::Ordering;
use std::collections::HashMap;

use nb_core::ArticleId;
use rayon::prelude::*;
use tracing::debug;

use crate::vectorizer::DocumentVector;

/// Batches at least this large compute matrix rows on the rayon pool.
const PARALLEL_MIN_BATCH: usize = 64;

/// Cosine of the angle between two sparse vectors, in [0, 1].
///
/// A document compared with an identical vector scores exactly 1.0; an empty
/// vector scores 0.0 against everything. When both weight vectors are zero
/// because every term they hold appears in the whole batch, the cosine is
/// taken over their raw term counts instead, so reworded copies of the same
/// text still match.
pub fn cosine_similarity(a: &DocumentVector, b: &DocumentVector) -> f64 {
    match (a.norm() == 0.0, b.norm() == 0.0) {
        (true, true) => {
            if a.term_counts().is_empty() || b.term_counts().is_empty() {
                return 0.0;
            }
            if a.term_counts() == b.term_counts() {
                return 1.0;
            }
            let counts = |v: &DocumentVector| -> Vec<(String, f64)> {
                v.term_counts().iter().map(|(t, &c)| (t.clone(), c as f64)).collect()
            };
            sparse_cosine(&counts(a), &counts(b))
        }
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            if std::ptr::eq(a, b) || a.weights == b.weights {
                return 1.0;
            }
            let dot = merge_dot(a.weights.iter().map(|(t, &w)| (t, w)), b.weights.iter().map(|(t, &w)| (t, w)));
            (dot / (a.norm() * b.norm())).clamp(0.0, 1.0)
        }
    }
}

/// Cosine of two term-sorted lists of weights.
fn sparse_cosine(a: &[(String, f64)], b: &[(String, f64)]) -> f64 {
    let norm = |v: &[(String, f64)]| v.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    let (na, nb) = (norm(a), norm(b));
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let dot = merge_dot(a.iter().map(|(t, w)| (t, *w)), b.iter().map(|(t, w)| (t, *w)));
    (dot / (na * nb)).clamp(0.0, 1.0)
}

/// Dot product of two term-sorted sequences, as a single merge walk.
fn merge_dot<'a>(
    a: impl Iterator<Item = (&'a String, f64)>,
    b: impl Iterator<Item = (&'a String, f64)>,
) -> f64 {
    let mut dot = 0.0;
    let mut left = a.peekable();
    let mut right = b.peekable();
    while let (Some(&(ka, wa)), Some(&(kb, wb))) = (left.peek(), right.peek()) {
        match ka.cmp(kb) {
            Ordering::Less => {
                left.next();
            }
            Ordering::Greater => {
                right.next();
            }
            Ordering::Equal => {
                dot += wa * wb;
                left.next();
                right.next();
            }
        }
    }
    dot
}

/// Symmetric pairwise similarities for one batch. Only the upper triangle is
/// stored; the diagonal is 1.0 by definition.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    ids: Vec<ArticleId>,
    index: HashMap<ArticleId, usize>,
    upper: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn compute(vectors: &[DocumentVector]) -> Self {
        let n = vectors.len();
        let row = |i: usize| -> Vec<f64> {
            ((i + 1)..n)
                .map(|j| cosine_similarity(&vectors[i], &vectors[j]))
                .collect()
        };

        let rows: Vec<Vec<f64>> = if n >= PARALLEL_MIN_BATCH {
            (0..n).into_par_iter().map(row).collect()
        } else {
            (0..n).map(row).collect()
        };
        let upper: Vec<f64> = rows.into_iter().flatten().collect();
        debug!("Similarity matrix computed - documents={}, pairs={}", n, upper.len());

        let ids: Vec<ArticleId> = vectors.iter().map(|v| v.document_id.clone()).collect();
        let index = ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
        Self { ids, index, upper }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[ArticleId] {
        &self.ids
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Similarity of documents `i` and `j`. Panics when either index is out
    /// of range.
    pub fn score(&self, i: usize, j: usize) -> f64 {
        let n = self.ids.len();
        assert!(i < n && j < n, "similarity index ({}, {}) out of range for {} documents", i, j, n);
        match i.cmp(&j) {
            Ordering::Equal => 1.0,
            Ordering::Less => self.upper[offset(n, i, j)],
            Ordering::Greater => self.upper[offset(n, j, i)],
        }
    }

    pub fn score_by_id(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.score(self.position(a)?, self.position(b)?))
    }

    /// Every pair `(i, j)` with `i < j` whose score is positive and at least
    /// `threshold`.
    pub fn pairs_at_or_above(&self, threshold: f64) -> Vec<(usize, usize, f64)> {
        let n = self.ids.len();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let score = self.upper[offset(n, i, j)];
                if score > 0.0 && score >= threshold {
                    pairs.push((i, j, score));
                }
            }
        }
        pairs
    }
}

/// Position of pair (i, j), i < j, in the row-major upper triangle.
fn offset(n: usize, i: usize, j: usize) -> usize {
    i * n - i * (i + 1) / 2 + (j - i - 1)
}
