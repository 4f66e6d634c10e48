//! Story clustering and coverage-balance engine.
//!
//! A batch of articles goes through the tokenizer and a per-batch TF-IDF
//! model, a cosine similarity matrix and a union-find pass. Each resulting
//! cluster is then described by its coverage balance, shared entities and
//! keywords. The bias scorer also works on its own, one text at a time.

pub mod bias;
pub mod clustering;
pub mod coverage;
pub mod entities;
pub mod pipeline;
pub mod similarity;
pub mod text;
pub mod vectorizer;

pub use bias::{BiasScorer, Lexicon, ScoreOptions, ScoreRequest};
pub use clustering::{Cluster, ClusterBuilder, Clustering, DisjointSet};
pub use coverage::CoverageAnalyzer;
pub use entities::EntityExtractor;
pub use pipeline::{BatchOutcome, BatchStats, StoryEngine};
pub use similarity::{cosine_similarity, SimilarityMatrix};
pub use text::Tokenizer;
pub use vectorizer::{DocumentVector, Vectorizer};

pub mod prelude {
    pub use super::{BatchOutcome, BiasScorer, ScoreOptions, ScoreRequest, StoryEngine};
    pub use nb_core::prelude::*;
}
