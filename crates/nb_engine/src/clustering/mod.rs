use std::cmp::Ordering;
use std::collections::BTreeSet;

use nb_core::{Article, ArticleId, ClusterConfig};
use serde::Serialize;
use tracing::debug;

use crate::similarity::SimilarityMatrix;

pub mod union_find;

pub use union_find::DisjointSet;

/// A connected group of similar articles, before it becomes a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    /// Positions of the members in the batch, ascending.
    #[serde(skip)]
    pub members: Vec<usize>,
    pub article_ids: Vec<ArticleId>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Clustering {
    pub clusters: Vec<Cluster>,
    /// Articles whose group was below the minimum size.
    pub unclustered: Vec<ArticleId>,
}

#[derive(Debug, Clone)]
pub struct ClusterBuilder {
    config: ClusterConfig,
}

impl ClusterBuilder {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Unions every qualifying pair and splits the resulting sets by size.
    ///
    /// `articles[i]` must be the document at position `i` of `matrix`.
    /// Pairs are visited strongest first, ties broken by position, so the
    /// partition is reproducible even when the diversity rule turns a union
    /// down.
    pub fn build(&self, articles: &[Article], matrix: &SimilarityMatrix) -> Clustering {
        assert_eq!(
            articles.len(),
            matrix.len(),
            "similarity matrix does not cover the article batch"
        );
        if articles.is_empty() {
            return Clustering::default();
        }

        let mut pairs = matrix.pairs_at_or_above(self.config.similarity_threshold);
        pairs.retain(|&(i, j, _)| self.within_time_window(&articles[i], &articles[j]));
        pairs.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| (a.0, a.1).cmp(&(b.0, b.1)))
        });

        let mut sets = DisjointSet::new(articles.len());
        let mut sources: Vec<BTreeSet<&str>> = articles
            .iter()
            .map(|a| BTreeSet::from([a.source_id.as_str()]))
            .collect();
        let mut rejected = 0usize;

        for (i, j, score) in pairs {
            let (ri, rj) = (sets.find(i), sets.find(j));
            if ri == rj {
                continue;
            }
            if self.config.enforce_source_diversity && !sources[ri].is_disjoint(&sources[rj]) {
                rejected += 1;
                debug!(
                    "Skipping union of {} and {} (score {:.3}): shared source",
                    articles[i].id, articles[j].id, score
                );
                continue;
            }
            if let Some(root) = sets.union(ri, rj) {
                let absorbed = if root == ri { rj } else { ri };
                let moved = std::mem::take(&mut sources[absorbed]);
                sources[root].extend(moved);
            }
        }

        let mut clustering = Clustering::default();
        for group in sets.groups() {
            if group.len() >= self.config.min_cluster_size {
                clustering.clusters.push(Cluster {
                    article_ids: group.iter().map(|&i| articles[i].id.clone()).collect(),
                    members: group,
                });
            } else {
                clustering
                    .unclustered
                    .extend(group.iter().map(|&i| articles[i].id.clone()));
            }
        }

        debug!(
            "Clustering finished - articles={}, clusters={}, unclustered={}, diversity_rejections={}",
            articles.len(),
            clustering.clusters.len(),
            clustering.unclustered.len(),
            rejected
        );
        clustering
    }

    fn within_time_window(&self, a: &Article, b: &Article) -> bool {
        match self.config.max_time_gap_hours {
            Some(hours) => (a.published_at - b.published_at).abs() <= chrono::Duration::hours(hours),
            None => true,
        }
    }
}
