use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use nb_core::{
    Article, ArticleId, ArticleRecord, BiasIndicators, EngineConfig, SkipReason, SkippedArticle, SourceId,
    SourceLookup, Story, StoryId,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bias::BiasScorer;
use crate::clustering::{Cluster, ClusterBuilder};
use crate::coverage::CoverageAnalyzer;
use crate::entities::EntityExtractor;
use crate::similarity::SimilarityMatrix;
use crate::text::Tokenizer;
use crate::vectorizer::Vectorizer;

/// Batches at least this large assemble their stories on the rayon pool.
const PARALLEL_MIN_ARTICLES: usize = 64;
/// Keywords quoted in a story summary.
const SUMMARY_KEYWORDS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub received: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub stories: usize,
    pub clustered: usize,
    pub unclustered: usize,
}

/// Everything one clustering run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub stories: Vec<Story>,
    /// Validated articles, sorted by id, with `story_id` set on clustered ones.
    pub articles: Vec<Article>,
    /// Ids that did not reach the minimum cluster size, for a later batch.
    pub unclustered: Vec<ArticleId>,
    pub skipped: Vec<SkippedArticle>,
    pub stats: BatchStats,
}

impl BatchOutcome {
    /// Story id to member ids.
    pub fn assignments(&self) -> BTreeMap<StoryId, BTreeSet<ArticleId>> {
        self.stories
            .iter()
            .map(|story| (story.id.clone(), story.article_ids.iter().cloned().collect()))
            .collect()
    }

    /// Member sets only, in story order. Stable across runs even though
    /// story ids are random.
    pub fn partition(&self) -> Vec<BTreeSet<ArticleId>> {
        self.stories
            .iter()
            .map(|story| story.article_ids.iter().cloned().collect())
            .collect()
    }
}

/// Runs the whole batch: validation, vectorizing, clustering, and per-story
/// coverage, entity and keyword analysis.
#[derive(Debug)]
pub struct StoryEngine {
    config: EngineConfig,
    tokenizer: Tokenizer,
    clusterer: ClusterBuilder,
    coverage: CoverageAnalyzer,
    extractor: EntityExtractor,
    scorer: BiasScorer,
}

impl Default for StoryEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl StoryEngine {
    /// `config` is taken as is; run [`EngineConfig::validate`] first when it
    /// comes from outside.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(&config.vectorizer),
            clusterer: ClusterBuilder::new(config.clustering.clone()),
            coverage: CoverageAnalyzer::new(config.coverage.clone()),
            extractor: EntityExtractor::new(config.extraction.clone(), &config.vectorizer),
            scorer: BiasScorer::new(config.bias.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scorer(&self) -> &BiasScorer {
        &self.scorer
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    /// Validates raw records and clusters the ones that pass. Invalid and
    /// duplicate records are reported in `skipped`, never raised.
    pub fn process_batch(&self, records: &[ArticleRecord], sources: &dyn SourceLookup) -> BatchOutcome {
        let mut seen: HashSet<ArticleId> = HashSet::new();
        let mut articles = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();

        for record in records {
            let reason = match Article::from_record(record) {
                Ok(article) if seen.insert(article.id.clone()) => {
                    articles.push(article);
                    continue;
                }
                Ok(article) => SkipReason::Duplicate(article.id),
                Err(reason) => reason,
            };
            warn!("Skipping article {}: {}", record.url, reason);
            skipped.push(SkippedArticle {
                url: record.url.clone(),
                reason,
            });
        }

        let mut outcome = self.cluster_articles(articles, sources);
        outcome.stats.received = records.len();
        outcome.stats.skipped = skipped.len();
        outcome.skipped = skipped;

        info!(
            "📰 Batch processed - received={}, accepted={}, skipped={}, stories={}, unclustered={}",
            outcome.stats.received,
            outcome.stats.accepted,
            outcome.stats.skipped,
            outcome.stats.stories,
            outcome.stats.unclustered
        );
        outcome
    }

    /// Clusters already-validated articles. Articles are ordered by id first
    /// so the same batch always yields the same partition in the same order.
    pub fn cluster_articles(&self, mut articles: Vec<Article>, sources: &dyn SourceLookup) -> BatchOutcome {
        articles.sort_by(|a, b| a.id.cmp(&b.id));
        articles.dedup_by(|a, b| a.id == b.id);

        let documents: Vec<(ArticleId, String)> = articles
            .iter()
            .map(|a| (a.id.clone(), a.headline_text()))
            .collect();
        let vectors = Vectorizer::new(&self.tokenizer).vectorize(&documents);
        let empty = vectors.iter().filter(|v| v.is_empty()).count();
        if empty > 0 {
            debug!("{} of {} articles have no usable terms", empty, vectors.len());
        }
        let matrix = SimilarityMatrix::compute(&vectors);
        let clustering = self.clusterer.build(&articles, &matrix);

        for cluster in &clustering.clusters {
            for &i in &cluster.members {
                self.extractor.entities_for(&mut articles[i]);
            }
        }

        let now = Utc::now();
        let assemble = |cluster: &Cluster| self.assemble_story(cluster, &articles, &matrix, sources, now);
        let stories: Vec<Story> = if articles.len() >= PARALLEL_MIN_ARTICLES {
            clustering.clusters.par_iter().map(assemble).collect()
        } else {
            clustering.clusters.iter().map(assemble).collect()
        };

        for (cluster, story) in clustering.clusters.iter().zip(&stories) {
            for &i in &cluster.members {
                articles[i].story_id = Some(story.id.clone());
            }
        }

        let clustered = clustering.clusters.iter().map(Cluster::len).sum();
        BatchOutcome {
            stats: BatchStats {
                received: articles.len(),
                accepted: articles.len(),
                skipped: 0,
                stories: stories.len(),
                clustered,
                unclustered: clustering.unclustered.len(),
            },
            stories,
            articles,
            unclustered: clustering.unclustered,
            skipped: Vec::new(),
        }
    }

    fn assemble_story(
        &self,
        cluster: &Cluster,
        articles: &[Article],
        matrix: &SimilarityMatrix,
        sources: &dyn SourceLookup,
        now: DateTime<Utc>,
    ) -> Story {
        let members: Vec<&Article> = cluster.members.iter().map(|&i| &articles[i]).collect();

        let member_bias: Vec<BiasIndicators> = members
            .iter()
            .map(|a| self.scorer.score_article(a, sources).indicators)
            .collect();
        let coverage_analysis = self.coverage.analyze(&members, sources, &member_bias);

        let text = members.iter().map(|a| a.text()).collect::<Vec<_>>().join("\n\n");
        let keywords = self.extractor.keywords(&text);
        let per_article: Vec<&[nb_core::Entity]> = members
            .iter()
            .map(|a| a.entities.as_deref().unwrap_or_default())
            .collect();
        let common_entities = self.extractor.common_entities(&per_article);

        let source_ids: Vec<SourceId> = members
            .iter()
            .map(|a| a.source_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let first_seen = members.iter().map(|a| a.published_at).min().unwrap_or(now);
        let last_updated = members.iter().map(|a| a.published_at).max().unwrap_or(now);

        let headline = articles[medoid(cluster, articles, matrix)].title.clone();
        let mut summary = format!(
            "{} articles from {} sources; coverage is {}.",
            members.len(),
            coverage_analysis.source_count,
            coverage_analysis.coverage_balance
        );
        if !keywords.is_empty() {
            let top: Vec<&str> = keywords.iter().take(SUMMARY_KEYWORDS).map(String::as_str).collect();
            summary.push_str(&format!(" Key terms: {}.", top.join(", ")));
        }

        Story {
            id: Story::generate_id(now),
            headline,
            summary,
            article_ids: cluster.article_ids.clone(),
            source_ids,
            common_entities,
            keywords,
            first_seen,
            last_updated,
            coverage_analysis,
        }
    }
}

/// The member most similar on average to the rest; ties go to the earliest
/// published, then the smallest id.
fn medoid(cluster: &Cluster, articles: &[Article], matrix: &SimilarityMatrix) -> usize {
    let k = cluster.members.len();
    let centrality = |i: usize| -> f64 {
        if k < 2 {
            return 0.0;
        }
        let total: f64 = cluster
            .members
            .iter()
            .filter(|&&j| j != i)
            .map(|&j| matrix.score(i, j))
            .sum();
        total / (k - 1) as f64
    };

    let mut best = cluster.members[0];
    let mut best_score = centrality(best);
    for &i in &cluster.members[1..] {
        let score = centrality(i);
        let better = score > best_score
            || (score == best_score
                && (articles[i].published_at, &articles[i].id) < (articles[best].published_at, &articles[best].id));
        if better {
            best = i;
            best_score = score;
        }
    }
    best
}
