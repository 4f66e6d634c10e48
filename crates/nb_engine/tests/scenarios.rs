//! End-to-end batches through the engine.

use std::collections::BTreeSet;

use nb_core::{
    ArticleRecord, BiasMethod, ClusterConfig, CoverageBalance, EngineConfig, Indicator, SourceRecord, SourceRegistry,
};
use nb_engine::{BiasScorer, ScoreOptions, ScoreRequest, StoryEngine};

fn record(url: &str, title: &str, source: &str) -> ArticleRecord {
    ArticleRecord {
        url: url.to_string(),
        title: Some(title.to_string()),
        description: None,
        content: None,
        source_id: Some(source.to_string()),
        published_at: Some("2024-03-05T12:00:00Z".to_string()),
    }
}

fn sources(leans: &[(&str, f64)]) -> SourceRegistry {
    SourceRegistry::from_records(
        leans
            .iter()
            .map(|(id, lean)| SourceRecord {
                id: id.to_string(),
                lean: Some(*lean),
                ..Default::default()
            })
            .collect(),
    )
    .unwrap()
}

/// Articles on unrelated topics, so terms shared by a story are not shared
/// by the whole batch.
fn filler() -> Vec<ArticleRecord> {
    vec![
        record("https://misc.example/1", "Local team wins championship", "misc-1"),
        record("https://misc.example/2", "Hurricane batters coastal towns", "misc-2"),
        record("https://misc.example/3", "Museum unveils dinosaur exhibit", "misc-3"),
    ]
}

fn with_threshold(threshold: f64) -> StoryEngine {
    StoryEngine::new(EngineConfig {
        clustering: ClusterConfig {
            similarity_threshold: threshold,
            ..ClusterConfig::default()
        },
        ..EngineConfig::default()
    })
}

#[test]
fn test_identical_titles_from_different_sources_cluster() {
    let records = vec![
        record("https://one.example/budget", "Senate Passes Budget Bill", "one"),
        record("https://two.example/budget", "Senate Passes Budget Bill", "two"),
        record("https://three.example/sports", "Local Team Wins Championship", "three"),
    ];
    let outcome = StoryEngine::default().process_batch(&records, &sources(&[]));

    assert_eq!(outcome.stories.len(), 1);
    let story = &outcome.stories[0];
    let members: BTreeSet<&str> = story.article_ids.iter().map(String::as_str).collect();
    let urls: BTreeSet<&str> = outcome
        .articles
        .iter()
        .filter(|a| members.contains(a.id.as_str()))
        .map(|a| a.url.as_str())
        .collect();
    assert_eq!(
        urls,
        BTreeSet::from(["https://one.example/budget", "https://two.example/budget"])
    );
    assert_eq!(outcome.unclustered.len(), 1);
    assert_eq!(story.headline, "Senate Passes Budget Bill");
}

#[test]
fn test_identical_pair_clusters_without_other_articles() {
    let records = vec![
        record("https://one.example/budget", "Senate Passes Budget Bill", "one"),
        record("https://two.example/budget", "Senate Passes Budget Bill", "two"),
    ];
    let outcome = StoryEngine::default().process_batch(&records, &sources(&[]));
    assert_eq!(outcome.stories.len(), 1);
    assert!(outcome.unclustered.is_empty());
}

#[test]
fn test_reworded_copy_clusters_when_all_terms_are_shared() {
    let records = vec![
        record("https://one.example/budget", "Senate budget", "one"),
        record("https://two.example/budget", "Senate budget, senate budget", "two"),
    ];
    let outcome = StoryEngine::default().process_batch(&records, &sources(&[]));
    assert_eq!(outcome.stories.len(), 1);
    assert_eq!(outcome.stories[0].article_ids.len(), 2);
}

#[test]
fn test_publish_gap_is_measured_to_the_minute() {
    let pair = |later: &str| {
        let mut first = record("https://a.example/budget", "Senate passes budget bill", "a");
        first.published_at = Some("2024-03-05T00:00:00Z".to_string());
        let mut second = record("https://b.example/budget", "Senate passes budget bill", "b");
        second.published_at = Some(later.to_string());
        let mut records = vec![first, second];
        for mut item in filler() {
            item.published_at = Some("2024-03-06T12:00:00Z".to_string());
            records.push(item);
        }
        records
    };
    let engine = StoryEngine::default();

    let exact = engine.process_batch(&pair("2024-03-08T00:00:00Z"), &sources(&[]));
    assert_eq!(exact.stories.len(), 1);

    let over = engine.process_batch(&pair("2024-03-08T00:59:00Z"), &sources(&[]));
    assert!(over.stories.is_empty());
}

#[test]
fn test_stopword_overlap_never_clusters() {
    let mut records = vec![
        record("https://one.example/a", "The senators were there with their aides", "one"),
        record("https://two.example/b", "The storm was there with their boats", "two"),
    ];
    records.extend(filler());
    for threshold in [0.0, 0.25, 0.3, 0.35] {
        let outcome = with_threshold(threshold).process_batch(&records, &sources(&[]));
        assert!(outcome.stories.is_empty(), "clustered at threshold {}", threshold);
        assert_eq!(outcome.unclustered.len(), records.len());
    }
}

#[test]
fn test_stopword_only_articles_stay_unclustered() {
    let mut records = vec![
        record("https://one.example/a", "What is this?", "one"),
        record("https://two.example/b", "What is this?", "two"),
    ];
    records.extend(filler());
    let outcome = StoryEngine::default().process_batch(&records, &sources(&[]));
    assert!(outcome.stories.is_empty());
}

#[test]
fn test_four_left_one_center_is_left_heavy() {
    let registry = sources(&[("l1", -0.8), ("l2", -0.5), ("l3", -0.4), ("l4", -0.3), ("c1", 0.0)]);
    let mut records: Vec<ArticleRecord> = ["l1", "l2", "l3", "l4", "c1"]
        .iter()
        .map(|s| record(&format!("https://{}.example/budget", s), "Senate passes budget bill", s))
        .collect();
    records.extend(filler());

    let outcome = StoryEngine::default().process_batch(&records, &registry);
    assert_eq!(outcome.stories.len(), 1);
    let coverage = &outcome.stories[0].coverage_analysis;
    assert_eq!(coverage.source_count, 5);
    assert_eq!(coverage.lean_distribution.left, 4);
    assert_eq!(coverage.lean_distribution.center, 1);
    assert_eq!(coverage.lean_distribution.right, 0);
    assert_eq!(coverage.coverage_balance, CoverageBalance::LeftHeavy);
}

#[test]
fn test_even_spread_is_balanced() {
    let registry = sources(&[
        ("l1", -0.7),
        ("l2", -0.4),
        ("c1", 0.1),
        ("c2", -0.1),
        ("r1", 0.5),
        ("r2", 0.9),
    ]);
    let mut records: Vec<ArticleRecord> = ["l1", "l2", "c1", "c2", "r1", "r2"]
        .iter()
        .map(|s| record(&format!("https://{}.example/budget", s), "Senate passes budget bill", s))
        .collect();
    records.extend(filler());

    let outcome = StoryEngine::default().process_batch(&records, &registry);
    assert_eq!(outcome.stories.len(), 1);
    let coverage = &outcome.stories[0].coverage_analysis;
    assert_eq!(coverage.source_count, 6);
    assert_eq!(coverage.coverage_balance, CoverageBalance::Balanced);
    assert!(coverage.average_bias.is_within_bounds());
}

#[test]
fn test_sensational_title_outscores_plain_title() {
    let scorer = BiasScorer::default();
    let registry = sources(&[]);
    let options = ScoreOptions::method(BiasMethod::Heuristic);

    let loud = scorer.score_with(
        &ScoreRequest::new("YOU WON'T BELIEVE WHAT HAPPENED!!!", ""),
        &registry,
        &options,
    );
    let plain = scorer.score_with(&ScoreRequest::new("Senate Passes Budget Bill", ""), &registry, &options);

    assert!(loud.indicators.sensationalism > plain.indicators.sensationalism + 0.5);
    assert!(loud.evidence_for(Indicator::Sensationalism).count() >= 1);
    assert_eq!(loud.method, BiasMethod::Heuristic);
}

#[test]
fn test_clustering_is_idempotent() {
    let mut records = vec![
        record("https://one.example/a", "Senate passes budget bill", "one"),
        record("https://two.example/a", "Senate passes budget bill after debate", "two"),
        record("https://three.example/a", "Budget bill passes the Senate", "three"),
        record("https://four.example/a", "Hurricane batters coastal towns overnight", "four"),
        record("https://five.example/a", "Coastal towns battered by hurricane", "five"),
    ];
    records.extend(filler());
    let registry = sources(&[]);
    let engine = StoryEngine::default();

    let first = engine.process_batch(&records, &registry);
    let second = engine.process_batch(&records, &registry);
    assert_eq!(first.partition(), second.partition());
    assert_eq!(first.unclustered, second.unclustered);
    assert!(!first.stories.is_empty());

    let mut reversed = records.clone();
    reversed.reverse();
    let third = engine.process_batch(&reversed, &registry);
    assert_eq!(first.partition(), third.partition());
}

#[test]
fn test_every_article_is_accounted_for_once() {
    let mut records = vec![
        record("https://one.example/a", "Senate passes budget bill", "one"),
        record("https://two.example/a", "Senate passes budget bill", "two"),
        record("https://one.example/b", "Senate passes budget bill", "one"),
        record("https://four.example/a", "Hurricane batters coastal towns", "four"),
    ];
    records.extend(filler());
    let outcome = StoryEngine::default().process_batch(&records, &sources(&[]));

    let mut seen: Vec<&str> = outcome
        .stories
        .iter()
        .flat_map(|s| s.article_ids.iter())
        .chain(outcome.unclustered.iter())
        .map(String::as_str)
        .collect();
    let total = seen.len();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), total, "an article appears twice");

    let all: Vec<&str> = outcome.articles.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(seen, all);
    assert!(outcome.stories.iter().all(|s| s.article_ids.len() >= 2));
}

#[test]
fn test_no_story_repeats_a_source() {
    let records = vec![
        record("https://one.example/a", "Senate passes budget bill", "one"),
        record("https://one.example/b", "Senate passes budget bill", "one"),
        record("https://two.example/a", "Senate passes budget bill", "two"),
        record("https://misc.example/1", "Local team wins championship", "misc"),
    ];
    let outcome = StoryEngine::default().process_batch(&records, &sources(&[]));
    assert_eq!(outcome.stories.len(), 1);

    for story in &outcome.stories {
        let members: Vec<&str> = story
            .article_ids
            .iter()
            .filter_map(|id| outcome.articles.iter().find(|a| &a.id == id))
            .map(|a| a.source_id.as_str())
            .collect();
        let distinct: BTreeSet<&str> = members.iter().copied().collect();
        assert_eq!(members.len(), distinct.len());
        assert_eq!(story.coverage_analysis.source_count, distinct.len());
    }
}

#[test]
fn test_outcome_serializes() {
    let records = vec![
        record("https://one.example/a", "Senate passes budget bill", "one"),
        record("https://two.example/a", "Senate passes budget bill", "two"),
        ArticleRecord {
            url: "https://three.example/a".to_string(),
            ..Default::default()
        },
    ];
    let outcome = StoryEngine::default().process_batch(&records, &sources(&[]));
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["stats"]["skipped"], 1);
    assert_eq!(json["skipped"][0]["reason"]["reason"], "missing_title");
    assert_eq!(
        json["stories"][0]["coverage_analysis"]["coverage_balance"],
        "limited"
    );
}
