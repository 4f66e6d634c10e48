//! Bias and sensationalism scoring.
//!
//! Three methods share one entry point: `static` reads a source's stored
//! profile, `heuristic` reads the text, `combined` blends the two. None of
//! them fail: missing sources and empty text produce low-confidence or
//! neutral results instead of errors.

use std::sync::Arc;

use nb_core::{Article, BiasAnalysis, BiasConfig, BiasIndicators, BiasMethod, LeanLabel, Source, SourceLookup};
use tracing::{debug, warn};

pub mod heuristic;
pub mod lexicon;

pub use heuristic::HeuristicScore;
pub use lexicon::{Lexicon, Pattern};

/// Heuristic share of a combined score for substantial texts.
const SUBSTANTIAL_HEURISTIC_WEIGHT: f64 = 0.7;
/// Heuristic share of a combined score for short texts.
const SHORT_HEURISTIC_WEIGHT: f64 = 0.3;

/// Text to score and, optionally, the outlet that published it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub source_id: Option<&'a str>,
}

impl<'a> ScoreRequest<'a> {
    pub fn new(title: &'a str, body: &'a str) -> Self {
        Self {
            title,
            body,
            source_id: None,
        }
    }

    pub fn with_source(mut self, source_id: &'a str) -> Self {
        self.source_id = Some(source_id);
        self
    }

    fn text_len(&self) -> usize {
        self.title.trim().chars().count() + self.body.trim().chars().count()
    }
}

/// Per-call overrides of [`BiasConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreOptions {
    pub method: Option<BiasMethod>,
    pub collect_evidence: Option<bool>,
}

impl ScoreOptions {
    pub fn method(method: BiasMethod) -> Self {
        Self {
            method: Some(method),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct BiasScorer {
    config: BiasConfig,
    lexicon: Arc<Lexicon>,
}

impl Default for BiasScorer {
    fn default() -> Self {
        Self::new(BiasConfig::default())
    }
}

impl BiasScorer {
    pub fn new(config: BiasConfig) -> Self {
        Self::with_lexicon(config, Lexicon::english())
    }

    pub fn with_lexicon(config: BiasConfig, lexicon: Arc<Lexicon>) -> Self {
        Self { config, lexicon }
    }

    pub fn config(&self) -> &BiasConfig {
        &self.config
    }

    /// Scores with the configured default method.
    pub fn score(&self, request: &ScoreRequest<'_>, sources: &dyn SourceLookup) -> BiasAnalysis {
        self.score_with(request, sources, &ScoreOptions::default())
    }

    pub fn score_with(
        &self,
        request: &ScoreRequest<'_>,
        sources: &dyn SourceLookup,
        options: &ScoreOptions,
    ) -> BiasAnalysis {
        let method = options.method.unwrap_or(self.config.default_method);
        let collect_evidence = options.collect_evidence.unwrap_or(self.config.collect_evidence);
        let source = request.source_id.and_then(|id| sources.source(id));

        let analysis = match (method, source) {
            (BiasMethod::Static, Some(source)) => self.static_analysis(source),
            (BiasMethod::Heuristic, _) => self.heuristic_analysis(request, source, collect_evidence),
            (BiasMethod::Combined, Some(source)) => self.combined_analysis(request, source, collect_evidence),
            (BiasMethod::Static | BiasMethod::Combined, None) => self.unknown_analysis(request.source_id, method),
        };

        debug_assert!(
            analysis.indicators.is_within_bounds(),
            "bias indicators out of bounds: {:?}",
            analysis.indicators
        );
        debug!(
            "Scored text - method={}, confidence={:.2}, evidence={}",
            analysis.method,
            analysis.confidence,
            analysis.evidence.len()
        );
        analysis
    }

    /// Scores an article's title against its description and content.
    pub fn score_article(&self, article: &Article, sources: &dyn SourceLookup) -> BiasAnalysis {
        let body = article.body();
        let request = ScoreRequest::new(&article.title, &body).with_source(&article.source_id);
        self.score(&request, sources)
    }

    fn static_analysis(&self, source: &Source) -> BiasAnalysis {
        let indicators = source.bias.clamped();
        BiasAnalysis {
            summary: format!("Stored profile for {}: {}", source.name, describe(&indicators)),
            indicators,
            confidence: self.config.static_confidence,
            evidence: Vec::new(),
            method: BiasMethod::Static,
            unknown_source: false,
        }
    }

    fn heuristic_analysis(
        &self,
        request: &ScoreRequest<'_>,
        source: Option<&Source>,
        collect_evidence: bool,
    ) -> BiasAnalysis {
        let factual_accuracy = source
            .map(|s| s.bias.factual_accuracy)
            .unwrap_or(self.config.default_factual_accuracy);
        let scored = heuristic::score(&self.lexicon, request.title, request.body, factual_accuracy, collect_evidence);

        let summary = if scored.word_count == 0 {
            "No text to analyze; indicators are neutral.".to_string()
        } else {
            format!("Text analysis of {} words: {}", scored.word_count, describe(&scored.indicators))
        };
        BiasAnalysis {
            indicators: scored.indicators,
            confidence: scored.confidence,
            summary,
            evidence: scored.evidence,
            method: BiasMethod::Heuristic,
            unknown_source: request.source_id.is_some() && source.is_none(),
        }
    }

    fn combined_analysis(&self, request: &ScoreRequest<'_>, source: &Source, collect_evidence: bool) -> BiasAnalysis {
        let stored = self.static_analysis(source);
        let text = self.heuristic_analysis(request, Some(source), collect_evidence);
        let weight = if request.text_len() >= self.config.substantial_text_length {
            SUBSTANTIAL_HEURISTIC_WEIGHT
        } else {
            SHORT_HEURISTIC_WEIGHT
        };

        let indicators = stored.indicators.blend(&text.indicators, weight);
        let confidence = (stored.confidence * (1.0 - weight) + text.confidence * weight).clamp(0.0, 1.0);
        BiasAnalysis {
            summary: format!(
                "Blend of {}'s stored profile and the text ({:.0}% text): {}",
                source.name,
                weight * 100.0,
                describe(&indicators)
            ),
            indicators,
            confidence,
            evidence: text.evidence,
            method: BiasMethod::Combined,
            unknown_source: false,
        }
    }

    fn unknown_analysis(&self, source_id: Option<&str>, method: BiasMethod) -> BiasAnalysis {
        let summary = match source_id {
            Some(id) => {
                warn!("No bias profile for source {}, returning neutral indicators", id);
                format!("Source {} is unknown; indicators are neutral placeholders.", id)
            }
            None => "No source given; indicators are neutral placeholders.".to_string(),
        };
        BiasAnalysis {
            indicators: BiasIndicators::neutral(),
            confidence: self.config.unknown_source_confidence,
            summary,
            evidence: Vec::new(),
            method,
            unknown_source: true,
        }
    }
}

fn level(value: f64) -> &'static str {
    if value < 0.34 {
        "low"
    } else if value < 0.67 {
        "moderate"
    } else {
        "high"
    }
}

fn describe(indicators: &BiasIndicators) -> String {
    format!(
        "{} lean, {} sensationalism, {} opinion mixing, {} transparency.",
        LeanLabel::from_lean(indicators.political_lean),
        level(indicators.sensationalism),
        level(indicators.opinion_mixing),
        level(indicators.transparency)
    )
}
