use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::bias::BiasIndicators;
use crate::types::SourceId;
use crate::{Error, Result};

/// Converts a 0..100 bias score (0 = far left, 100 = far right) to the
/// canonical [-1, 1] lean.
pub fn lean_from_bias_score(score: f64) -> f64 {
    (score / 50.0 - 1.0).clamp(-1.0, 1.0)
}

pub fn bias_score_from_lean(lean: f64) -> f64 {
    ((lean.clamp(-1.0, 1.0) + 1.0) * 50.0).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Wire,
    Mainstream,
    Broadcast,
    Digital,
    Opinion,
    #[default]
    Other,
}

/// Five-band label over the 0..100 bias score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeanLabel {
    Left,
    CenterLeft,
    Center,
    CenterRight,
    Right,
}

impl LeanLabel {
    pub fn from_bias_score(score: f64) -> Self {
        match score {
            s if s <= 30.0 => LeanLabel::Left,
            s if s <= 45.0 => LeanLabel::CenterLeft,
            s if s < 55.0 => LeanLabel::Center,
            s if s < 70.0 => LeanLabel::CenterRight,
            _ => LeanLabel::Right,
        }
    }

    pub fn from_lean(lean: f64) -> Self {
        Self::from_bias_score(bias_score_from_lean(lean))
    }
}

impl fmt::Display for LeanLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LeanLabel::Left => "left",
            LeanLabel::CenterLeft => "center-left",
            LeanLabel::Center => "center",
            LeanLabel::CenterRight => "center-right",
            LeanLabel::Right => "right",
        };
        f.write_str(label)
    }
}

/// Reference data about an outlet. `lean` is always on the [-1, 1] scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub lean: f64,
    pub reliability: f64,
    pub category: SourceCategory,
    /// Static bias profile used by the `static` scoring method.
    pub bias: BiasIndicators,
}

/// Source metadata as supplied from outside. Accepts either a [-1, 1]
/// `lean` or a 0..100 `bias_score`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lean: Option<f64>,
    #[serde(default)]
    pub bias_score: Option<f64>,
    #[serde(default)]
    pub reliability: Option<f64>,
    #[serde(default)]
    pub category: SourceCategory,
    #[serde(default)]
    pub bias: Option<BiasIndicators>,
}

const DEFAULT_RELIABILITY: f64 = 0.7;

impl Source {
    pub fn from_record(record: SourceRecord) -> Result<Self> {
        let id = record.id.trim().to_string();
        if id.is_empty() {
            return Err(Error::InvalidInput("source id must not be empty".to_string()));
        }

        let lean = match (record.lean, record.bias_score) {
            (Some(lean), _) if (-1.0..=1.0).contains(&lean) => lean,
            (Some(lean), _) => {
                return Err(Error::InvalidInput(format!(
                    "source {}: lean {} outside [-1, 1]",
                    id, lean
                )))
            }
            (None, Some(score)) if (0.0..=100.0).contains(&score) => lean_from_bias_score(score),
            (None, Some(score)) => {
                return Err(Error::InvalidInput(format!(
                    "source {}: bias_score {} outside [0, 100]",
                    id, score
                )))
            }
            (None, None) => 0.0,
        };

        let reliability = record.reliability.unwrap_or(DEFAULT_RELIABILITY);
        if !(0.0..=1.0).contains(&reliability) {
            return Err(Error::InvalidInput(format!(
                "source {}: reliability {} outside [0, 1]",
                id, reliability
            )));
        }

        let bias = record
            .bias
            .map(BiasIndicators::clamped)
            .unwrap_or_else(|| default_profile(lean, reliability, record.category));

        Ok(Self {
            name: record.name.unwrap_or_else(|| id.clone()),
            id,
            lean,
            reliability,
            category: record.category,
            bias,
        })
    }

    pub fn lean_label(&self) -> LeanLabel {
        LeanLabel::from_lean(self.lean)
    }
}

fn default_profile(lean: f64, reliability: f64, category: SourceCategory) -> BiasIndicators {
    let (sensationalism, opinion_mixing) = match category {
        SourceCategory::Wire => (0.1, 0.1),
        SourceCategory::Mainstream => (0.25, 0.25),
        SourceCategory::Broadcast => (0.35, 0.3),
        SourceCategory::Digital => (0.4, 0.35),
        SourceCategory::Opinion => (0.45, 0.7),
        SourceCategory::Other => (0.3, 0.3),
    };
    BiasIndicators::new(lean, sensationalism, reliability, opinion_mixing, reliability)
}

/// Resolves a source id to its metadata.
pub trait SourceLookup: Send + Sync {
    fn source(&self, id: &str) -> Option<&Source>;
}

impl SourceLookup for HashMap<SourceId, Source> {
    fn source(&self, id: &str) -> Option<&Source> {
        self.get(id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<SourceId, Source>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: Source) {
        if let Some(previous) = self.sources.insert(source.id.clone(), source) {
            warn!("Source {} registered twice, keeping the latest entry", previous.id);
        }
    }

    /// Builds a registry from raw records, rejecting the first invalid one.
    pub fn from_records(records: Vec<SourceRecord>) -> Result<Self> {
        let mut registry = Self::new();
        for record in records {
            registry.insert(Source::from_record(record)?);
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }
}

impl SourceLookup for SourceRegistry {
    fn source(&self, id: &str) -> Option<&Source> {
        self.sources.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> SourceRecord {
        SourceRecord {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_bias_score_converts_to_canonical_lean() {
        let source = Source::from_record(SourceRecord {
            bias_score: Some(25.0),
            ..record("left-daily")
        })
        .unwrap();
        assert!((source.lean - -0.5).abs() < 1e-9);
        assert_eq!(source.lean_label(), LeanLabel::Left);
        assert_eq!(source.bias.political_lean, source.lean);
    }

    #[test]
    fn test_explicit_lean_wins_and_is_validated() {
        let source = Source::from_record(SourceRecord {
            lean: Some(0.3),
            bias_score: Some(10.0),
            ..record("a")
        })
        .unwrap();
        assert_eq!(source.lean, 0.3);

        assert!(Source::from_record(SourceRecord { lean: Some(40.0), ..record("b") }).is_err());
        assert!(Source::from_record(SourceRecord { bias_score: Some(140.0), ..record("c") }).is_err());
        assert!(Source::from_record(record("  ")).is_err());
    }

    #[test]
    fn test_lean_labels_follow_score_bands() {
        assert_eq!(LeanLabel::from_bias_score(30.0), LeanLabel::Left);
        assert_eq!(LeanLabel::from_bias_score(31.0), LeanLabel::CenterLeft);
        assert_eq!(LeanLabel::from_bias_score(50.0), LeanLabel::Center);
        assert_eq!(LeanLabel::from_bias_score(55.0), LeanLabel::CenterRight);
        assert_eq!(LeanLabel::from_bias_score(70.0), LeanLabel::Right);
        assert_eq!(bias_score_from_lean(0.0), 50.0);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = SourceRegistry::from_records(vec![record("a"), record("b")]).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.source("a").is_some());
        assert!(registry.source("missing").is_none());
    }
}
