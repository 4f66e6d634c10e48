use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bias::BiasMethod;
use crate::{Error, Result};

/// Everything the engine can be tuned with. Every field has a default, so a
/// config file only needs the values it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub vectorizer: VectorizerConfig,
    pub clustering: ClusterConfig,
    pub extraction: ExtractionConfig,
    pub coverage: CoverageConfig,
    pub bias: BiasConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    pub min_token_length: usize,
    pub stemming: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            min_token_length: 3,
            stemming: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub similarity_threshold: f64,
    pub min_cluster_size: usize,
    /// Never place two articles from one source in the same story.
    pub enforce_source_diversity: bool,
    /// Largest publish-time distance between two unioned articles. `None`
    /// disables the window.
    pub max_time_gap_hours: Option<i64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            min_cluster_size: 2,
            enforce_source_diversity: true,
            max_time_gap_hours: Some(72),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub max_keywords: usize,
    pub max_entities: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_keywords: 10,
            max_entities: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Leans strictly below this are left.
    pub left_cutoff: f64,
    /// Leans strictly above this are right.
    pub right_cutoff: f64,
    /// Fewer distinct sources than this yields a `limited` verdict.
    pub limited_source_floor: usize,
    pub heavy_ratio: f64,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            left_cutoff: -0.2,
            right_cutoff: 0.2,
            limited_source_floor: 3,
            heavy_ratio: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasConfig {
    pub default_method: BiasMethod,
    pub static_confidence: f64,
    pub unknown_source_confidence: f64,
    /// Texts at least this many characters long favour the heuristic score
    /// when blending.
    pub substantial_text_length: usize,
    pub default_factual_accuracy: f64,
    pub collect_evidence: bool,
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self {
            default_method: BiasMethod::Combined,
            static_confidence: 0.5,
            unknown_source_confidence: 0.1,
            substantial_text_length: 500,
            default_factual_accuracy: 0.7,
            collect_evidence: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(Error::Config(format!("{} must be within [0, 1], got {}", name, value)))
            }
        };

        unit("clustering.similarity_threshold", self.clustering.similarity_threshold)?;
        unit("bias.static_confidence", self.bias.static_confidence)?;
        unit("bias.unknown_source_confidence", self.bias.unknown_source_confidence)?;
        unit("bias.default_factual_accuracy", self.bias.default_factual_accuracy)?;

        if self.clustering.min_cluster_size == 0 {
            return Err(Error::Config("clustering.min_cluster_size must be at least 1".to_string()));
        }
        if let Some(hours) = self.clustering.max_time_gap_hours {
            if hours < 0 {
                return Err(Error::Config(format!(
                    "clustering.max_time_gap_hours must not be negative, got {}",
                    hours
                )));
            }
        }
        if self.vectorizer.min_token_length == 0 {
            return Err(Error::Config("vectorizer.min_token_length must be at least 1".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.coverage.left_cutoff)
            || !(-1.0..=1.0).contains(&self.coverage.right_cutoff)
            || self.coverage.left_cutoff > self.coverage.right_cutoff
        {
            return Err(Error::Config(format!(
                "coverage cutoffs must satisfy -1 <= left ({}) <= right ({}) <= 1",
                self.coverage.left_cutoff, self.coverage.right_cutoff
            )));
        }
        if !(self.coverage.heavy_ratio >= 1.0) {
            return Err(Error::Config(format!(
                "coverage.heavy_ratio must be at least 1, got {}",
                self.coverage.heavy_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clustering.similarity_threshold, 0.3);
        assert_eq!(config.clustering.min_cluster_size, 2);
        assert_eq!(config.coverage.limited_source_floor, 3);
        assert_eq!(config.coverage.heavy_ratio, 2.0);
        assert_eq!(config.vectorizer.min_token_length, 3);
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "clustering": {{ "similarity_threshold": 0.45 }}, "bias": {{ "default_method": "heuristic" }} }}"#
        )
        .unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.clustering.similarity_threshold, 0.45);
        assert_eq!(config.clustering.min_cluster_size, 2);
        assert_eq!(config.bias.default_method, BiasMethod::Heuristic);
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "clustering": { "similarity_threshold": 1.5 } }"#);
        assert!(matches!(err, Err(Error::Config(_))));

        let err = EngineConfig::from_json_str(r#"{ "coverage": { "left_cutoff": 0.5, "right_cutoff": 0.1 } }"#);
        assert!(matches!(err, Err(Error::Config(_))));

        let err = EngineConfig::from_json_str("{ not json");
        assert!(matches!(err, Err(Error::Serialization(_))));
    }
}
