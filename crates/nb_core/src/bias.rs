use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::sources::LeanLabel;

/// Five bias scalars. `political_lean` lies in [-1, 1] (negative is left),
/// every other field in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasIndicators {
    pub political_lean: f64,
    pub sensationalism: f64,
    pub factual_accuracy: f64,
    pub opinion_mixing: f64,
    pub transparency: f64,
}

impl BiasIndicators {
    pub const ZERO: BiasIndicators = BiasIndicators {
        political_lean: 0.0,
        sensationalism: 0.0,
        factual_accuracy: 0.0,
        opinion_mixing: 0.0,
        transparency: 0.0,
    };

    pub fn new(
        political_lean: f64,
        sensationalism: f64,
        factual_accuracy: f64,
        opinion_mixing: f64,
        transparency: f64,
    ) -> Self {
        Self {
            political_lean,
            sensationalism,
            factual_accuracy,
            opinion_mixing,
            transparency,
        }
        .clamped()
    }

    /// Values used when nothing is known about a text or its source.
    pub fn neutral() -> Self {
        Self::new(0.0, 0.5, 0.5, 0.5, 0.5)
    }

    pub fn clamped(self) -> Self {
        Self {
            political_lean: clamp(self.political_lean, -1.0, 1.0),
            sensationalism: clamp(self.sensationalism, 0.0, 1.0),
            factual_accuracy: clamp(self.factual_accuracy, 0.0, 1.0),
            opinion_mixing: clamp(self.opinion_mixing, 0.0, 1.0),
            transparency: clamp(self.transparency, 0.0, 1.0),
        }
    }

    pub fn is_within_bounds(&self) -> bool {
        (-1.0..=1.0).contains(&self.political_lean)
            && [
                self.sensationalism,
                self.factual_accuracy,
                self.opinion_mixing,
                self.transparency,
            ]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    pub fn get(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::PoliticalLean => self.political_lean,
            Indicator::Sensationalism => self.sensationalism,
            Indicator::FactualAccuracy => self.factual_accuracy,
            Indicator::OpinionMixing => self.opinion_mixing,
            Indicator::Transparency => self.transparency,
        }
    }

    /// Weighted blend: `weight` goes to `other`, the rest to `self`.
    pub fn blend(&self, other: &BiasIndicators, weight: f64) -> Self {
        let w = clamp(weight, 0.0, 1.0);
        let mix = |a: f64, b: f64| a * (1.0 - w) + b * w;
        Self::new(
            mix(self.political_lean, other.political_lean),
            mix(self.sensationalism, other.sensationalism),
            mix(self.factual_accuracy, other.factual_accuracy),
            mix(self.opinion_mixing, other.opinion_mixing),
            mix(self.transparency, other.transparency),
        )
    }

    /// Arithmetic mean per dimension; an empty slice averages to [`Self::ZERO`].
    pub fn mean(items: &[BiasIndicators]) -> Self {
        if items.is_empty() {
            return Self::ZERO;
        }
        let n = items.len() as f64;
        let sum = items.iter().fold(Self::ZERO, |acc, i| Self {
            political_lean: acc.political_lean + i.political_lean,
            sensationalism: acc.sensationalism + i.sensationalism,
            factual_accuracy: acc.factual_accuracy + i.factual_accuracy,
            opinion_mixing: acc.opinion_mixing + i.opinion_mixing,
            transparency: acc.transparency + i.transparency,
        });
        Self::new(
            sum.political_lean / n,
            sum.sensationalism / n,
            sum.factual_accuracy / n,
            sum.opinion_mixing / n,
            sum.transparency / n,
        )
    }
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0_f64.clamp(min, max);
    }
    value.clamp(min, max)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    PoliticalLean,
    Sensationalism,
    FactualAccuracy,
    OpinionMixing,
    Transparency,
}

impl Indicator {
    pub const ALL: [Indicator; 5] = [
        Indicator::PoliticalLean,
        Indicator::Sensationalism,
        Indicator::FactualAccuracy,
        Indicator::OpinionMixing,
        Indicator::Transparency,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Indicator::PoliticalLean => "Political lean",
            Indicator::Sensationalism => "Sensationalism",
            Indicator::FactualAccuracy => "Factual accuracy",
            Indicator::OpinionMixing => "Opinion mixing",
            Indicator::Transparency => "Transparency",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Indicator::PoliticalLean => "political_lean",
            Indicator::Sensationalism => "sensationalism",
            Indicator::FactualAccuracy => "factual_accuracy",
            Indicator::OpinionMixing => "opinion_mixing",
            Indicator::Transparency => "transparency",
        };
        f.write_str(name)
    }
}

/// Which scoring path produced an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasMethod {
    Static,
    Heuristic,
    #[default]
    Combined,
}

impl fmt::Display for BiasMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiasMethod::Static => f.write_str("static"),
            BiasMethod::Heuristic => f.write_str("heuristic"),
            BiasMethod::Combined => f.write_str("combined"),
        }
    }
}

impl FromStr for BiasMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(BiasMethod::Static),
            "heuristic" => Ok(BiasMethod::Heuristic),
            "combined" => Ok(BiasMethod::Combined),
            other => Err(format!("Unknown bias method: {} (expected static, heuristic or combined)", other)),
        }
    }
}

/// A span of text that moved one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub text: String,
    pub indicator: Indicator,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasAnalysis {
    pub indicators: BiasIndicators,
    pub confidence: f64,
    pub summary: String,
    pub evidence: Vec<Evidence>,
    pub method: BiasMethod,
    /// Set when the requested source had no profile.
    #[serde(default)]
    pub unknown_source: bool,
}

impl BiasAnalysis {
    pub fn lean_label(&self) -> LeanLabel {
        LeanLabel::from_lean(self.indicators.political_lean)
    }

    pub fn evidence_for(&self, indicator: Indicator) -> impl Iterator<Item = &Evidence> {
        self.evidence.iter().filter(move |e| e.indicator == indicator)
    }
}

impl fmt::Display for BiasAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.lean_label();
        writeln!(
            f,
            "Bias Score: {:.0}/100 ({})",
            crate::sources::bias_score_from_lean(self.indicators.political_lean),
            label
        )?;
        writeln!(f, "Method: {} (confidence {:.2})", self.method, self.confidence)?;
        writeln!(f)?;
        writeln!(f, "Indicators:")?;
        for indicator in Indicator::ALL {
            writeln!(f, "  • {}: {:.2}", indicator.label(), self.indicators.get(indicator))?;
        }
        if !self.evidence.is_empty() {
            writeln!(f)?;
            writeln!(f, "Evidence:")?;
            for evidence in &self.evidence {
                let snippet = if evidence.text.chars().count() > 100 {
                    format!("{}...", evidence.text.chars().take(100).collect::<String>())
                } else {
                    evidence.text.clone()
                };
                writeln!(
                    f,
                    "  • {}: \"{}\" ({})",
                    evidence.indicator.label(),
                    snippet,
                    evidence.explanation
                )?;
            }
        }
        writeln!(f)?;
        write!(f, "Assessment: {}", self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_out_of_range_values() {
        let indicators = BiasIndicators::new(-3.0, 1.5, f64::NAN, -0.2, 0.4);
        assert_eq!(indicators.political_lean, -1.0);
        assert_eq!(indicators.sensationalism, 1.0);
        assert_eq!(indicators.factual_accuracy, 0.0);
        assert_eq!(indicators.opinion_mixing, 0.0);
        assert!(indicators.is_within_bounds());
    }

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_eq!(BiasIndicators::mean(&[]), BiasIndicators::ZERO);
    }

    #[test]
    fn test_mean_and_blend() {
        let a = BiasIndicators::new(-1.0, 0.0, 1.0, 0.0, 1.0);
        let b = BiasIndicators::new(1.0, 1.0, 0.0, 1.0, 0.0);
        let mean = BiasIndicators::mean(&[a, b]);
        assert_eq!(mean, BiasIndicators::new(0.0, 0.5, 0.5, 0.5, 0.5));

        let blended = a.blend(&b, 0.25);
        assert!((blended.political_lean - -0.5).abs() < 1e-9);
        assert!((blended.sensationalism - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("Heuristic".parse::<BiasMethod>(), Ok(BiasMethod::Heuristic));
        assert!("magic".parse::<BiasMethod>().is_err());
        assert_eq!(BiasMethod::default(), BiasMethod::Combined);
    }
}
