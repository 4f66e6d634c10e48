use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::bias::{BiasIndicators, Indicator};
use crate::types::{ArticleId, SourceId, StoryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Person,
    Organization,
    Location,
    Other,
}

/// A proper-noun candidate and how often it was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeanBucket {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeanDistribution {
    pub left: usize,
    pub center: usize,
    pub right: usize,
}

impl LeanDistribution {
    pub fn add(&mut self, bucket: LeanBucket) {
        match bucket {
            LeanBucket::Left => self.left += 1,
            LeanBucket::Center => self.center += 1,
            LeanBucket::Right => self.right += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.left + self.center + self.right
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoverageBalance {
    Limited,
    LeftHeavy,
    RightHeavy,
    Balanced,
}

impl fmt::Display for CoverageBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = match self {
            CoverageBalance::Limited => "limited",
            CoverageBalance::LeftHeavy => "left-heavy",
            CoverageBalance::RightHeavy => "right-heavy",
            CoverageBalance::Balanced => "balanced",
        };
        f.write_str(verdict)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFraming {
    pub source_id: SourceId,
    pub framing: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramingDifference {
    pub aspect: String,
    pub framings: Vec<SourceFraming>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageAnalysis {
    pub source_count: usize,
    pub lean_distribution: LeanDistribution,
    pub average_bias: BiasIndicators,
    pub framing_differences: Vec<FramingDifference>,
    pub coverage_balance: CoverageBalance,
}

impl fmt::Display for CoverageAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Coverage: {} ({} sources; {} left / {} center / {} right)",
            self.coverage_balance,
            self.source_count,
            self.lean_distribution.left,
            self.lean_distribution.center,
            self.lean_distribution.right
        )?;
        writeln!(f, "Average bias:")?;
        for indicator in Indicator::ALL {
            writeln!(f, "  • {}: {:.2}", indicator.label(), self.average_bias.get(indicator))?;
        }
        for difference in &self.framing_differences {
            writeln!(f, "[{}]", difference.aspect.to_uppercase())?;
            for framing in &difference.framings {
                writeln!(f, "    - {}: {}", framing.source_id, framing.framing)?;
            }
        }
        Ok(())
    }
}

/// A group of articles about the same event, promoted from a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub headline: String,
    pub summary: String,
    pub article_ids: Vec<ArticleId>,
    pub source_ids: Vec<SourceId>,
    pub common_entities: Vec<Entity>,
    pub keywords: Vec<String>,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub coverage_analysis: CoverageAnalysis,
}

impl Story {
    /// `story-<unix millis>-<8 random hex chars>`
    pub fn generate_id(now: DateTime<Utc>) -> StoryId {
        let random = Uuid::new_v4().simple().to_string();
        format!("story-{}-{}", now.timestamp_millis(), &random[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let now = Utc::now();
        let a = Story::generate_id(now);
        let b = Story::generate_id(now);
        assert_ne!(a, b);
        assert!(a.starts_with(&format!("story-{}-", now.timestamp_millis())));
    }

    #[test]
    fn test_verdict_serializes_kebab_case() {
        let json = serde_json::to_string(&CoverageBalance::LeftHeavy).unwrap();
        assert_eq!(json, "\"left-heavy\"");
        assert_eq!(CoverageBalance::RightHeavy.to_string(), "right-heavy");
    }

    #[test]
    fn test_distribution_total() {
        let mut distribution = LeanDistribution::default();
        distribution.add(LeanBucket::Left);
        distribution.add(LeanBucket::Left);
        distribution.add(LeanBucket::Right);
        assert_eq!(distribution.total(), 3);
        assert_eq!(distribution.center, 0);
    }
}
