use std::collections::BTreeSet;

use nb_core::{
    Article, BiasIndicators, CoverageAnalysis, CoverageBalance, CoverageConfig, FramingDifference, LeanBucket,
    LeanDistribution, SourceFraming, SourceLookup,
};
use tracing::warn;

/// Turns a finished cluster plus source metadata into a coverage verdict.
#[derive(Debug, Clone, Default)]
pub struct CoverageAnalyzer {
    config: CoverageConfig,
}

impl CoverageAnalyzer {
    pub fn new(config: CoverageConfig) -> Self {
        Self { config }
    }

    /// Buckets a canonical lean with the configured cutoffs. Both cutoffs
    /// are exclusive: a lean sitting on a cutoff counts as center.
    pub fn bucket(&self, lean: f64) -> LeanBucket {
        if lean < self.config.left_cutoff {
            LeanBucket::Left
        } else if lean > self.config.right_cutoff {
            LeanBucket::Right
        } else {
            LeanBucket::Center
        }
    }

    pub fn verdict(&self, source_count: usize, distribution: &LeanDistribution) -> CoverageBalance {
        if source_count < self.config.limited_source_floor {
            return CoverageBalance::Limited;
        }
        if self.outweighs(distribution.left, distribution.right) {
            CoverageBalance::LeftHeavy
        } else if self.outweighs(distribution.right, distribution.left) {
            CoverageBalance::RightHeavy
        } else {
            CoverageBalance::Balanced
        }
    }

    /// Against an empty opposite side a ratio is undefined; two or more
    /// articles on one side and none on the other counts as heavy.
    fn outweighs(&self, side: usize, other: usize) -> bool {
        if other == 0 {
            side >= 2
        } else {
            side as f64 > self.config.heavy_ratio * other as f64
        }
    }

    /// `member_bias[i]` is the scored bias of `members[i]`. Members whose
    /// source is not in `sources` are counted as center.
    pub fn analyze(
        &self,
        members: &[&Article],
        sources: &dyn SourceLookup,
        member_bias: &[BiasIndicators],
    ) -> CoverageAnalysis {
        let source_count = members
            .iter()
            .map(|a| a.source_id.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        let mut lean_distribution = LeanDistribution::default();
        for article in members {
            let bucket = match sources.source(&article.source_id) {
                Some(source) => self.bucket(source.lean),
                None => {
                    warn!(
                        "No metadata for source {} (article {}), counting it as center",
                        article.source_id, article.id
                    );
                    LeanBucket::Center
                }
            };
            lean_distribution.add(bucket);
        }

        CoverageAnalysis {
            source_count,
            lean_distribution,
            average_bias: BiasIndicators::mean(member_bias),
            framing_differences: framing_differences(members),
            coverage_balance: self.verdict(source_count, &lean_distribution),
        }
    }
}

/// Side-by-side headlines and opening sentences. Purely structural: nothing
/// here compares meaning.
fn framing_differences(members: &[&Article]) -> Vec<FramingDifference> {
    if members.len() < 2 {
        return Vec::new();
    }

    let mut headlines: Vec<SourceFraming> = members
        .iter()
        .map(|a| SourceFraming {
            source_id: a.source_id.clone(),
            framing: a.title.clone(),
        })
        .collect();
    headlines.sort_by(|a, b| a.source_id.cmp(&b.source_id).then_with(|| a.framing.cmp(&b.framing)));

    let mut differences = vec![FramingDifference {
        aspect: "headline".to_string(),
        framings: headlines,
    }];

    let mut leads: Vec<SourceFraming> = members
        .iter()
        .filter_map(|a| {
            first_sentence(&a.description).map(|lead| SourceFraming {
                source_id: a.source_id.clone(),
                framing: lead.to_string(),
            })
        })
        .collect();
    if leads.len() >= 2 {
        leads.sort_by(|a, b| a.source_id.cmp(&b.source_id).then_with(|| a.framing.cmp(&b.framing)));
        differences.push(FramingDifference {
            aspect: "lead".to_string(),
            framings: leads,
        });
    }
    differences
}

fn first_sentence(text: &str) -> Option<&str> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let end = text
        .char_indices()
        .find(|&(i, c)| {
            matches!(c, '.' | '!' | '?')
                && text[i + c.len_utf8()..].chars().next().map_or(true, char::is_whitespace)
        })
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(text.len());
    Some(text[..end].trim())
}
