pub mod bias;
pub mod config;
pub mod error;
pub mod sources;
pub mod story;
pub mod types;

pub use bias::{BiasAnalysis, BiasIndicators, BiasMethod, Evidence, Indicator};
pub use config::{BiasConfig, ClusterConfig, CoverageConfig, EngineConfig, ExtractionConfig, VectorizerConfig};
pub use error::{Error, Result};
pub use sources::{LeanLabel, Source, SourceCategory, SourceLookup, SourceRecord, SourceRegistry};
pub use story::{
    CoverageAnalysis, CoverageBalance, Entity, EntityKind, FramingDifference, LeanBucket, LeanDistribution,
    SourceFraming, Story,
};
pub use types::{Article, ArticleId, ArticleRecord, SkipReason, SkippedArticle, SourceId, StoryId};

pub mod prelude {
    pub use super::{Article, ArticleRecord, BiasAnalysis, BiasIndicators, BiasMethod, EngineConfig, Error, Result};
    pub use super::{Source, SourceLookup, SourceRegistry, Story};
}
