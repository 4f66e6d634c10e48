use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nb_core::{ArticleRecord, BiasMethod, EngineConfig, SourceRecord, SourceRegistry};
use nb_engine::{ScoreOptions, ScoreRequest, StoryEngine};
use serde::Deserialize;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about = "Cluster news articles into stories and score text for bias", long_about = None)]
pub struct Cli {
    /// Log per-batch statistics and skipped unions
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Cluster a batch of articles and print the outcome as JSON
    Cluster {
        /// Batch file: {"articles": [...], "sources": [...]}
        #[arg(long)]
        input: PathBuf,
        /// Engine configuration file; missing fields keep their defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Minimum cosine similarity for two articles to be joined
        #[arg(long)]
        threshold: Option<f64>,
        /// Smallest group reported as a story
        #[arg(long)]
        min_size: Option<usize>,
        /// Let one outlet contribute several articles to a story
        #[arg(long)]
        allow_same_source: bool,
        #[arg(long)]
        pretty: bool,
    },
    /// Score a single text for bias and sensationalism
    Score {
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// Read the body from a file instead
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value = "")]
        title: String,
        /// Source id to look up in --sources
        #[arg(long, requires = "sources")]
        source: Option<String>,
        /// JSON list of source records
        #[arg(long)]
        sources: Option<PathBuf>,
        /// static, heuristic or combined (default: from config)
        #[arg(long)]
        method: Option<BiasMethod>,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the analysis as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as JSON
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BatchFile {
    articles: Vec<ArticleRecord>,
    sources: Vec<SourceRecord>,
}

async fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            EngineConfig::from_json_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    Ok(config)
}

async fn load_sources(path: &Path) -> Result<SourceRegistry> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read sources file {}", path.display()))?;
    let records: Vec<SourceRecord> =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse sources file {}", path.display()))?;
    let registry = SourceRegistry::from_records(records).context("Invalid source record")?;
    info!("🗞️ Loaded {} sources", registry.len());
    Ok(registry)
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

async fn cluster(
    input: &Path,
    config: Option<&Path>,
    threshold: Option<f64>,
    min_size: Option<usize>,
    allow_same_source: bool,
    pretty: bool,
) -> Result<()> {
    let mut config = load_config(config).await?;
    if let Some(threshold) = threshold {
        config.clustering.similarity_threshold = threshold;
    }
    if let Some(min_size) = min_size {
        config.clustering.min_cluster_size = min_size;
    }
    if allow_same_source {
        config.clustering.enforce_source_diversity = false;
    }
    config.validate().context("Invalid configuration")?;

    let raw = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read batch file {}", input.display()))?;
    let batch: BatchFile =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse batch file {}", input.display()))?;
    let registry = SourceRegistry::from_records(batch.sources).context("Invalid source record")?;
    info!(
        "📥 Clustering {} articles against {} sources",
        batch.articles.len(),
        registry.len()
    );

    let engine = StoryEngine::new(config);
    let outcome = engine.process_batch(&batch.articles, &registry);
    info!(
        "✅ Found {} stories ({} articles unclustered, {} skipped)",
        outcome.stats.stories, outcome.stats.unclustered, outcome.stats.skipped
    );
    print_json(&outcome, pretty)
}

#[allow(clippy::too_many_arguments)]
async fn score(
    text: Option<String>,
    file: Option<&Path>,
    title: &str,
    source: Option<&str>,
    sources: Option<&Path>,
    method: Option<BiasMethod>,
    config: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config(config).await?;
    config.validate().context("Invalid configuration")?;

    let body = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read text file {}", path.display()))?,
        (None, None) => bail!("Either --text or --file is required"),
    };
    let registry = match sources {
        Some(path) => load_sources(path).await?,
        None => SourceRegistry::new(),
    };

    let engine = StoryEngine::new(config);
    let mut request = ScoreRequest::new(title, &body);
    if let Some(id) = source {
        request = request.with_source(id);
    }
    let options = ScoreOptions {
        method,
        ..ScoreOptions::default()
    };
    let analysis = engine.scorer().score_with(&request, &registry, &options);

    if json {
        print_json(&analysis, true)
    } else {
        println!("{}", analysis);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Cluster {
            input,
            config,
            threshold,
            min_size,
            allow_same_source,
            pretty,
        } => cluster(&input, config.as_deref(), threshold, min_size, allow_same_source, pretty).await,
        Commands::Score {
            text,
            file,
            title,
            source,
            sources,
            method,
            config,
            json,
        } => {
            score(
                text,
                file.as_deref(),
                &title,
                source.as_deref(),
                sources.as_deref(),
                method,
                config.as_deref(),
                json,
            )
            .await
        }
        Commands::Config { config } => {
            let config = load_config(config.as_deref()).await?;
            config.validate().context("Invalid configuration")?;
            print_json(&config, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_score_flags() {
        let cli = Cli::try_parse_from(["nb", "score", "--text", "Hello", "--method", "heuristic"]).unwrap();
        match cli.command {
            Commands::Score { text, method, .. } => {
                assert_eq!(text.as_deref(), Some("Hello"));
                assert_eq!(method, Some(BiasMethod::Heuristic));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["nb", "score"]).is_err());
        assert!(Cli::try_parse_from(["nb", "score", "--text", "a", "--source", "x"]).is_err());
    }

    #[test]
    fn test_batch_file_defaults() {
        let batch: BatchFile = serde_json::from_str(r#"{"articles": [{"url": "https://a.example/1"}]}"#).unwrap();
        assert_eq!(batch.articles.len(), 1);
        assert!(batch.sources.is_empty());
    }
}
