//! contentgate - evaluate content decks and print their publish verdicts
//!
//! ## Commands
//!
//! - `evaluate`: evaluate one content item (JSON file)
//! - `batch`: evaluate a JSON array of items, with the cross-item timing check
//! - `policy`: print the effective evaluation policy as TOML

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contentgate_core::{ContentItem, EvaluationEngine, EvaluationPolicy, FinalVerdict};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "contentgate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parallel content evaluation and publish verdicts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Policy file (TOML). Defaults to the built-in policy.
    #[arg(long, global = true, env = "CONTENTGATE_POLICY")]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single content item
    Evaluate {
        /// Path to the content item (JSON)
        #[arg(short, long)]
        item: PathBuf,
    },

    /// Evaluate several items concurrently
    Batch {
        /// Path to a JSON array of content items
        #[arg(short, long)]
        items: PathBuf,
    },

    /// Print the effective policy as TOML
    Policy,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    contentgate_core::init_tracing(cli.json, level);

    let policy = load_policy(cli.policy.as_deref())?;

    match cli.command {
        Commands::Evaluate { item } => cmd_evaluate(policy, &item).await,
        Commands::Batch { items } => cmd_batch(policy, &items).await,
        Commands::Policy => cmd_policy(&policy),
    }
}

fn load_policy(path: Option<&Path>) -> Result<EvaluationPolicy> {
    match path {
        Some(path) => EvaluationPolicy::load(path)
            .with_context(|| format!("Failed to load policy from {}", path.display())),
        None => Ok(EvaluationPolicy::default()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn cmd_evaluate(policy: EvaluationPolicy, path: &Path) -> Result<()> {
    let item: ContentItem = read_json(path)?;
    let engine = EvaluationEngine::new(policy).context("Invalid evaluation policy")?;
    let result = engine.evaluate(item).await.context("Evaluation failed")?;

    info!(
        content_id = %result.content_id,
        verdict = %result.final_verdict,
        "evaluation complete"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_batch(policy: EvaluationPolicy, path: &Path) -> Result<()> {
    let items: Vec<ContentItem> = read_json(path)?;
    let engine = EvaluationEngine::new(policy).context("Invalid evaluation policy")?;
    let results = engine
        .evaluate_batch(items)
        .await
        .context("Batch evaluation failed")?;

    let count = |v: FinalVerdict| results.iter().filter(|r| r.final_verdict == v).count();
    info!(
        items = results.len(),
        auto_publish = count(FinalVerdict::AutoPublish),
        human_queue = count(FinalVerdict::HumanQueue),
        reject = count(FinalVerdict::Reject),
        "batch complete"
    );
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn cmd_policy(policy: &EvaluationPolicy) -> Result<()> {
    policy.validate().context("Invalid evaluation policy")?;
    let rendered = toml::to_string_pretty(policy).context("Failed to render policy")?;
    print!("{rendered}");
    Ok(())
}
