use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;
use mm_common::db::{PgMatchStore, create_pool_from_url_checked, run_migrations};
use mm_common::logging::init_tracing_subscriber;
use mm_common::matching::{MatchingConfig, MentorMatcher};
use mm_common::scoring::{ChatCompletionScorer, LlmRuntimeConfig};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(
    name = "mm-match",
    about = "Score and store mentor matches for one startup idea"
)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    db_url: String,

    /// Idea to match mentors for
    #[arg(long)]
    idea_id: Uuid,

    /// Rank candidates and print them without writing mentor_matches rows
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Apply embedded schema migrations before matching
    #[arg(long, default_value_t = false)]
    run_migrations: bool,
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));

    let args = Cli::parse();
    let pool = create_pool_from_url_checked(&args.db_url).await?;
    if args.run_migrations {
        run_migrations(&pool).await?;
    }

    let llm_config = LlmRuntimeConfig::from_env();
    if !llm_config.has_api_key() {
        warn!(provider = %llm_config.provider, "no text-generation API key configured");
    }
    info!(
        idea_id = %args.idea_id,
        dry_run = args.dry_run,
        llm_provider = %llm_config.provider,
        llm_model = %llm_config.model,
        "starting mentor match run"
    );

    let matcher = MentorMatcher::new(
        Arc::new(PgMatchStore::new(pool)),
        Arc::new(ChatCompletionScorer::new(llm_config)?),
        MatchingConfig::from_env(),
    );

    let output = if args.dry_run {
        serde_json::to_string_pretty(&matcher.rank(args.idea_id).await?)?
    } else {
        serde_json::to_string_pretty(&matcher.score_matches(args.idea_id).await?)?
    };
    println!("{output}");

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("mm-match failed: {err}");
        std::process::exit(1);
    }
}
