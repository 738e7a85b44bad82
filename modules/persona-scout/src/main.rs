use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ai_client::Gemini;
use browserless_client::{BrowserlessClient, RenderOptions};
use persona_common::Config;
use persona_scout::commands;
use persona_scout::composer::Composer;
use persona_scout::fetcher::BrowserlessFetcher;
use persona_scout::store::JsonFileStore;

#[derive(Parser)]
#[command(name = "persona", about = "Actor persona extraction from wiki pages")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract one page and print the record as JSON
    Extract {
        url: String,
        /// Model id (defaults to PERSONA_MODEL)
        #[arg(long)]
        model: Option<String>,
    },
    /// Extract every page listed in a JSON array of {"link", "agency"}
    Batch {
        input: PathBuf,
        /// Collection file (defaults to PERSONA_OUTPUT_FILE)
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        model: Option<String>,
        /// Re-extract links that already have a good record
        #[arg(long)]
        force: bool,
    },
    /// Retry failed and nameless entries in the collection
    Reconcile {
        #[arg(long)]
        file: Option<PathBuf>,
        /// Model id (defaults to PERSONA_RETRY_MODEL)
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so `extract` output stays clean JSON.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("persona=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    config.log_redacted();

    let composer = build_composer(&config)?;

    let mut stdout = std::io::stdout();
    match cli.command {
        Command::Extract { url, model } => {
            let model = model.unwrap_or_else(|| config.model.clone());
            commands::extract(&composer, &url, &model, &mut stdout).await?;
        }
        Command::Batch {
            input,
            file,
            model,
            force,
        } => {
            let sources = commands::load_sources(&input)?;
            let store = JsonFileStore::new(file.unwrap_or_else(|| config.output_file.clone()));
            let model = model.unwrap_or_else(|| config.model.clone());
            commands::batch(&composer, &store, &sources, &model, force, &mut stdout).await?;
        }
        Command::Reconcile { file, model } => {
            let store = JsonFileStore::new(file.unwrap_or_else(|| config.output_file.clone()));
            let model = model.unwrap_or_else(|| config.retry_model.clone());
            commands::reconcile(&composer, &store, &model, &mut stdout).await?;
        }
    }

    Ok(())
}

fn build_composer(config: &Config) -> Result<Composer> {
    let gemini = Gemini::new(config.gemini_api_key.clone());

    let client =
        BrowserlessClient::new(&config.browserless_url, config.browserless_token.as_deref())?;
    let options = RenderOptions {
        settle: Duration::from_millis(config.settle_ms),
        ..RenderOptions::default()
    };
    let fetcher = BrowserlessFetcher::new(client, options);

    Ok(Composer::new(
        Arc::new(fetcher),
        Arc::new(gemini),
        config.image_host.clone(),
    ))
}
