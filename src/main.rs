// SPDX-License-Identifier: MIT

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;

use factcheck_rs::checker::config::{CheckerConfig, ConfigLoader};
use factcheck_rs::checker::llm::{chat_model, StatementExtractor};
use factcheck_rs::checker::{run_fact_check, server, Engine};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fact-check a single statement and print the verdict
    Check {
        /// The statement to check
        #[arg(short, long)]
        statement: String,

        /// Path to a YAML config file (defaults to ./factcheck.yaml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Extract checkable statements from an article
    Extract {
        /// Path to the article text
        #[arg(short, long)]
        file: PathBuf,

        /// Path to a YAML config file (defaults to ./factcheck.yaml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Start the HTTP API
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to a YAML config file (defaults to ./factcheck.yaml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<CheckerConfig> {
    ConfigLoader::new()
        .load(path.map(PathBuf::as_path))
        .context("failed to load configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Check { statement, config } => {
            let config = load_config(config.as_ref())?;
            let engine = Engine::from_config(&config)?;

            let verdict = run_fact_check(&engine, &statement).await?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
        }
        Commands::Extract { file, config } => {
            let config = load_config(config.as_ref())?;
            let article = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;

            let extractor =
                StatementExtractor::new(chat_model(&config.model)?, config.model.temperature);
            for statement in extractor.extract(&article).await? {
                println!("{}", statement);
            }
        }
        Commands::Serve { port, config } => {
            let config = load_config(config.as_ref())?;
            let engine = Arc::new(Engine::from_config(&config)?);
            let extractor = Arc::new(StatementExtractor::new(
                chat_model(&config.model)?,
                config.model.temperature,
            ));

            server::serve(engine, extractor, port.unwrap_or(config.server.port)).await?;
        }
    }

    Ok(())
}
