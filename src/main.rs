//! Resumo CLI - didactic text summarisation service
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use resumo::agent::GeminiAgent;
use resumo::summary::{EducationLevel, Language};
use resumo::{api, logger, Config, Storage, SummaryOptions, SummaryProcessor, SummaryService};
use tracing::info;

#[derive(Parser)]
#[command(name = "resumo")]
#[command(author, version, about = "Simplified summaries of didactic texts", long_about = None)]
struct Cli {
    /// Path to a config file (defaults to resumo.toml in cwd or ~/.config/resumo)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Summarise a text once and store the result
    Summarise {
        /// Text to summarise
        #[arg(required_unless_present = "file")]
        text: Option<String>,
        /// Read the text from a file instead
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = LanguageArg::PtBr)]
        language: LanguageArg,
        #[arg(long, value_enum, default_value_t = LevelArg::Medio)]
        level: LevelArg,
    },
    /// List stored summaries, newest first
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LanguageArg {
    #[value(name = "pt-BR")]
    PtBr,
    #[value(name = "en-US")]
    EnUs,
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    Fundamental,
    Medio,
    Superior,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::PtBr => Language::PtBr,
            LanguageArg::EnUs => Language::EnUs,
        }
    }
}

impl From<LevelArg> for EducationLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Fundamental => EducationLevel::Fundamental,
            LevelArg::Medio => EducationLevel::Medio,
            LevelArg::Superior => EducationLevel::Superior,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    logger::init_logger(&config.log).map_err(anyhow::Error::msg)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config).await?,
        Commands::Summarise {
            text,
            file,
            language,
            level,
        } => {
            let text = match (text, file) {
                (_, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (Some(text), None) => text,
                (None, None) => anyhow::bail!("no text given"),
            };
            let options = SummaryOptions {
                language: language.into(),
                education_level: level.into(),
                ..SummaryOptions::default()
            };

            let service = build_service(&config)?;
            println!("Summarising {} characters...\n", text.chars().count());
            let result = service.handle_request(&text, &options).await?;

            println!("{}", "📝 Summary:".bold());
            println!("  {}\n", result.summary);
            if let Some(meta) = result.metadata {
                println!(
                    "{}",
                    format!(
                        "⏱  {:.2}s · {} → {} characters · ratio {:.2}",
                        meta.elapsed_seconds,
                        meta.original_length,
                        meta.summary_length,
                        meta.compression_ratio
                    )
                    .dimmed()
                );
            }
        }
        Commands::History { limit, offset } => {
            let storage = Storage::open(&config.storage.path)?;
            let records = storage.list(limit, offset)?;

            if records.is_empty() {
                println!("No stored summaries found.");
            } else {
                println!("Stored summaries ({}):\n", storage.count());
                for record in records {
                    println!(
                        "📄 #{} ({})",
                        record.id.to_string().bold(),
                        record.created_at.format("%Y-%m-%d %H:%M")
                    );
                    println!("   {}\n", record.summary);
                }
            }
        }
    }

    Ok(())
}

fn build_service(config: &Config) -> anyhow::Result<SummaryService> {
    let agent = GeminiAgent::from_config(config)?;
    let processor = SummaryProcessor::new(Arc::new(agent), config.request_timeout());
    let storage = Storage::open(&config.storage.path)
        .with_context(|| format!("failed to open storage at {}", config.storage.path.display()))?;
    Ok(SummaryService::new(processor, storage))
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let service = build_service(config)?;
    let app = api::router(Arc::new(service), &config.server.cors_origins);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(provider = %config.agent.provider, "Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
