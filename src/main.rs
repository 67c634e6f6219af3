use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grammar_pointer::checker::GrammarChecker;
use grammar_pointer::config::Config;
use grammar_pointer::error::CheckError;
use grammar_pointer::export::export_to_dir;
use grammar_pointer::llm::LlmClient;
use grammar_pointer::renderer::OverlapStrategy;

/// Grammar, spelling and punctuation pointers for German text.
#[derive(Debug, Parser)]
#[command(name = "grammar-pointer", version, about)]
struct Cli {
    /// Text file to check (reads stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write the HTML report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also export the pointers as CSV into this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Password or API key
    #[arg(long, env = "GRAMMAR_POINTER_CREDENTIAL", hide_env_values = true)]
    credential: Option<String>,

    /// Configuration file (defaults to grammar-pointer.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How overlapping pointers are resolved
    #[arg(long, value_enum)]
    overlap: Option<OverlapStrategy>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => Config::load_from_default(),
    };
    if let Some(overlap) = cli.overlap {
        config.render.overlap = overlap;
    }

    let client = LlmClient::new(config.clone());
    if !client.is_available() {
        let err = CheckError::NotConfigured("no provider selected".to_string());
        tracing::error!("{}", err);
        eprintln!("{}", err.user_message());
        return Ok(ExitCode::FAILURE);
    }

    let text = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
            buf
        }
    };

    let Some(credential) = config.resolve_credential(cli.credential.as_deref()) else {
        tracing::error!("No credential available");
        eprintln!("Bitte Passwort oder Anthropic API-Schlüssel eingeben, um Grammar Pointer zu verwenden.");
        return Ok(ExitCode::FAILURE);
    };

    tracing::info!("Checking {} characters with {}", text.chars().count(), config.llm.provider);

    let checker = GrammarChecker::new(client, &config);
    let report = match checker.check(&text, &credential).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Check failed: {}", e);
            eprintln!("{}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };

    let html = report.to_html();
    match &cli.output {
        Some(path) => std::fs::write(path, html)
            .with_context(|| format!("Failed to write '{}'", path.display()))?,
        None => print!("{}", html),
    }

    if let Some(dir) = &cli.export_dir {
        let path = export_to_dir(dir, &report.rows)?;
        eprintln!("Ergebnisse gespeichert: {}", path.display());
    }

    tracing::info!("Fertig!");
    Ok(ExitCode::SUCCESS)
}
