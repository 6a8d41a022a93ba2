mod commands;
mod inputs;
mod prompt;
mod session;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use chatguard::budget::TokenBudgetGuard;
use chatguard::models::profile::ModelCatalog;
use chatguard::orchestrator::Orchestrator;
use chatguard::providers::base::Credential;
use chatguard::providers::configs::{OpenAiProviderConfig, OPENAI_HOST};
use chatguard::providers::openai::OpenAiProvider;
use chatguard::session::{ChatSession, SessionSettings, DEFAULT_MODEL, DEFAULT_TEMPERATURE};

use crate::prompt::cliclack::CliclackPrompt;
use crate::session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OpenAI API Key (can also be set via OPENAI_API_KEY environment variable)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model to use
    #[arg(short, long, env = "CHATGUARD_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature between 0.0 and 1.0
    #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Completion API host
    #[arg(long, env = "CHATGUARD_HOST", default_value = OPENAI_HOST)]
    host: String,

    /// Give up on a completion after this many seconds (waits forever by default)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// CSV or XLSX file to attach to the first message (repeatable)
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,

    /// Log request handling to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .init();
    }

    let catalog = ModelCatalog::builtin();
    let settings = SessionSettings {
        model: cli.model.clone(),
        temperature: cli.temperature,
    };
    settings.resolve(&catalog)?;

    let mut provider_config = OpenAiProviderConfig::new(cli.host.clone());
    if let Some(secs) = cli.timeout_secs {
        provider_config = provider_config.with_timeout(Duration::from_secs(secs));
    }
    let provider = Arc::new(OpenAiProvider::new(provider_config)?);
    let orchestrator = Orchestrator::new(provider, TokenBudgetGuard::new()?, catalog);

    let chat = ChatSession::new(settings).with_credential(cli.api_key.and_then(Credential::new));
    let pending = inputs::load_attachments(&cli.files)?;
    tracing::debug!(
        session = chat.id(),
        model = %chat.settings.model,
        attachments = pending.len(),
        "starting chat session"
    );

    let mut session = Session::new(
        &orchestrator,
        chat,
        Box::new(CliclackPrompt::new()),
        pending,
    );
    session.start().await
}
