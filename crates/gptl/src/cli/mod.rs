//! Command-line front end: argument model, path defaults, and the run loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::llm::{ChatOptions, ProviderRegistry};
use crate::store::FileHistoryStore;

mod init;
mod io;

pub use io::{message_from_args, open_input, open_output};

/// Directory under the home directory holding config, history, and templates.
pub const APP_DIR: &str = ".gptl";

/// Chat with OpenAI, Azure OpenAI, or Claude from the command line
#[derive(Parser, Debug)]
#[command(name = "gptl", version, about)]
pub struct Cli {
    /// Config file path [default: ~/.gptl/config.yaml]
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// History directory [default: ~/.gptl/history]
    #[arg(long)]
    pub history_dir: Option<PathBuf>,

    /// Template directory [default: ~/.gptl/templates]
    #[arg(long)]
    pub template_dir: Option<PathBuf>,

    /// Read the message from a file instead of arguments or stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write replies to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// History name (defaults to today's date)
    #[arg(short = 'n', long)]
    pub history: Option<String>,

    /// Seed a new conversation from a template
    #[arg(short, long)]
    pub template: Option<String>,

    /// Create the config file interactively
    #[arg(long)]
    pub init: bool,

    /// List available providers
    #[arg(long)]
    pub providers: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Message words; each is sent on its own line
    pub message: Vec<String>,
}

/// Resolved filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config: PathBuf,
    pub history: PathBuf,
    pub templates: PathBuf,
}

impl Paths {
    /// Explicit flags win; anything else lives under `{home}/.gptl`.
    pub fn resolve(cli: &Cli, home: Option<&Path>) -> Result<Self> {
        let base = || -> Result<PathBuf> {
            home.map(|h| h.join(APP_DIR))
                .context("can't determine home directory; pass paths explicitly")
        };

        Ok(Self {
            config: match &cli.config {
                Some(p) => p.clone(),
                None => base()?.join("config.yaml"),
            },
            history: match &cli.history_dir {
                Some(p) => p.clone(),
                None => base()?.join("history"),
            },
            templates: match &cli.template_dir {
                Some(p) => p.clone(),
                None => base()?.join("templates"),
            },
        })
    }
}

impl Cli {
    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            history: self.history.clone(),
            template: self.template.clone(),
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides `verbose`.
pub fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Execute one invocation.
pub async fn run(cli: Cli) -> Result<()> {
    let home = dirs::home_dir();
    let paths = Paths::resolve(&cli, home.as_deref())?;
    debug!(?paths, "Resolved paths");

    let registry = ProviderRegistry::with_builtin();

    if cli.providers {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    if cli.init {
        return init::run(&paths.config, &registry).await;
    }

    let config = Config::load(&paths.config)
        .await
        .with_context(|| format!("can't load config[{}]", paths.config.display()))?;

    let history = Arc::new(FileHistoryStore::new(&paths.history));
    let session = registry
        .create(config, history)?
        .with_template_root(&paths.templates);

    let mut input = open_input(&cli).await?;
    let mut output = open_output(cli.output.as_deref()).await?;

    session
        .chat(&mut input, &mut output, &cli.chat_options())
        .await?;
    Ok(())
}
