//! # Repo Analyzer CLI (`repo-analyzer`)
//!
//! ## Usage
//!
//! ```bash
//! repo-analyzer --config ./config/analyzer.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `repo-analyzer analyze <url>` | Analyze a repository and print the JSON result |
//! | `repo-analyzer analyze <url> --stream` | Analyze while reporting progress on stderr |
//! | `repo-analyzer serve` | Start the HTTP server |

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repo_analyzer::config;
use repo_analyzer::pipeline::Analyzer;
use repo_analyzer::progress::{ChannelSink, PipelineEvent, ProgressMode};
use repo_analyzer::server;

/// Repo Analyzer — summarize a GitHub repository with language models.
#[derive(Parser)]
#[command(
    name = "repo-analyzer",
    about = "Fetch a GitHub repository, summarize each file, and build a project report",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when it does not exist.
    #[arg(long, global = true, default_value = "./config/analyzer.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one repository.
    ///
    /// Without `--stream`, prints `{repo, file_count, project_summary}` as
    /// JSON. With `--stream`, files are summarized one at a time, progress is
    /// reported on stderr, and the report path is printed on stdout.
    Analyze {
        /// Repository URL, e.g. `https://github.com/owner/project`.
        url: String,

        /// Report progress events while running.
        #[arg(long)]
        stream: bool,

        /// Progress format for `--stream` (default: human on a TTY, else JSON).
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Analyze {
            url,
            stream,
            progress,
        } => {
            let analyzer = Arc::new(Analyzer::from_config(&cfg)?);
            if stream {
                let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
                run_streaming(analyzer, url, mode).await?;
            } else {
                let result = analyzer.analyze(&url).await?;
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

async fn run_streaming(analyzer: Arc<Analyzer>, url: String, mode: ProgressMode) -> anyhow::Result<()> {
    let reporter = mode.reporter();
    let (tx, mut rx) = mpsc::channel::<PipelineEvent>(32);

    let task = tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx);
        analyzer.analyze_streaming(&url, &mut sink).await;
    });

    let mut failure = None;
    while let Some(event) = rx.recv().await {
        reporter.report(&event);
        match &event {
            PipelineEvent::ProjectSummaryFile(path) => println!("{}", path),
            PipelineEvent::Error(message) => failure = Some(message.clone()),
            _ => {}
        }
    }
    task.await?;

    if let Some(message) = failure {
        bail!(message);
    }
    Ok(())
}

fn setup_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "repo_analyzer=info",
        1 => "repo_analyzer=debug",
        _ => "repo_analyzer=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
