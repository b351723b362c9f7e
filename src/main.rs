use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{debug, info};

use secretaria_chat::config::{Config, Overrides, Settings, ENDPOINT_ENV};
use secretaria_chat::fetcher::{HttpReplyFetcher, ReplyFetcher};
use secretaria_chat::tui::{self, EventHandler};
use secretaria_chat::{handler, logging, ui, App};

#[derive(Parser)]
#[command(name = "secretaria")]
#[command(about = "Chat with the EPS Secretaria Digital answer service from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Answer service URL
    #[arg(long, global = true, env = ENDPOINT_ENV)]
    endpoint: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log file for the interactive screen
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Ignore new messages while a reply is pending
    #[arg(long, global = true)]
    serialize: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat screen (default)
    Chat,
    /// Send one message and print the reply
    Ask {
        /// Message to send
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let settings = Settings::resolve(
        config,
        Overrides {
            endpoint: cli.endpoint.clone(),
            serialize_submissions: cli.serialize,
        },
    );

    match cli.command {
        Some(Commands::Ask { message }) => {
            logging::init_stderr(cli.verbose);
            let fetcher = build_fetcher(&settings)?;
            info!(endpoint = %fetcher.endpoint(), "sending one message");

            let delivered = ask(
                &fetcher,
                &message,
                &mut std::io::stdout().lock(),
                &mut std::io::stderr().lock(),
            )
            .await?;
            Ok(if delivered { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Some(Commands::Chat) | None => {
            let log_path = match cli.log_file {
                Some(path) => path,
                None => logging::default_log_path()?,
            };
            logging::init_file(&log_path, cli.verbose)?;
            run_chat(settings).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_fetcher(settings: &Settings) -> Result<HttpReplyFetcher> {
    match settings.request_timeout {
        Some(timeout) => HttpReplyFetcher::with_timeout(&settings.endpoint, timeout)
            .context("building HTTP client"),
        None => Ok(HttpReplyFetcher::new(&settings.endpoint)),
    }
}

/// Send one message and print the reply to `out`. A failure is reported
/// once on `err` and turns into `Ok(false)`.
async fn ask(
    fetcher: &dyn ReplyFetcher,
    message: &str,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool> {
    if message.trim().is_empty() {
        writeln!(out, "{}", "Nothing to send".yellow())?;
        return Ok(true);
    }

    match fetcher.fetch_reply(message).await {
        Ok(answer) => {
            writeln!(out, "{}", answer)?;
            Ok(true)
        }
        Err(e) => {
            debug!("ask failed: {:?}", e);
            writeln!(err, "{}: {}", "No reply from the answer service".red(), e)?;
            Ok(false)
        }
    }
}

async fn run_chat(settings: Settings) -> Result<()> {
    let fetcher: Arc<dyn ReplyFetcher> = Arc::new(build_fetcher(&settings)?);
    info!(endpoint = %settings.endpoint, "starting chat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(&settings, fetcher, events.sender());

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event),
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    info!(messages = app.conversation.messages().len(), "chat closed");
    result
}
