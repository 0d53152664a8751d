use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    AdminConsole, Event, HttpRecordService, PlaceholderActivityFeed, RecordService, ReplySender,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::{events_for, parse_command, ConsoleCommand, HELP};
use config::load_settings;

#[derive(Parser, Debug)]
#[command(about = "Terminal admin console for the patient records service")]
struct Args {
    /// Settings file; missing files are ignored.
    #[arg(long, default_value = "console.toml")]
    config: PathBuf,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    activity_limit: Option<u32>,
    /// Show fixed sample rows instead of querying the activity feed.
    #[arg(long)]
    placeholder_activity: bool,
    /// Log filter, e.g. `debug` or `client_core=trace`. Falls back to RUST_LOG.
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter: {directive}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = load_settings(&args.config)?;
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(limit) = args.activity_limit {
        settings.activity_limit = limit;
    }
    settings.placeholder_activity |= args.placeholder_activity;

    let service: Arc<dyn RecordService> = Arc::new(
        HttpRecordService::with_timeout(&settings.base_url, settings.request_timeout())
            .context("failed to configure record service client")?,
    );
    let mut console = if settings.placeholder_activity {
        AdminConsole::with_activity_feed(
            service,
            Arc::new(PlaceholderActivityFeed),
            settings.activity_limit,
        )
    } else {
        AdminConsole::new(service, settings.activity_limit)
    };
    info!(
        base_url = %settings.base_url,
        placeholder_activity = settings.placeholder_activity,
        "console ready"
    );

    run(&mut console).await
}

enum Outcome {
    Redraw,
    Say(String),
    Quit,
}

/// Reads commands and request replies concurrently so the console stays
/// usable while a request is outstanding.
async fn run(console: &mut AdminConsole) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let (replies_tx, mut replies) = mpsc::unbounded_channel();

    redraw(&mut stdout, console).await?;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match on_line(console, &line, &replies_tx) {
                    Outcome::Redraw => redraw(&mut stdout, console).await?,
                    Outcome::Say(text) => write_out(&mut stdout, &format!("{text}\n> ")).await?,
                    Outcome::Quit => break,
                }
            }
            Some(reply) = replies.recv() => {
                if let Event::Completed { epoch, completion } = &reply {
                    info!(operation = completion.operation().label(), %epoch, "request completed");
                }
                console.handle(reply, &replies_tx);
                redraw(&mut stdout, console).await?;
            }
        }
    }

    if console.state().authenticated() {
        warn!("exiting with an active session");
    }
    Ok(())
}

fn on_line(console: &mut AdminConsole, line: &str, replies: &ReplySender) -> Outcome {
    let command = match parse_command(line) {
        Ok(command) => command,
        Err(usage) => return Outcome::Say(usage),
    };
    match command {
        ConsoleCommand::Quit => return Outcome::Quit,
        ConsoleCommand::Help => return Outcome::Say(HELP.to_string()),
        _ => {}
    }

    let events = match events_for(&command, console.state().active_view()) {
        Ok(events) => events,
        Err(reason) => return Outcome::Say(reason),
    };
    for event in events {
        console.handle(event, replies);
    }
    Outcome::Redraw
}

async fn redraw(stdout: &mut tokio::io::Stdout, console: &AdminConsole) -> Result<()> {
    write_out(stdout, &render::render(console.state())).await?;
    write_out(stdout, "> ").await
}

async fn write_out(stdout: &mut tokio::io::Stdout, text: &str) -> Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
