//! ccweb - converts Claude CLI chat streams and history into display messages.

use anyhow::{Context, Result};
use ccweb_cli::logging::{self, LogConfig, LogFormat};
use ccweb_cli::observer::CliObserver;
use ccweb_cli::output::change_record;
use ccweb_core::{HistoryConverter, ProcessorConfig, StreamingSession};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;

#[derive(Parser, Debug)]
#[command(name = "ccweb")]
#[command(about = "Convert Claude CLI chat streams and history into display messages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (INFO level for all targets)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable trace logging
    #[arg(long, global = true)]
    trace: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "stream=debug").
    /// Targets are prefixed with "ccweb::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL", global = true)]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a newline-delimited frame stream, printing each transcript change
    Stream {
        /// Input file, or "-" for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Convert a JSONL conversation file into one message list
    History {
        file: PathBuf,

        /// Order events by timestamp before converting
        #[arg(long)]
        sort: bool,

        /// Fail on malformed lines instead of skipping them
        #[arg(long)]
        strict: bool,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let config = match &cli.config {
        Some(path) => ProcessorConfig::load_from(path)?,
        None => ProcessorConfig::load()?,
    };
    tracing::info!(
        target: "ccweb::startup",
        "Loaded configuration (unmatched results: {:?})",
        config.unmatched_tool_results
    );

    match cli.command {
        Command::Stream { input } => run_stream(&input, config).await,
        Command::History {
            file,
            sort,
            strict,
            pretty,
        } => run_history(&file, sort, strict, pretty, config),
    }
}

async fn run_stream(input: &str, config: ProcessorConfig) -> Result<()> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = if input == "-" {
        Box::new(tokio::io::stdin())
    } else {
        let file = tokio::fs::File::open(input)
            .await
            .with_context(|| format!("Failed to open {}", input))?;
        Box::new(file)
    };
    // LinesStream strips the newline the frame decoder splits on
    let chunks = LinesStream::new(BufReader::new(reader).lines()).map(|line| {
        line.map(|mut line| {
            line.push('\n');
            line
        })
    });

    let observer = CliObserver::new(config.show_init_messages);
    let mut session = StreamingSession::with_config(config, observer);
    let mut stdout = std::io::stdout().lock();
    let mut write_error = None;

    session
        .run(chunks, |change, message| {
            if write_error.is_some() {
                return;
            }
            if let Err(e) = writeln!(stdout, "{}", change_record(change, message)) {
                write_error = Some(e);
            }
        })
        .await?;

    if let Some(e) = write_error {
        return Err(e).context("Failed to write to stdout");
    }

    let observer = session.observer();
    tracing::info!(
        target: "ccweb::startup",
        "Stream finished ({:?}, {} messages, {} permission denials, session {})",
        session.state(),
        session.messages().len(),
        observer.denials().len(),
        observer.session_id().unwrap_or("unknown")
    );
    Ok(())
}

fn run_history(
    file: &Path,
    sort: bool,
    strict: bool,
    pretty: bool,
    config: ProcessorConfig,
) -> Result<()> {
    let history = HistoryConverter::with_config(config)
        .sort_by_timestamp(sort)
        .strict(strict)
        .load_conversation(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    let mut stdout = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, &history)?;
    } else {
        serde_json::to_writer(&mut stdout, &history)?;
    }
    writeln!(stdout)?;
    Ok(())
}
