use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use textlens::{process_model_response, report, Relay, RelayConfig};

#[derive(Parser)]
#[command(
    name = "textlens",
    about = "Readability metrics for model-assisted text analysis",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print word, sentence and syllable counts with readability scores
    Stats {
        /// File paths to analyze (reads stdin if none provided)
        files: Vec<PathBuf>,
    },
    /// Fill in missing readability metrics in a model reply
    Normalize {
        /// Prompt the reply answers; its `Text:` section is the fallback source text
        #[arg(long, conflicts_with = "prompt_file")]
        prompt: Option<String>,
        /// Read the prompt from a file instead
        #[arg(long)]
        prompt_file: Option<PathBuf>,
        /// Model reply to normalize (reads stdin if omitted)
        file: Option<PathBuf>,
    },
    /// Forward one request to the model and print the normalized reply
    Relay(RelayArgs),
}

#[derive(Args)]
struct RelayArgs {
    /// Generate endpoint URL (default from TEXTLENS_UPSTREAM_URL)
    #[arg(long)]
    upstream_url: Option<String>,
    /// Model used when the request names none (default from TEXTLENS_MODEL)
    #[arg(long)]
    model: Option<String>,
    /// Total request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    request_timeout: Option<u64>,
    /// Connect timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    connect_timeout: Option<u64>,
    /// Do not log relayed requests
    #[arg(long)]
    no_log_requests: bool,
    /// Request JSON (reads stdin if omitted)
    file: Option<PathBuf>,
}

impl RelayArgs {
    fn config(&self) -> anyhow::Result<RelayConfig> {
        let mut cfg = RelayConfig::from_env()?;
        if let Some(url) = &self.upstream_url {
            cfg.upstream_url = url.clone();
        }
        if let Some(model) = &self.model {
            cfg.default_model = model.clone();
        }
        if let Some(secs) = self.request_timeout {
            cfg.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.connect_timeout {
            cfg.connect_timeout = Duration::from_secs(secs);
        }
        if self.no_log_requests {
            cfg.log_requests = false;
        }
        Ok(cfg)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Error reading {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Stats { files } => {
            if files.is_empty() {
                let input = read_input(None)?;
                print_json(&report(&input))?;
            } else {
                for path in &files {
                    let text = read_input(Some(path.as_path()))?;
                    print_json(&report(&text))?;
                }
            }
        }
        Command::Normalize {
            prompt,
            prompt_file,
            file,
        } => {
            let prompt = match (prompt, prompt_file) {
                (Some(prompt), _) => prompt,
                (None, Some(path)) => read_input(Some(path.as_path()))?,
                (None, None) => String::new(),
            };
            let reply = read_input(file.as_deref())?;
            println!("{}", process_model_response(&reply, &prompt));
        }
        Command::Relay(args) => {
            let relay = Relay::from_config(args.config()?)?;
            let input = read_input(args.file.as_deref())?;
            let reply = relay.handle(&input);
            println!("{}", reply.body);
            if !reply.is_success() {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
