//! `tnorm`: command-line front end for temporal-normalizer.
//!
//! Results are printed to stdout as JSON; logs go to stderr (`RUST_LOG`).

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use temporal_normalizer::{
    canonicalize, decode_candidates, expand, load_settings, zone, DucklingGateway, Grain,
    KeyRegistry, KeywordClassifier, Normalizer, Settings, TemporalPipeline, TimeParser,
};

#[derive(Parser)]
#[command(name = "tnorm", version, about = "Normalize Vietnamese time expressions")]
struct Cli {
    /// Settings file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the time service endpoint
    #[arg(long, global = true)]
    duckling_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical form of TEXT
    Canonicalize { text: String },
    /// Expand an ISO instant to the period of GRAIN
    Expand {
        instant: String,
        grain: String,
        /// End at the first instant of the next period
        #[arg(long)]
        exclusive: bool,
    },
    /// Resolve the time expression in TEXT
    Normalize {
        text: String,
        /// Reference instant (RFC 3339); defaults to now
        #[arg(long)]
        reftime: Option<String>,
        /// Read the service response from FILE (`-` for stdin) instead of the network
        #[arg(long)]
        candidates: Option<PathBuf>,
    },
    /// Match TEXT against NAME=KEY keywords and resolve its time expression
    Predict {
        text: String,
        /// Keyword entry, repeatable
        #[arg(long = "key", value_name = "NAME=KEY")]
        keys: Vec<String>,
        /// Keyword entry whose key also resolves a time expression, repeatable;
        /// matched after the `--key` entries
        #[arg(long = "time-key", value_name = "NAME=KEY")]
        time_keys: Vec<String>,
        #[arg(long)]
        reftime: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = settings_for(&cli)?;

    match cli.command {
        Command::Canonicalize { text } => {
            println!("{}", canonicalize(&text));
        }
        Command::Expand {
            instant,
            grain,
            exclusive,
        } => {
            let normalizer = Normalizer::from_settings(&settings.normalizer)?;
            let grain: Grain = grain.parse().map_err(anyhow::Error::msg)?;
            let local = zone::to_local(&instant, &normalizer.options().offset)
                .with_context(|| format!("cannot read instant '{}'", instant))?;
            let (start, end) = expand(local, grain, !exclusive);
            print_json(&serde_json::json!({
                "start": zone::format_iso(&start),
                "end": zone::format_iso(&end),
            }))?;
        }
        Command::Normalize {
            text,
            reftime,
            candidates,
        } => {
            let normalizer = Normalizer::from_settings(&settings.normalizer)?;
            let reference = reference_time(&normalizer, reftime.as_deref())?;
            let candidates = match candidates {
                Some(path) => read_candidates(&path)?,
                None => {
                    let gateway = DucklingGateway::new(settings.duckling.clone())?;
                    gateway.parse(&text, reference).candidates
                }
            };
            print_json(&normalizer.normalize(&candidates, &text, reference))?;
        }
        Command::Predict {
            text,
            keys,
            time_keys,
            reftime,
        } => {
            let registry = KeyRegistry::new();
            for pair in &keys {
                let (name, key) = split_key("--key", pair)?;
                registry.push(name, key)?;
            }
            for pair in &time_keys {
                let (name, key) = split_key("--time-key", pair)?;
                registry.push_temporal(name, key)?;
            }
            let pipeline =
                TemporalPipeline::from_settings(KeywordClassifier::new(registry), &settings)?;
            let reference = reference_time(pipeline.normalizer(), reftime.as_deref())?;
            print_json(&pipeline.respond(&text, reference))?;
        }
    }
    Ok(())
}

fn split_key<'a>(flag: &str, pair: &'a str) -> Result<(&'a str, &'a str)> {
    match pair.split_once('=') {
        Some(parts) => Ok(parts),
        None => bail!("{} expects NAME=KEY, got '{}'", flag, pair),
    }
}

fn settings_for(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(url) = &cli.duckling_url {
        settings.duckling.url = url.clone();
        settings.validate()?;
    }
    tracing::debug!(url = %settings.duckling.url, timezone = %settings.normalizer.timezone, "settings loaded");
    Ok(settings)
}

fn reference_time(normalizer: &Normalizer, reftime: Option<&str>) -> Result<DateTime<FixedOffset>> {
    match reftime {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("--reftime must be RFC 3339, got '{}'", s)),
        None => Ok(normalizer.now()),
    }
}

fn read_candidates(path: &Path) -> Result<Vec<temporal_normalizer::RawCandidate>> {
    let body = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read candidates from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    decode_candidates(&body).context("candidates must be a JSON array")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
