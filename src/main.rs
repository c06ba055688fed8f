mod aggregate;
mod config;
mod error;
mod parser;
mod pipeline;
mod record;
mod render;
mod source;

use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::{ListingKind, Settings};
use crate::parser::Highlighter;
use crate::pipeline::Pipeline;
use crate::render::{render, OutputFormat};
use crate::source::HttpSource;

#[derive(Parser)]
#[command(name = "publist", about = "Year-grouped publication list from a My NCBI bibliography")]
struct Cli {
    /// Settings file (default: ./publist.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One `|`-separated line per publication
    EmitDelimited(ListingArgs),
    /// HTML publication list grouped by year
    EmitDocument(ListingArgs),
}

#[derive(Args)]
struct ListingArgs {
    /// My NCBI collection number, or author id with --author (e.g. alexej.abyzov)
    #[arg(long)]
    id: String,
    /// Newline-delimited lab member names to highlight in author lists
    #[arg(short, long)]
    members: Option<PathBuf>,
    /// Treat --id as a public author bibliography (e.g. jane.doe) instead of a collection
    #[arg(long)]
    author: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let (format, args) = match cli.command {
        Commands::EmitDelimited(args) => (OutputFormat::Delimited, args),
        Commands::EmitDocument(args) => (OutputFormat::Document, args),
    };

    let highlighter = match &args.members {
        Some(path) => Highlighter::load(path)?,
        None => Highlighter::default(),
    };
    let kind = if args.author {
        ListingKind::Author
    } else {
        ListingKind::Collection
    };
    let start = settings.start_url(kind, &args.id);
    let pipeline = Pipeline::new(&settings, kind, highlighter)?;

    let (mut listing, mut secondary) = HttpSource::open_pair(&settings.http)?;
    let aggregation = pipeline.run(&mut listing, &mut secondary, &start).await?;

    let timestamp = Local::now().fixed_offset();
    print!("{}", render(format, &aggregation, &timestamp));

    info!(
        "Done: {} records across {} years in {:.1}s",
        aggregation.total(),
        aggregation.years.len(),
        t0.elapsed().as_secs_f64()
    );
    Ok(())
}
