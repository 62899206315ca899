// Command-line entry point for callorder.

use anyhow::{Context, Result};
use callorder::api::dto::ReportDto;
use callorder::application::AnalyzeUsecase;
use callorder::infrastructure::concurrency::init_thread_pool;
use callorder::infrastructure::{AnalysisConfig, DotExporter, JsonProgramSource};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Program dump (JSON) to analyse
    #[arg(short, long)]
    input: PathBuf,

    /// Analysis config (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report output path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Directory for rendered DOT graphs
    #[arg(long)]
    graphs: Option<PathBuf>,

    /// Rayon worker count
    #[arg(long)]
    workers: Option<usize>,

    /// Also resolve calls nested inside call arguments
    #[arg(long)]
    nested: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Json,
    Text,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("callorder=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if cli.workers.is_some() {
        config.workers = cli.workers;
    }
    if cli.nested {
        config.resolve_nested_calls = true;
    }

    if config.parallel {
        init_thread_pool(config.workers)?;
    }

    if let Some(dir) = &cli.graphs {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create graph directory {}", dir.display()))?;
    }

    let source = JsonProgramSource::new(&cli.input);
    let usecase = AnalyzeUsecase {
        source: &source,
        exporter: &DotExporter,
        config: &config,
    };
    let report = usecase.run(cli.graphs.as_deref())?;

    let dto = ReportDto::from(&report);
    let rendered = match cli.format {
        Format::Json => serde_json::to_string_pretty(&dto)?,
        Format::Text => dto.to_string(),
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Cannot write report {}", path.display()))?;
            tracing::info!("Analysis completed! Report written to {}", path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}
