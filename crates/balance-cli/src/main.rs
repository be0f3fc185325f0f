//! Balance dataset CLI
//!
//! Command-line tool for updating, inspecting, and exporting the per-mode
//! champion balance dataset.

use balance_core::{
    export_to_path, CanonicalDataset, ExportFormat, HttpFetcher, Manifest, Mode, Pipeline,
    PipelineConfig, UpdateOutcome, UpdateSummary,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "balance-cli")]
#[command(about = "Per-mode champion balance dataset", long_about = None)]
#[command(version)]
struct Cli {
    /// Pipeline configuration file (JSON); defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring the dataset up to the latest version from the authoritative source
    Update,

    /// Rebuild the dataset from the table publication at the current version
    CrawlTable,

    /// Merge the newest wiki section onto the dataset
    CrawlWiki,

    /// List the patch sections detected in the wiki article
    Sections,

    /// Show one unit's modifiers
    Show {
        /// Unit id
        #[arg(short, long)]
        unit: u32,

        /// Only this mode (aram, ar, nb, ofa, urf, usb)
        #[arg(short, long)]
        mode: Option<Mode>,
    },

    /// Export the dataset to a file
    Export {
        /// Output format (csv or json)
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a configuration file with the default settings
    InitConfig {
        /// Output path for the configuration file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> balance_core::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Update => cmd_update(&config),
        Commands::CrawlTable => cmd_crawl_table(&config),
        Commands::CrawlWiki => cmd_crawl_wiki(&config),
        Commands::Sections => cmd_sections(&config),
        Commands::Show { unit, mode } => cmd_show(&config, unit, mode),
        Commands::Export { format, output } => cmd_export(&config, format, &output),
        Commands::InitConfig { output } => cmd_init_config(&output),
    }
}

fn cmd_update(config: &PipelineConfig) -> balance_core::Result<()> {
    let fetcher = HttpFetcher::new(config.user_agent.as_str())?;
    let pipeline = Pipeline::new(&fetcher, config);

    match pipeline.update()? {
        UpdateOutcome::UpToDate { current } => {
            println!("Already up to date ({})", current);
        }
        UpdateOutcome::Unchanged { fingerprint } => {
            println!("Table publication unchanged ({})", &fingerprint[..12.min(fingerprint.len())]);
        }
        UpdateOutcome::Updated(summary) => print_summary(&summary, config),
    }

    Ok(())
}

fn cmd_crawl_table(config: &PipelineConfig) -> balance_core::Result<()> {
    let fetcher = HttpFetcher::new(config.user_agent.as_str())?;
    let summary = Pipeline::new(&fetcher, config).crawl_table()?;
    print_summary(&summary, config);
    Ok(())
}

fn cmd_crawl_wiki(config: &PipelineConfig) -> balance_core::Result<()> {
    let fetcher = HttpFetcher::new(config.user_agent.as_str())?;
    let summary = Pipeline::new(&fetcher, config).crawl_wiki_latest()?;
    print_summary(&summary, config);
    Ok(())
}

fn cmd_sections(config: &PipelineConfig) -> balance_core::Result<()> {
    let fetcher = HttpFetcher::new(config.user_agent.as_str())?;
    let sections = Pipeline::new(&fetcher, config).sections()?;

    println!("Sections ({}):", sections.len());
    for section in &sections {
        let delta = balance_core::parse_unit_deltas(section, config.wiki_mode)?;
        println!("  {} ({} units)", section.version, delta.len());
    }

    Ok(())
}

fn cmd_show(config: &PipelineConfig, id: u32, mode: Option<Mode>) -> balance_core::Result<()> {
    let dataset = CanonicalDataset::load(&config.output_path)?;
    let unit = dataset
        .unit(id)
        .ok_or(balance_core::Error::UnitNotFound(id))?;

    println!("{} ({}) - {}", unit.name, unit.id, unit.title);
    if let Some(patch) = &dataset.game_patch {
        println!("Patch: {}", patch);
    }
    println!();

    let modes: Vec<Mode> = match mode {
        Some(m) => vec![m],
        None => unit.stats.keys().copied().collect(),
    };

    if modes.iter().all(|m| unit.mode_stats(*m).is_none()) {
        println!("No modifiers");
        return Ok(());
    }

    for m in modes {
        let Some(block) = unit.mode_stats(m) else {
            continue;
        };
        println!("[{}]", m);
        for (field, value) in block.iter() {
            println!("  {:<16}{}", field.key(), value);
        }
    }

    Ok(())
}

fn cmd_export(config: &PipelineConfig, format: ExportFormat, output: &Path) -> balance_core::Result<()> {
    let dataset = CanonicalDataset::load(&config.output_path)?;
    let units = export_to_path(&dataset, format, output)?;

    println!("Exported {} units to {} ({})", units, output.display(), format);
    Ok(())
}

fn cmd_init_config(output: &Path) -> balance_core::Result<()> {
    PipelineConfig::default().save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}

fn print_summary(summary: &UpdateSummary, config: &PipelineConfig) {
    println!("Updated {} -> {} from {}", summary.from, summary.to, summary.source);
    if !summary.sections.is_empty() {
        println!("  Sections: {}", summary.sections.join(", "));
    }
    println!("  Units: {}", summary.units);
    if !summary.unresolved.is_empty() {
        println!("  Unresolved: {}", summary.unresolved.join(", "));
    }
    println!("  Written to: {}", config.output_path.display());
    if let Ok(manifest) = Manifest::load(&config.manifest_path) {
        if let Some(date) = manifest.date {
            println!("  At: {}", date.to_rfc3339());
        }
    }
}
