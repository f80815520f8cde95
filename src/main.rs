mod adzuna;
mod analysis;
mod db;
mod error;
mod geocode;
mod location;
mod pipeline;
mod resources;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::adzuna::AdzunaClient;
use crate::geocode::OpenCageClient;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "jobs_pipeline", about = "Job listing ingestion, location cleaning and description analysis")]
struct Cli {
    /// Settings file (TOML); defaults to ./jobs_pipeline.toml when present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the jobs table
    Init,
    /// Fetch search result pages and insert new listings
    Extract {
        /// Number of result pages (default: from settings)
        #[arg(short = 'n', long)]
        pages: Option<u32>,
        /// Only listings posted within this many days
        #[arg(long)]
        max_days_old: Option<u32>,
    },
    /// Fetch the newest page (listings at most one day old)
    Update,
    /// Map raw locations to canonical city names
    Clean,
    /// Attach coordinates to cleaned locations
    Geocode {
        /// Max rows to geocode (default: all cleaned rows)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Word and vocabulary frequencies over job descriptions
    Analyze {
        /// Read descriptions from a JSON array of strings instead of the database
        #[arg(long)]
        from_file: Option<PathBuf>,
        /// Also write the frequency report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of most common words to report
        #[arg(long)]
        top: Option<usize>,
    },
    /// Show row counts
    Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    info!("Database: {:?}", settings.db_path);

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Table 'jobs' ready at {:?}", settings.db_path);
        }
        Commands::Extract { pages, max_days_old } => {
            let client = AdzunaClient::new(&settings)?;
            let pages = pages.unwrap_or(settings.pages);
            let stats = pipeline::run_extraction(&conn, &client, pages, max_days_old)?;
            if stats.fetched == 0 {
                println!("No data to insert.");
            } else {
                println!(
                    "Fetched {} listings from {} pages ({} failed), inserted {} new.",
                    stats.fetched, stats.pages, stats.failed_pages, stats.inserted
                );
            }
        }
        Commands::Update => {
            let client = AdzunaClient::new(&settings)?;
            let stats = pipeline::run_update(&conn, &client)?;
            if stats.fetched == 0 {
                println!("No data to insert.");
            } else {
                println!("Fetched {} recent listings, inserted {} new.", stats.fetched, stats.inserted);
            }
        }
        Commands::Clean => {
            let cities = settings.city_map();
            let stats = pipeline::run_clean_locations(&conn, &cities)?;
            println!(
                "cleaned_location updated: {} rows kept of {} ({} mapped to a city).",
                stats.kept, stats.loaded, stats.mapped
            );
        }
        Commands::Geocode { limit } => {
            let geocoder = OpenCageClient::new(settings.geocoding_api_key()?)?;
            let stats = pipeline::run_coordinates(&conn, &geocoder, &settings, limit)?;
            if stats.looked_up == 0 {
                println!("No cleaned locations. Run 'clean' first.");
            } else {
                println!(
                    "latitude and longitude updated: {} of {} rows in '{}'.",
                    stats.accepted, stats.looked_up, settings.target_country_code
                );
            }
        }
        Commands::Analyze { from_file, output, top } => {
            if let Some(n) = top {
                settings.top_words = n;
            }
            let descriptions = match from_file {
                Some(path) => pipeline::load_descriptions_file(&path)?,
                None => db::fetch_descriptions(&conn)?,
            };
            if descriptions.is_empty() {
                println!("No descriptions to analyze.");
                return Ok(());
            }
            let report = pipeline::run_description_analysis(&conn, &descriptions, &settings)?;
            println!("{}", report.render_markdown());
            if let Some(path) = output {
                pipeline::export_report(&report, &path)?;
                println!("Frequencies written to {:?}", path);
            }
        }
        Commands::Stats => {
            let s = db::get_stats(&conn)?;
            println!("Total:        {}", s.total);
            println!("Country-only: {}", s.generic_location);
            println!("Cleaned:      {}", s.cleaned);
            println!("Geocoded:     {}", s.geocoded);
            println!("Frequencies:  {}", s.frequency_terms);
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}
