use map_harvest_lib::catalog::{self, BUSINESS_CATEGORIES, CITIES};
use map_harvest_lib::export::{self, CsvLayout};
use map_harvest_lib::leads::{ResultsView, SortDirection, SortKey};
use map_harvest_lib::{lead_import, logger, Config, LeadQuery, LeadService, ScrollCount, SearchRequest};

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use log::{error, info, warn};

const LOCAL_USER: &str = "local";

/// Batch front end: search, export, import and inspect leads without the server.
#[derive(Debug, Parser)]
#[command(name = "map-harvest", version, about)]
struct Cli {
    /// Config file (defaults to MAPHARVEST_CONFIG, then MapHarvest.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User the leads belong to.
    #[arg(long, global = true, default_value = LOCAL_USER)]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a search and save the results.
    Search {
        /// e.g. "Dentist in Mumbai".
        query: String,
        /// Pages to scroll, or "all".
        #[arg(long)]
        scrolls: Option<ScrollCount>,
        /// Repeat to search several localities.
        #[arg(long = "locality")]
        localities: Vec<String>,
        /// Write the results as CSV here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Only show results matching this text.
        #[arg(long)]
        filter: Option<String>,
        /// Sort by a column; repeating the same column flips to descending.
        #[arg(long = "sort")]
        sort: Vec<SortKey>,
        /// Show one page of the results (1-based).
        #[arg(long, requires = "page_size")]
        page: Option<usize>,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Export saved leads as CSV.
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        specialty: Option<String>,
        #[arg(long)]
        search_query: Option<String>,
        /// Text filter over name, address, specialty and phone.
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, default_value = "scraped_at")]
        sort: SortKey,
        #[arg(long, default_value = "desc")]
        direction: SortDirection,
    },
    /// Import leads from a CSV file.
    Import { file: PathBuf },
    /// Print dashboard statistics as JSON.
    Stats,
    /// Show the static catalog tables.
    Catalog {
        #[command(subcommand)]
        table: CatalogTable,
    },
}

#[derive(Debug, Subcommand)]
enum CatalogTable {
    Categories,
    /// Every business type, one per line.
    Types,
    Cities,
    Localities { city: String },
}

fn write_output(out: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn Error>> {
    match out {
        Some(path) => {
            fs::write(path, content)?;
            info!("Wrote {:?}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Command::Catalog { table } = &cli.command {
        match table {
            CatalogTable::Categories => {
                for (category, types) in BUSINESS_CATEGORIES {
                    println!("{}: {}", category, types.join(", "));
                }
            }
            CatalogTable::Types => {
                for business_type in catalog::all_business_types() {
                    println!("{}", business_type);
                }
            }
            CatalogTable::Cities => {
                for city in CITIES {
                    println!("{}", city);
                }
            }
            CatalogTable::Localities { city } => {
                for locality in catalog::localities_for_city(city) {
                    println!("{}", locality);
                }
            }
        }
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let service = LeadService::from_config(&config)?;
    let user = cli.user.as_str();

    match cli.command {
        Command::Search {
            query,
            scrolls,
            localities,
            out,
            filter,
            sort,
            page,
            page_size,
        } => {
            let request = SearchRequest {
                scroll_count: scrolls,
                localities,
                ..SearchRequest::new(query)
            };
            let outcome = service.search(user, &request)?;
            if let Some(persist) = outcome.persist {
                if !persist.wait() {
                    warn!("Search results were not saved");
                }
            }
            let view = ResultsView {
                filter: filter.unwrap_or_default(),
                page: page_size.map(|size| (page.unwrap_or(1), size)),
                ..ResultsView::default()
            }
            .click_columns(&sort);
            let shown = view.apply(&outcome.leads);
            info!("Showing {} of {} results", shown.len(), outcome.leads.len());
            write_output(out.as_ref(), &export::leads_to_csv(&shown, CsvLayout::Results)?)?;
        }
        Command::Export {
            out,
            specialty,
            search_query,
            filter,
            sort,
            direction,
        } => {
            let query = LeadQuery {
                sort,
                direction,
                specialty,
                search_query,
                text: filter,
                ..LeadQuery::default()
            };
            let rows = service.collect_all(user, &query)?;
            let out = out.unwrap_or_else(|| PathBuf::from(export::export_filename(Local::now().date_naive())));
            write_output(Some(&out), &export::leads_to_csv(&rows, CsvLayout::Archive)?)?;
            info!("Exported {} leads", rows.len());
        }
        Command::Import { file } => {
            let fallback = format!("Imported from {}", file.display());
            let leads = lead_import::load_leads(&file, &fallback)?;
            let read = leads.len();
            let inserted = service.save_leads(user, leads)?;
            info!("Imported {} rows, {} new leads", read, inserted);
        }
        Command::Stats => {
            let stats = service.stats(user)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Catalog { .. } => {}
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    logger::init();
    let cli = Cli::parse();
    run(cli).map_err(|e| {
        error!("{}", e);
        e
    })
}
