use clap::Parser;
use derive_more::{Display, Error};
use exn::ResultExt;
use forge_catalog::{PackFilter, PackRef, SearchQuery};
use forge_config::Config;
use forge_library::{Forge, Outcome, PackListing, ResultSet};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Browse and search asset catalogs.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to the platform
    /// config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Browsing module to open. Falls back to the first module by name.
    #[arg(short, long)]
    module: Option<String>,
    /// Only show assets from one pack, as PUBLISHER/NAME.
    #[arg(short, long, value_parser = parse_pack)]
    pack: Option<PackRef>,
    /// Page of results to show.
    #[arg(long, default_value = "1")]
    page: NonZeroUsize,
    /// Search term.
    term: Vec<String>,
}

#[derive(Debug, Display, Error)]
enum CliError {
    #[display("could not load configuration")]
    Config,
    #[display("could not set up storage backends")]
    Setup,
}

fn parse_pack(s: &str) -> Result<PackRef, String> {
    s.parse().map_err(|_| format!("expected PUBLISHER/NAME, got `{s}`"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?cli, "Parsed arguments");

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<ExitCode, exn::Exn<CliError>> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| CliError::Config)?;
    let mut forge = Forge::from_config(&config).await.or_raise(|| CliError::Setup)?;

    let opened = forge.open(cli.module.as_deref()).await;
    let query = SearchQuery::new(cli.term.join(" "), PackFilter::from(cli.pack));
    let outcome = match query.has_term() || query.pack != PackFilter::All {
        true => forge.search(&query).await,
        false => opened,
    };

    if let Some(module) = forge.active_module() {
        println!("{} ({})", module.name, module.kind);
    }
    if let Some(listing) = forge.packs().await {
        print_packs(&listing);
    }

    tracing::debug!(cache = ?forge.cache().stats(), "Catalog cache");

    match outcome {
        Outcome::Results(results) => {
            print_page(&results, cli.page);
            Ok(ExitCode::SUCCESS)
        },
        Outcome::Empty => {
            println!("No assets match your search.");
            Ok(ExitCode::SUCCESS)
        },
        Outcome::QueryRequired => {
            println!("These packs can only be searched. Enter a search term to see results.");
            Ok(ExitCode::SUCCESS)
        },
        Outcome::NoActiveModule | Outcome::NoModulesRegistered => {
            eprintln!("No browsing modules are configured.");
            Ok(ExitCode::FAILURE)
        },
    }
}

fn print_packs(listing: &PackListing) {
    for pack in &listing.packs {
        match pack.special {
            true => println!("  {}/{} (search only)", pack.publisher, pack.name),
            false => println!("  {}/{} ({})", pack.publisher, pack.name, pack.count),
        }
    }
    println!("{} assets", listing.count);
}

/// Reveal pages up to the requested one, then print it.
fn print_page(results: &ResultSet, page: NonZeroUsize) {
    let mut window = results.first_page();
    let mut offset = 0;
    for _ in 1..page.get() {
        let Some(next) = results.reveal_more() else {
            println!("Only {} results; page {page} is empty.", results.len());
            return;
        };
        offset = next.offset();
        window = results.page(offset);
    }
    for asset in window {
        let card = asset.describe();
        match (card.thumbnail, card.badge) {
            (Some(thumbnail), _) => println!("{}  [{thumbnail}]", card.label),
            (None, Some(badge)) => println!("{}  ({badge})", card.label),
            (None, None) => println!("{}", card.label),
        }
    }
    println!("Showing {}-{} of {}", offset + 1, offset + window.len(), results.len());
    if !results.is_exhausted() {
        println!("More results: --page {}", page.get() + 1);
    }
}
