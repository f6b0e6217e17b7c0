use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cinesearch_core::config::Config;
use cinesearch_core::types::{Genre, Query, DEFAULT_TOP_K};
use cinesearch_search::SearchOrchestrator;

mod view;

use view::Language;

#[derive(Parser)]
#[command(name = "cinesearch", about = "Semantic movie search over an IMDb embedding index")]
struct Cli {
    /// Output language for labels (en, es)
    #[arg(long, global = true, default_value = "en")]
    lang: Language,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search movies by free-text description
    Search(SearchArgs),
    /// List the genres accepted by --genre
    Genres,
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Free-text description, up to 500 characters
    query: String,

    /// Restrict to one genre (blank for any)
    #[arg(long, default_value = "")]
    genre: String,

    /// Minimum IMDb rating, 1-10 (0 disables)
    #[arg(long, default_value_t = 6.0)]
    min_rating: f64,

    /// Minimum release year, 1930 to the current year (0 disables)
    #[arg(long, default_value_t = 1980)]
    min_year: u32,

    /// Minimum number of user votes, 0-10000
    #[arg(long, default_value_t = 500)]
    min_votes: u32,

    /// Number of results, 1-50
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Print results as JSON instead of cards
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Genres => {
            for genre in Genre::ALL {
                println!("{genre}");
            }
            Ok(())
        }
        Command::Search(args) => search(args, cli.lang).await,
    }
}

async fn search(args: SearchArgs, lang: Language) -> anyhow::Result<()> {
    let genre = Genre::parse_optional(&args.genre)?;
    let query = Query::builder(args.query)
        .genre(genre)
        .min_rating(args.min_rating)
        .min_year(args.min_year)
        .min_votes(args.min_votes)
        .top_k(args.top_k)
        .build()?;

    let config = Config::load().context("loading configuration")?;
    let settings = config.settings()?;
    let orchestrator = SearchOrchestrator::from_settings(&config, &settings)
        .await
        .context("connecting to search services")?;

    let results = orchestrator.search(&query).await?;

    if args.json {
        println!("{}", view::render_json(&results)?);
        return Ok(());
    }

    let labels = lang.labels();
    println!("{}\n{}\n", labels.title, labels.subtitle);
    println!("{}: {}", labels.query, query.text());
    println!(
        "{}: {} | {}: {} | {}: {} | {}: {} | {}: {}",
        labels.genre,
        query.genre().map_or("-", Genre::as_str),
        labels.rating,
        query.min_rating().unwrap_or(0.0),
        labels.year,
        query.min_year().unwrap_or(0),
        labels.votes,
        query.min_votes().unwrap_or(0),
        labels.results_count,
        query.top_k(),
    );
    println!();
    print!("{}", view::render_text(&results, lang, &settings.display.link_prefix));
    Ok(())
}
