//! cinemap application binary - composition root.
//!
//! Ties the cinemap crates together behind one CLI:
//! 1. Load configuration from TOML, apply CLI overrides
//! 2. Open the SQLite movie catalog
//! 3. Build a catalog snapshot (metadata + validated vectors)
//! 4. Dispatch: catalog browsing, similarity search, quadrant analytics,
//!    export, or embedding backfill

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use cinemap_core::config::CinemapConfig;
use cinemap_core::types::{Movie, MovieId};
use cinemap_insight::{AnalyticsEngine, Quadrant, QuadrantAnalysis, QuadrantExporter};
use cinemap_storage::{Database, MovieFilter, MovieRepository};
use cinemap_vector::{
    Catalog, CatalogSnapshot, EmbeddingPipeline, MockEmbedding, SearchEngine, SimilarMovie,
};

use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = CinemapConfig::load_or_default(&config_file);

    // Tracing.
    let log_level = args.resolve_log_level(&config);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting cinemap v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(path = %config_file.display(), "Configuration resolved");

    // Storage.
    let db_path = args.resolve_database_path(&config);
    let db = Arc::new(Database::new(&db_path)?);
    let repo = MovieRepository::new(db);

    let dimension = config.search.embedding_dim;
    let analytics = AnalyticsEngine::from_config(&config.analytics);

    match args.command {
        Command::List {
            year,
            min_rating,
            limit,
            offset,
            json,
        } => {
            let filter = MovieFilter {
                year,
                min_rating,
                ..MovieFilter::default()
            };
            let movies = repo.list(&filter, limit, offset)?;
            print_movies(&movies, json)?;
        }
        Command::Random {
            year_start,
            min_rating,
            limit,
            json,
        } => {
            let filter = MovieFilter {
                year_start,
                min_rating,
                ..MovieFilter::default()
            };
            let movies = repo.random(&filter, limit)?;
            print_movies(&movies, json)?;
        }
        Command::Show { id, json } => {
            let movie = repo
                .find_by_id(MovieId(id))?
                .ok_or_else(|| format!("Movie {} not found", id))?;
            print_movie_details(&movie, json)?;
        }
        Command::Embed => {
            tracing::info!(
                model = %config.search.embedding_model,
                dimension,
                "Using deterministic mock embedding service"
            );
            let pipeline =
                EmbeddingPipeline::new(MockEmbedding::with_dimensions(dimension), dimension)?;
            let report = pipeline.backfill(&repo).await?;
            println!(
                "Embedded {} movies, skipped {}.",
                report.embedded, report.skipped
            );
        }
        Command::Similar { id, limit, json } => {
            let snapshot = load_snapshot(&repo, dimension)?;
            let id = MovieId(id);
            let k = limit.unwrap_or(config.search.default_limit);
            let results = search_engine(&config).similar_to(&snapshot, id, k)?;
            let heading = match snapshot.movie(id) {
                Some(movie) => format!("Movies similar to {}:", movie.title),
                None => format!("Movies similar to #{}:", id),
            };
            print_similar(&heading, &results, json)?;
        }
        Command::Search { text, limit, json } => {
            let snapshot = load_snapshot(&repo, dimension)?;
            let k = limit.unwrap_or(config.search.text_search_limit);
            let results = search_engine(&config)
                .search_text(&snapshot, &text, k)
                .await?;
            print_similar(&format!("Movies matching \"{}\":", text), &results, json)?;
        }
        Command::Analyze { quadrant, json } => {
            let snapshot = load_snapshot(&repo, dimension)?;
            let analysis = analytics.analyze(&snapshot)?;
            print_analysis(&analytics, &analysis, quadrant, json)?;
        }
        Command::Export { output } => {
            let snapshot = load_snapshot(&repo, dimension)?;
            let analysis = analytics.analyze(&snapshot)?;
            let path = output.unwrap_or_else(|| PathBuf::from(&config.export.output_path));
            let rows = QuadrantExporter::new().write(&analysis, &path)?;
            println!("Wrote {} movies to {}", rows, path.display());
        }
        Command::Genres { quadrant, json } => {
            let snapshot = load_snapshot(&repo, dimension)?;
            let analysis = analytics.analyze(&snapshot)?;
            print_genres(&analytics, &analysis, quadrant, json)?;
        }
    }

    Ok(())
}

/// Load the catalog into a fresh snapshot, reporting movies without a
/// usable embedding.
fn load_snapshot(
    repo: &MovieRepository,
    dimension: usize,
) -> Result<Arc<CatalogSnapshot>, Box<dyn std::error::Error>> {
    let catalog = Catalog::new(dimension)?;
    let snapshot = catalog.reload(&repo.load_catalog()?)?;
    let diagnostics = snapshot.store().diagnostics();
    if diagnostics.excluded() > 0 {
        tracing::warn!(
            missing = diagnostics.missing,
            decode_failures = diagnostics.decode_failures,
            wrong_length = diagnostics.wrong_length,
            "Some movies have no usable embedding; run `cinemap embed` to fill missing ones"
        );
    }
    Ok(snapshot)
}

fn search_engine(config: &CinemapConfig) -> SearchEngine {
    SearchEngine::new(
        MockEmbedding::with_dimensions(config.search.embedding_dim),
        config.search.max_limit,
    )
}

fn print_movies(movies: &[Movie], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(movies)?);
        return Ok(());
    }
    if movies.is_empty() {
        println!("No movies match.");
    }
    for movie in movies {
        let year = movie
            .release_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "----".to_string());
        let rating = movie
            .rating
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<6} {}  {:>4}  {}  [{}]",
            movie.id.0,
            year,
            rating,
            movie.title,
            movie.genres.join(", ")
        );
    }
    Ok(())
}

fn print_movie_details(movie: &Movie, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(movie)?);
        return Ok(());
    }
    match movie.release_year {
        Some(year) => println!("{} ({})", movie.title, year),
        None => println!("{}", movie.title),
    }
    println!("  id:      {}", movie.id);
    match movie.rating {
        Some(rating) => println!("  rating:  {:.1}", rating),
        None => println!("  rating:  unrated"),
    }
    if !movie.genres.is_empty() {
        println!("  genres:  {}", movie.genres.join(", "));
    }
    if let Some(ref description) = movie.description {
        println!();
        println!("{}", description);
    }
    Ok(())
}

fn print_similar(
    heading: &str,
    results: &[SimilarMovie],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }
    println!("{}", heading);
    if results.is_empty() {
        println!("  (no matches)");
    }
    for (rank, movie) in results.iter().enumerate() {
        let year = movie
            .release_year
            .map(|y| format!(" ({})", y))
            .unwrap_or_default();
        println!(
            "  {:>2}. {}{}  [{}]  score {:.3}",
            rank + 1,
            movie.title,
            year,
            movie.genres.join(", "),
            movie.score
        );
    }
    Ok(())
}

fn print_analysis(
    analytics: &AnalyticsEngine,
    analysis: &QuadrantAnalysis,
    only: Option<Quadrant>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let reports: Vec<_> = analysis
        .reports
        .iter()
        .filter(|r| only.map_or(true, |q| r.quadrant == q))
        .collect();

    if json {
        match only {
            Some(_) => println!("{}", serde_json::to_string_pretty(&reports)?),
            None => println!("{}", serde_json::to_string_pretty(analysis)?),
        }
        return Ok(());
    }

    println!(
        "{} movies projected (snapshot v{}), {} without a usable embedding.",
        analysis.points.len(),
        analysis.snapshot_version,
        analysis.diagnostics.excluded()
    );
    println!(
        "PC1 explains {:.1}% of variance, PC2 {:.1}%. Medians: PC1 {:.3}, PC2 {:.3}.",
        analysis.explained_variance[0] * 100.0,
        analysis.explained_variance[1] * 100.0,
        analysis.medians.pc1,
        analysis.medians.pc2
    );
    for report in reports {
        println!();
        println!("{}", analytics.summarizer().describe(report));
    }
    Ok(())
}

fn print_genres(
    analytics: &AnalyticsEngine,
    analysis: &QuadrantAnalysis,
    quadrant: Option<Quadrant>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match quadrant {
        Some(q) => {
            let composition = analytics
                .summarizer()
                .genre_composition(&analysis.members(q));
            if json {
                println!("{}", serde_json::to_string_pretty(&composition)?);
            } else {
                println!("Genre breakdown of {} ({}):", q, q.position());
                for share in composition {
                    println!("  {:<20} {:>4}  {:>5.1}%", share.genre, share.count, share.percent);
                }
            }
        }
        None => {
            let genres = analysis.unique_genres();
            if json {
                println!("{}", serde_json::to_string_pretty(&genres)?);
            } else {
                for genre in genres {
                    println!("{}", genre);
                }
            }
        }
    }
    Ok(())
}
