use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use catalog::{CatalogIndex, CatalogStore};
use server::app::{build_service, init_default_tracing};
use server::{SelectionError, SelectionService, ServiceArgs};
use sources::CandidateSource;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::warn;
use worker_client::WorkerState;

/// Painting selection from the command line
#[derive(Parser)]
#[command(name = "painting-recs")]
#[command(about = "Pick paintings to show, with or without the recommendation worker", long_about = None)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    /// Seconds to wait for the worker to become ready before starting
    #[arg(long, global = true, default_value = "30")]
    wait_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select the next paintings for a user, marking each as viewed
    Next {
        /// User id
        #[arg(long, default_value = "cli-user")]
        user_id: String,

        /// Liked painting ids (comma separated)
        #[arg(long, value_delimiter = ',')]
        liked: Vec<String>,

        /// Number of paintings to select in a row
        #[arg(long, default_value = "1")]
        count: usize,
    },

    /// Search the catalog by title or artist
    Search {
        /// Case-insensitive substring of the title or artist
        #[arg(long)]
        query: String,

        /// Maximum number of results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show worker state and statistics
    Stats,

    /// Recommend artists from weighted liked artists
    Artists {
        /// Artist names (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        artists: Vec<String>,

        /// Like counts, one per artist (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        counts: Vec<u32>,
    },

    /// Run concurrent selections and report latency per path
    Benchmark {
        /// Number of selections to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Maximum selections in flight
        #[arg(long, default_value = "10")]
        concurrent: usize,

        /// Number of distinct simulated users
        #[arg(long, default_value = "20")]
        users: usize,

        /// Liked painting ids shared by all simulated users
        #[arg(long, value_delimiter = ',')]
        liked: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_default_tracing();
    let cli = Cli::parse();

    if let Commands::Search { query, limit } = &cli.command {
        return handle_search(&cli.service, query, *limit);
    }

    println!("Loading catalog from {}...", cli.service.catalog.display());
    let start = Instant::now();
    let service = build_service(&cli.service).await?;
    println!("{} Service ready in {:?}", "✓".green(), start.elapsed());
    wait_for_worker(&service, Duration::from_secs(cli.wait_secs)).await;

    let result = match cli.command {
        Commands::Next { user_id, liked, count } => handle_next(&service, &user_id, liked, count).await,
        Commands::Stats => handle_stats(&service).await,
        Commands::Artists { artists, counts } => handle_artists(&service, artists, counts).await,
        Commands::Benchmark {
            requests,
            concurrent,
            users,
            liked,
        } => handle_benchmark(&service, requests, concurrent, users, liked).await,
        Commands::Search { .. } => Ok(()),
    };

    service.shutdown().await;
    result
}

async fn wait_for_worker(service: &SelectionService, wait: Duration) {
    let Some(channel) = service.channel() else {
        return;
    };
    println!("Waiting up to {:?} for the recommendation worker...", wait);
    if channel.wait_for_state(WorkerState::Ready, wait).await {
        println!("{} Worker ready", "✓".green());
    } else {
        warn!("Worker not ready (state: {}), selections will use the random path", channel.state());
    }
}

/// Handle the 'next' command
async fn handle_next(service: &SelectionService, user_id: &str, liked: Vec<String>, count: usize) -> Result<()> {
    println!("{}", format!("Next paintings for {}:", user_id).bold().blue());
    for rank in 1..=count {
        match service.select_for(user_id, liked.clone(), Vec::new()).await {
            Ok(selected) => {
                let artwork = &selected.artwork;
                println!(
                    "{}. {} by {} ({}) [{}]{}",
                    rank.to_string().green(),
                    artwork.title,
                    artwork.artist,
                    artwork.year.map(|y| y.to_string()).unwrap_or_else(|| "????".to_string()),
                    source_label(selected.source),
                    selected.score.map(|s| format!(" - Score: {:.3}", s)).unwrap_or_default()
                );
                if let Some(url) = artwork.primary_image() {
                    println!("   {}", url.dimmed());
                }
                service.mark_viewed(user_id, &artwork.id).await;
            }
            Err(SelectionError::CatalogExhausted) => {
                println!("{}", "No more paintings to show for this user".yellow());
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(args: &ServiceArgs, query: &str, limit: usize) -> Result<()> {
    let index = CatalogIndex::load_from_file(&args.catalog)
        .with_context(|| format!("Failed to load catalog from {}", args.catalog.display()))?;

    let matches = index.search(query);
    println!(
        "{}",
        format!("Search results for '{}' ({} matches):", query, matches.len()).bold().blue()
    );
    for artwork in matches.iter().take(limit) {
        let details: Vec<&str> = [artwork.style.as_deref(), artwork.genre.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        println!(
            "{}: {} by {} [{}]",
            artwork.id.cyan(),
            artwork.title,
            artwork.artist,
            details.join(", ")
        );
    }
    Ok(())
}

/// Handle the 'stats' command
async fn handle_stats(service: &SelectionService) -> Result<()> {
    let catalog_size = service.catalog().count().await?;
    println!("{}", "Service status:".bold().blue());
    println!("{}Catalog: {} paintings", "• ".green(), catalog_size);
    println!("{}Viewed store: {}", "• ".green(), service.tracker().backend());

    let status = service.worker_status().await;
    match status.state {
        Some(state) => println!("{}Worker state: {}", "• ".green(), state),
        None => println!("{}Worker: disabled", "• ".green()),
    }
    if let Some(stats) = status.worker {
        for (key, value) in stats {
            println!("  - {}: {}", key, value);
        }
    }
    Ok(())
}

/// Handle the 'artists' command
async fn handle_artists(service: &SelectionService, artists: Vec<String>, counts: Vec<u32>) -> Result<()> {
    if artists.len() != counts.len() {
        return Err(anyhow!(
            "Got {} artists but {} counts",
            artists.len(),
            counts.len()
        ));
    }

    let reply = service
        .recommend_artists(artists, counts)
        .await
        .context("Artist recommendation failed")?;

    println!("{}", "Recommended artists:".bold().blue());
    for (i, candidate) in reply.recommendations.iter().enumerate() {
        println!("{}. {}", (i + 1).to_string().green(), candidate.key);
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    service: &SelectionService,
    requests: usize,
    concurrent: usize,
    users: usize,
    liked: Vec<String>,
) -> Result<()> {
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let users = users.max(1);
    let started = Instant::now();

    let mut handles = Vec::with_capacity(requests);
    for _ in 0..requests {
        let service = service.clone();
        let permits = permits.clone();
        let liked = liked.clone();
        let user_id = format!("bench-user-{}", rand::random_range(0..users));

        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            let outcome = service.select_for(&user_id, liked, Vec::new()).await;
            if let Ok(selected) = &outcome {
                service.mark_viewed(&user_id, &selected.artwork.id).await;
            }
            Ok::<_, anyhow::Error>((start.elapsed(), outcome.map(|s| s.source)))
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    let (mut recommended, mut random, mut exhausted, mut failed) = (0usize, 0usize, 0usize, 0usize);
    for handle in handles {
        let (elapsed, outcome) = handle.await??;
        timings.push(elapsed);
        match outcome {
            Ok(CandidateSource::Recommendation) => recommended += 1,
            Ok(CandidateSource::Random) => random += 1,
            Err(SelectionError::CatalogExhausted) => exhausted += 1,
            Err(_) => failed += 1,
        }
    }
    let wall_time = started.elapsed();

    if timings.is_empty() {
        println!("No requests made");
        return Ok(());
    }

    let total_latency: Duration = timings.iter().sum();
    let avg_latency = total_latency / (timings.len() as u32);
    timings.sort();
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f32 / wall_time.as_secs_f32();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);
    println!(
        "Paths: {} recommendation, {} random, {} exhausted, {} failed",
        recommended.to_string().green(),
        random,
        exhausted.to_string().yellow(),
        failed.to_string().red()
    );
    Ok(())
}

fn source_label(source: CandidateSource) -> colored::ColoredString {
    match source {
        CandidateSource::Recommendation => "recommendation".magenta(),
        CandidateSource::Random => "random".normal(),
    }
}
