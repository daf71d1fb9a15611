mod browser;
mod config;
mod crawler;
mod extract;
mod fuzz;
mod index;
mod matcher;
mod resolver;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use browser::webdriver::ChromeLauncher;
use config::{CrawlSettings, ScrapeSettings, SessionSettings};
use index::IndexStore;

#[derive(Parser)]
#[command(name = "college_gpa", about = "College GPA lookup backed by a crawled collegedata.com index")]
struct Cli {
    /// Path of the name-to-url index
    #[arg(long, global = true, env = "GPA_INDEX_PATH", default_value = config::DEFAULT_INDEX_PATH)]
    index: PathBuf,
    /// chromedriver endpoint
    #[arg(long, global = true, env = "WEBDRIVER_URL", default_value = config::DEFAULT_WEBDRIVER_URL)]
    webdriver: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scroll the college listing and add every new college to the index
    Crawl {
        /// Show the browser window
        #[arg(long)]
        headed: bool,
        /// Hard cap on scroll iterations
        #[arg(long, default_value_t = config::MAX_TOTAL_SCROLLS)]
        max_scrolls: u32,
        /// Stop after this many scrolls with no new colleges and no height change
        #[arg(long, default_value_t = config::MAX_UNCHANGED_SCROLLS)]
        max_unchanged: u32,
    },
    /// Match a college name and scrape its average GPA
    Resolve {
        /// College name as typed by a user
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Seconds to wait for the detail page to render
        #[arg(long)]
        settle_secs: Option<u64>,
    },
    /// Show the best index match for a name without opening a browser
    Match {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Show index statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let store = IndexStore::new(&cli.index);

    let result = match cli.command {
        Commands::Crawl {
            headed,
            max_scrolls,
            max_unchanged,
        } => {
            let launcher = ChromeLauncher::new(SessionSettings {
                webdriver_url: cli.webdriver,
                headless: !headed,
            });
            let settings = CrawlSettings {
                max_total_scrolls: max_scrolls,
                max_unchanged_scrolls: max_unchanged,
                ..Default::default()
            };

            let pb = crawler::spinner();
            let report = crawler::run_crawl(&launcher, &store, &settings, &pb).await;
            pb.finish_and_clear();
            let report = report?;

            println!(
                "Added {} new colleges ({} total) in {} scrolls, stopped: {:?}",
                report.added, report.total, report.scrolls, report.stop
            );
            println!("Saved to {}", store.path().display());
            Ok(())
        }
        Commands::Resolve {
            name,
            json,
            settle_secs,
        } => {
            let query = name.join(" ");
            let launcher = ChromeLauncher::new(SessionSettings {
                webdriver_url: cli.webdriver,
                ..Default::default()
            });
            let mut settings = ScrapeSettings::default();
            if let Some(secs) = settle_secs {
                settings.settle = std::time::Duration::from_secs(secs);
            }

            let result = resolver::resolve_from_store(&query, &store, &launcher, &settings).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result);
            }
            Ok(())
        }
        Commands::Match { name } => {
            let query = name.join(" ");
            let index = store.load()?;
            if index.is_empty() {
                println!("Index is empty. Run 'crawl' first.");
                return Ok(());
            }
            match matcher::best_candidate(&query, &index) {
                Some(m) => {
                    let verdict = if m.score >= config::MATCH_THRESHOLD {
                        "match"
                    } else {
                        "below threshold"
                    };
                    println!("{} -> {} ({:.1}, {})", query, m.matched_key, m.score, verdict);
                    println!("{}", m.url);
                }
                None => println!("Nothing to match for {:?}", query),
            }
            Ok(())
        }
        Commands::Stats => {
            let index = store.load()?;
            println!("Index:    {}", store.path().display());
            println!("Colleges: {}", index.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
