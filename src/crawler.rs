use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::browser::{Browser, Launcher};
use crate::config::CrawlSettings;
use crate::index::{CollegeIndex, IndexStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Too many consecutive scrolls revealed nothing.
    Exhausted,
    ScrollCap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub added: usize,
    pub total: usize,
    pub scrolls: u32,
    pub stop: StopReason,
}

#[derive(Debug, Default)]
struct CrawlState {
    last_height: i64,
    unchanged_scrolls: u32,
    total_scrolls: u32,
}

impl CrawlState {
    /// Record one scroll's outcome; returns the updated unchanged streak.
    fn observe(&mut self, new_height: i64, new_found: usize) -> u32 {
        if new_found == 0 && new_height == self.last_height {
            self.unchanged_scrolls += 1;
        } else {
            self.unchanged_scrolls = 0;
        }
        self.last_height = new_height;
        self.total_scrolls += 1;
        self.unchanged_scrolls
    }
}

pub fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb
}

/// Harvest (name, href) pairs currently rendered for `selector` into the index,
/// saving after each new entry. Elements that cannot be read are skipped.
async fn harvest<B: Browser>(
    browser: &B,
    selector: &str,
    index: &mut CollegeIndex,
    store: &IndexStore,
) -> Result<usize> {
    let links = browser.find_all(selector).await?;
    let mut new_found = 0;

    for link in &links {
        let href = match browser.attribute(link, "href").await {
            Ok(Some(href)) => href,
            Ok(None) => continue,
            Err(e) => {
                debug!("Skipping link with unreadable href: {:#}", e);
                continue;
            }
        };
        if index.contains_url(href.trim()) {
            continue;
        }
        let name = match browser.text(link).await {
            Ok(name) => name,
            Err(e) => {
                debug!("Skipping link with unreadable text: {:#}", e);
                continue;
            }
        };

        if let Some(key) = index.insert_link(&name, &href) {
            store.save(index)?;
            new_found += 1;
            info!("Added: {} -> {}", key, href.trim());
        }
    }
    Ok(new_found)
}

/// Scroll the listing until it stops growing, committing every newly seen
/// college link to `store` as it appears.
pub async fn crawl<B: Browser>(
    browser: &mut B,
    index: &mut CollegeIndex,
    store: &IndexStore,
    settings: &CrawlSettings,
    progress: &ProgressBar,
) -> Result<CrawlReport> {
    let start_len = index.len();

    browser
        .navigate(&settings.listing_url)
        .await
        .context("Failed to open listing page")?;
    tokio::time::sleep(settings.initial_settle).await;

    let mut state = CrawlState {
        last_height: browser.scroll_height().await?,
        ..Default::default()
    };

    let stop = loop {
        if state.total_scrolls >= settings.max_total_scrolls {
            break StopReason::ScrollCap;
        }

        browser.scroll_to_bottom().await?;
        tokio::time::sleep(settings.scroll_settle).await;
        let new_height = browser.scroll_height().await?;

        let new_found = harvest(browser, &settings.link_selector, index, store).await?;
        let unchanged = state.observe(new_height, new_found);
        if unchanged > 0 {
            debug!(
                "No new colleges and no height change ({}/{})",
                unchanged, settings.max_unchanged_scrolls
            );
        }

        progress.set_message(format!(
            "scroll {} | {} colleges | idle {}/{}",
            state.total_scrolls,
            index.len(),
            unchanged,
            settings.max_unchanged_scrolls
        ));
        progress.tick();

        if unchanged >= settings.max_unchanged_scrolls {
            break StopReason::Exhausted;
        }
    };

    let report = CrawlReport {
        added: index.len() - start_len,
        total: index.len(),
        scrolls: state.total_scrolls,
        stop,
    };
    info!(
        "Crawl stopped ({:?}) after {} scrolls: {} new, {} total",
        report.stop, report.scrolls, report.added, report.total
    );
    Ok(report)
}

/// Load the stored index, crawl in a fresh session and close it whatever the
/// outcome. Entries found before a failure are already on disk.
pub async fn run_crawl<L: Launcher>(
    launcher: &L,
    store: &IndexStore,
    settings: &CrawlSettings,
    progress: &ProgressBar,
) -> Result<CrawlReport> {
    let mut index = store.load()?;
    info!(
        "Loaded {} colleges from {}",
        index.len(),
        store.path().display()
    );

    let mut session = launcher.launch().await?;
    let result = crawl(&mut session, &mut index, store, settings, progress).await;

    if let Err(e) = session.close().await {
        warn!("Failed to close browser session: {:#}", e);
    }
    result
}

// ── Tests ──
