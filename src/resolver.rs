use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::browser::{Browser, Launcher};
use crate::config::ScrapeSettings;
use crate::extract::{extract_gpa, GpaHit, STRATEGIES};
use crate::index::{CollegeIndex, IndexStore};
use crate::matcher::find_best_match;

/// Outcome of one resolve call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GpaResult {
    Found { college: String, gpa: f64 },
    /// College resolved but its page carries no GPA figure.
    NotFound { college: String },
    NoMatch { query: String },
    /// Navigation, lookup or rendering failure on the detail page.
    Error { college: String, reason: String },
    /// The index itself could not be read.
    StorageError { reason: String },
}

impl std::fmt::Display for GpaResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpaResult::Found { college, gpa } => write!(f, "{}: average GPA {}", college, gpa),
            GpaResult::NotFound { college } => write!(f, "{}: GPA not found", college),
            GpaResult::NoMatch { query } => write!(f, "No close college match found for {:?}", query),
            GpaResult::Error { college, reason } => write!(f, "{}: scrape failed: {}", college, reason),
            GpaResult::StorageError { reason } => write!(f, "Index unavailable: {}", reason),
        }
    }
}

/// Load a detail page, dismiss the consent overlay and run the extraction
/// strategies.
pub async fn scrape_detail_page<B: Browser>(
    browser: &mut B,
    url: &str,
    settings: &ScrapeSettings,
) -> Result<Option<GpaHit>> {
    browser.navigate(url).await?;
    dismiss_consent(browser, &settings.consent_selector).await;
    tokio::time::sleep(settings.settle).await;
    extract_gpa(browser, STRATEGIES).await
}

async fn dismiss_consent<B: Browser>(browser: &B, css: &str) {
    let buttons = match browser.find_all(css).await {
        Ok(buttons) => buttons,
        Err(e) => {
            debug!("Consent lookup failed: {:#}", e);
            return;
        }
    };
    if let Some(button) = buttons.first() {
        if let Err(e) = browser.click(button).await {
            debug!("Consent click failed: {:#}", e);
        }
    }
}

/// Resolve free text to a GPA. Every failure comes back as a [`GpaResult`]
/// variant; the browser session is closed before returning.
pub async fn resolve<L: Launcher>(
    query: &str,
    index: &CollegeIndex,
    launcher: &L,
    settings: &ScrapeSettings,
) -> GpaResult {
    let Some(matched) = find_best_match(query, index, settings.match_threshold) else {
        return GpaResult::NoMatch {
            query: query.to_string(),
        };
    };
    info!(
        "Resolved {:?} to {} (score {:.1})",
        query, matched.matched_key, matched.score
    );
    let college = matched.matched_key;

    let mut session = match launcher.launch().await {
        Ok(session) => session,
        Err(e) => {
            return GpaResult::Error {
                college,
                reason: format!("{:#}", e),
            }
        }
    };

    let scraped = scrape_detail_page(&mut session, &matched.url, settings).await;

    if let Err(e) = session.close().await {
        warn!("Failed to close browser session: {:#}", e);
    }

    match scraped {
        Ok(Some(hit)) => {
            info!("GPA {} via {} strategy", hit.value, hit.strategy);
            GpaResult::Found {
                college,
                gpa: hit.value,
            }
        }
        Ok(None) => GpaResult::NotFound { college },
        Err(e) => GpaResult::Error {
            college,
            reason: format!("{:#}", e),
        },
    }
}

/// [`resolve`] against the index on disk; load failures become
/// [`GpaResult::StorageError`].
pub async fn resolve_from_store<L: Launcher>(
    query: &str,
    store: &IndexStore,
    launcher: &L,
    settings: &ScrapeSettings,
) -> GpaResult {
    match store.load() {
        Ok(index) => resolve(query, &index, launcher, settings).await,
        Err(e) => GpaResult::StorageError {
            reason: e.to_string(),
        },
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use super::*;
    use crate::browser::fake::{FakeBrowser, FakeElement, FakeLauncher, Frame};

    const MIT_KEY: &str = "massachusetts institute of technology (mit)";
    const MIT_URL: &str = "https://www.collegedata.com/college-search/mit";

    fn settings() -> ScrapeSettings {
        ScrapeSettings {
            settle: Duration::ZERO,
            ..Default::default()
        }
    }

    fn index() -> CollegeIndex {
        let mut entries = BTreeMap::new();
        entries.insert(MIT_KEY.to_string(), MIT_URL.to_string());
        entries.insert(
            "reed college (reed-college)".to_string(),
            "https://www.collegedata.com/college-search/reed-college".to_string(),
        );
        CollegeIndex::from_map(entries)
    }

    fn cells(texts: &[&str]) -> Vec<FakeElement> {
        texts.iter().map(|t| FakeElement::new(t)).collect()
    }

    fn mit_page(frame: Frame) -> FakeLauncher {
        FakeLauncher::new(FakeBrowser::new().page(MIT_URL, vec![frame]))
    }

    fn consent() -> Vec<FakeElement> {
        vec![FakeElement::new("Accept All Cookies")]
    }

    #[tokio::test]
    async fn abbreviation_resolves_and_extracts() {
        let launcher = mit_page(
            Frame::new(2000)
                .with("#onetrust-accept-btn-handler", consent())
                .with(".TitleValue_title__2-afK", cells(&["Average GPA"]))
                .with(".TitleValue_value__1JT0d", cells(&["Average GPA: 3.87 (unweighted)"])),
        );

        let result = resolve("MIT", &index(), &launcher, &settings()).await;
        assert_eq!(
            result,
            GpaResult::Found {
                college: MIT_KEY.to_string(),
                gpa: 3.87
            }
        );

        let activity = launcher.activity();
        let activity = activity.borrow();
        assert_eq!(activity.visited, vec![MIT_URL.to_string()]);
        assert_eq!(activity.clicked, vec!["Accept All Cookies".to_string()]);
        assert_eq!(activity.launched, 1);
        assert_eq!(activity.closed, 1);
    }

    #[tokio::test]
    async fn unknown_college_never_opens_a_session() {
        let launcher = mit_page(Frame::new(2000));
        let result = resolve("Xyzzy University", &index(), &launcher, &settings()).await;
        assert_eq!(
            result,
            GpaResult::NoMatch {
                query: "Xyzzy University".to_string()
            }
        );
        assert_eq!(launcher.activity().borrow().launched, 0);
    }

    #[tokio::test]
    async fn page_without_gpa_is_not_found() {
        let launcher = mit_page(
            Frame::new(2000)
                .with(".cd-table__cell-label", cells(&["Tuition"]))
                .with(".cd-table__cell-value", cells(&["$59,750"])),
        );
        let result = resolve("MIT", &index(), &launcher, &settings()).await;
        assert_eq!(
            result,
            GpaResult::NotFound {
                college: MIT_KEY.to_string()
            }
        );
        assert_eq!(launcher.activity().borrow().closed, 1);
    }

    #[tokio::test]
    async fn missing_or_stuck_consent_button_is_ignored() {
        let mut stuck = FakeElement::new("Accept");
        stuck.click_fails = true;
        let launcher = mit_page(
            Frame::new(2000)
                .with("#onetrust-accept-btn-handler", vec![stuck])
                .with(".cd-table__cell-label", cells(&["Average GPA"]))
                .with(".cd-table__cell-value", cells(&["3.4"])),
        );
        let result = resolve("mit", &index(), &launcher, &settings()).await;
        assert!(matches!(result, GpaResult::Found { gpa, .. } if gpa == 3.4));
    }

    #[tokio::test]
    async fn navigation_failure_is_typed_error_and_session_closed() {
        // launcher knows no pages at all
        let launcher = FakeLauncher::new(FakeBrowser::new());
        let result = resolve("MIT", &index(), &launcher, &settings()).await;
        match result {
            GpaResult::Error { college, reason } => {
                assert_eq!(college, MIT_KEY);
                assert!(reason.contains("ERR_NAME_NOT_RESOLVED"));
            }
            other => panic!("expected error, got {:?}", other),
        }
        assert_eq!(launcher.activity().borrow().closed, 1);
    }

    #[tokio::test]
    async fn renderer_crash_is_typed_error() {
        let launcher = FakeLauncher::new(
            FakeBrowser::new()
                .page(MIT_URL, vec![Frame::new(2000)])
                .break_selector(".TitleValue_title__2-afK"),
        );
        let result = resolve("MIT", &index(), &launcher, &settings()).await;
        assert!(matches!(result, GpaResult::Error { .. }));
        assert_eq!(launcher.activity().borrow().closed, 1);
    }

    #[tokio::test]
    async fn launch_failure_is_typed_error() {
        let mut launcher = mit_page(Frame::new(2000));
        launcher.fail = true;
        let result = resolve("MIT", &index(), &launcher, &settings()).await;
        assert!(matches!(result, GpaResult::Error { ref reason, .. } if reason.contains("chrome not reachable")));
    }

    #[tokio::test]
    async fn unreadable_index_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "{ not json").unwrap();

        let launcher = mit_page(Frame::new(2000));
        let result = resolve_from_store("MIT", &IndexStore::new(&path), &launcher, &settings()).await;
        assert!(matches!(result, GpaResult::StorageError { .. }));
    }

    #[test]
    fn result_serializes_with_status_tag() {
        let json = serde_json::to_value(GpaResult::NotFound {
            college: "reed college (reed-college)".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["college"], "reed college (reed-college)");
    }
}
