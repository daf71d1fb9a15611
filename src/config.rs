use std::time::Duration;

pub const DEFAULT_INDEX_PATH: &str = "data/collegedata_urls.json";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

pub const LISTING_URL: &str = "https://www.collegedata.com/college-search/";
pub const LISTING_LINK_SELECTOR: &str = "a.Link_link__a-VS4.Link_headerLink__2o8d9";
pub const CONSENT_BUTTON_SELECTOR: &str = "#onetrust-accept-btn-handler";

const INITIAL_SETTLE_SECS: u64 = 5;
const SCROLL_SETTLE_SECS: u64 = 5;
const DETAIL_SETTLE_SECS: u64 = 3;

pub const MAX_UNCHANGED_SCROLLS: u32 = 25;
pub const MAX_TOTAL_SCROLLS: u32 = 500;

/// Minimum partial-ratio score (0-100) for a query to resolve to an index key.
pub const MATCH_THRESHOLD: f64 = 85.0;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub webdriver_url: String,
    pub headless: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
        }
    }
}

impl SessionSettings {
    pub fn chrome_args(&self) -> Vec<&'static str> {
        let mut args = Vec::with_capacity(5);
        if self.headless {
            args.push("--headless=new");
        }
        args.extend([
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--window-size=1920,1080",
        ]);
        args
    }
}

#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub listing_url: String,
    pub link_selector: String,
    pub initial_settle: Duration,
    pub scroll_settle: Duration,
    pub max_unchanged_scrolls: u32,
    pub max_total_scrolls: u32,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            listing_url: LISTING_URL.to_string(),
            link_selector: LISTING_LINK_SELECTOR.to_string(),
            initial_settle: Duration::from_secs(INITIAL_SETTLE_SECS),
            scroll_settle: Duration::from_secs(SCROLL_SETTLE_SECS),
            max_unchanged_scrolls: MAX_UNCHANGED_SCROLLS,
            max_total_scrolls: MAX_TOTAL_SCROLLS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub consent_selector: String,
    pub settle: Duration,
    pub match_threshold: f64,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            consent_selector: CONSENT_BUTTON_SELECTOR.to_string(),
            settle: Duration::from_secs(DETAIL_SETTLE_SECS),
            match_threshold: MATCH_THRESHOLD,
        }
    }
}
