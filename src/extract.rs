use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::browser::Browser;

static GPA_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d{1,2})?").unwrap());

/// One way of locating label/value cells on a detail page. Labels and values
/// are paired by position.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub label_selector: &'static str,
    pub value_selector: &'static str,
    pub accepts: fn(label: &str, value: &str) -> bool,
}

/// Tried in order; the first strategy that yields a number wins.
pub const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "title-value",
        label_selector: ".TitleValue_title__2-afK",
        value_selector: ".TitleValue_value__1JT0d",
        accepts: mentions_gpa,
    },
    Strategy {
        name: "table-cell",
        label_selector: ".cd-table__cell-label",
        value_selector: ".cd-table__cell-value",
        accepts: label_says_gpa,
    },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpaHit {
    pub value: f64,
    pub strategy: &'static str,
}

fn mentions_gpa(label: &str, value: &str) -> bool {
    label.to_lowercase().contains("gpa") || value.to_lowercase().contains("gpa")
}

fn label_says_gpa(label: &str, _value: &str) -> bool {
    label.contains("GPA")
}

/// First number in `text`, keeping at most two decimals.
/// `"Average GPA: 3.87 (unweighted)"` gives `3.87`.
pub fn extract_gpa_number(text: &str) -> Option<f64> {
    GPA_NUMBER_RE.find(text)?.as_str().parse().ok()
}

/// First accepted pair whose value text carries a number.
pub fn first_gpa<'a, I>(pairs: I, accepts: fn(&str, &str) -> bool) -> Option<f64>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .filter(|(label, value)| accepts(label, value))
        .find_map(|(_, value)| extract_gpa_number(value))
}

async fn run_strategy<B: Browser>(browser: &B, strategy: &Strategy) -> Result<Option<f64>> {
    let labels = browser.find_all(strategy.label_selector).await?;
    let values = browser.find_all(strategy.value_selector).await?;

    for (label, value) in labels.iter().zip(values.iter()) {
        let label = browser.text(label).await?;
        let value = browser.text(value).await?;
        if let Some(gpa) = first_gpa([(label.as_str(), value.as_str())], strategy.accepts) {
            debug!("Matched GPA label {:?} -> {}", label, gpa);
            return Ok(Some(gpa));
        }
    }
    Ok(None)
}

/// Apply `strategies` in order against the loaded page.
pub async fn extract_gpa<B: Browser>(browser: &B, strategies: &[Strategy]) -> Result<Option<GpaHit>> {
    for strategy in strategies {
        if let Some(value) = run_strategy(browser, strategy).await? {
            return Ok(Some(GpaHit {
                value,
                strategy: strategy.name,
            }));
        }
        debug!("Strategy {} found no GPA", strategy.name);
    }
    Ok(None)
}

// ── Tests ──
