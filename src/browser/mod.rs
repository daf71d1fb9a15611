pub mod webdriver;

#[cfg(test)]
pub mod fake;

use anyhow::Result;

/// A rendered page the crawler and extractor can drive.
pub trait Browser {
    type Element;

    async fn navigate(&mut self, url: &str) -> Result<()>;
    async fn find_all(&self, css: &str) -> Result<Vec<Self::Element>>;
    async fn text(&self, element: &Self::Element) -> Result<String>;
    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;
    async fn click(&self, element: &Self::Element) -> Result<()>;
    async fn scroll_to_bottom(&self) -> Result<()>;
    async fn scroll_height(&self) -> Result<i64>;
    /// Release the session and whatever process backs it.
    async fn close(self) -> Result<()>;
}

/// Opens a fresh [`Browser`] session per call.
pub trait Launcher {
    type Session: Browser;

    async fn launch(&self) -> Result<Self::Session>;
}
