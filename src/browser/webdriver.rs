use anyhow::{Context, Result};
use thirtyfour::prelude::*;

use super::{Browser, Launcher};
use crate::config::SessionSettings;

/// Starts Chrome sessions through a running chromedriver.
pub struct ChromeLauncher {
    settings: SessionSettings,
}

impl ChromeLauncher {
    pub fn new(settings: SessionSettings) -> Self {
        Self { settings }
    }
}

impl Launcher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_chrome_option("args", self.settings.chrome_args())?;

        let driver = WebDriver::new(&self.settings.webdriver_url, caps)
            .await
            .with_context(|| {
                format!("Failed to connect to chromedriver at {}", self.settings.webdriver_url)
            })?;
        Ok(ChromeSession { driver })
    }
}

pub struct ChromeSession {
    driver: WebDriver,
}

impl Browser for ChromeSession {
    type Element = WebElement;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.driver
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {}", url))
    }

    async fn find_all(&self, css: &str) -> Result<Vec<WebElement>> {
        self.driver
            .find_all(By::Css(css))
            .await
            .with_context(|| format!("Element lookup failed for {:?}", css))
    }

    async fn text(&self, element: &WebElement) -> Result<String> {
        Ok(element.text().await?)
    }

    async fn attribute(&self, element: &WebElement, name: &str) -> Result<Option<String>> {
        // Properties come back resolved (absolute hrefs); fall back to the raw attribute.
        if let Some(value) = element.prop(name).await? {
            return Ok(Some(value));
        }
        Ok(element.attr(name).await?)
    }

    async fn click(&self, element: &WebElement) -> Result<()> {
        Ok(element.click().await?)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.driver
            .execute("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
            .await
            .context("Scroll script failed")?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<i64> {
        let ret = self
            .driver
            .execute("return document.body.scrollHeight;", Vec::new())
            .await
            .context("Height script failed")?;
        ret.json()
            .as_i64()
            .or_else(|| ret.json().as_f64().map(|h| h as i64))
            .context("Page height was not a number")
    }

    async fn close(self) -> Result<()> {
        self.driver.quit().await.context("Failed to quit browser")
    }
}
