//! In-memory [`Browser`] used by tests. Each page is a list of frames; every
//! scroll advances to the next frame and sticks on the last one.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{bail, Result};

use super::{Browser, Launcher};

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub click_fails: bool,
}

impl FakeElement {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn link(text: &str, href: &str) -> Self {
        Self::new(text).with_attr("href", href)
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub height: i64,
    pub elements: HashMap<String, Vec<FakeElement>>,
}

impl Frame {
    pub fn new(height: i64) -> Self {
        Self {
            height,
            elements: HashMap::new(),
        }
    }

    pub fn with(mut self, css: &str, elements: Vec<FakeElement>) -> Self {
        self.elements.insert(css.to_string(), elements);
        self
    }
}

#[derive(Debug, Default)]
pub struct Activity {
    pub launched: usize,
    pub closed: usize,
    pub scrolls: usize,
    pub visited: Vec<String>,
    pub clicked: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeBrowser {
    pages: HashMap<String, Vec<Frame>>,
    current: Option<String>,
    cursor: Cell<usize>,
    broken_selector: Option<String>,
    pub activity: Rc<RefCell<Activity>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, frames: Vec<Frame>) -> Self {
        self.pages.insert(url.to_string(), frames);
        self
    }

    /// Make lookups of `css` fail as if the renderer crashed.
    pub fn break_selector(mut self, css: &str) -> Self {
        self.broken_selector = Some(css.to_string());
        self
    }

    fn frame(&self) -> Option<&Frame> {
        let frames = self.pages.get(self.current.as_deref()?)?;
        frames.get(self.cursor.get().min(frames.len().saturating_sub(1)))
    }
}

impl Browser for FakeBrowser {
    type Element = FakeElement;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.activity.borrow_mut().visited.push(url.to_string());
        if !self.pages.contains_key(url) {
            bail!("net::ERR_NAME_NOT_RESOLVED loading {}", url);
        }
        self.current = Some(url.to_string());
        self.cursor.set(0);
        Ok(())
    }

    async fn find_all(&self, css: &str) -> Result<Vec<FakeElement>> {
        if self.broken_selector.as_deref() == Some(css) {
            bail!("no such window: target window already closed");
        }
        Ok(self
            .frame()
            .and_then(|f| f.elements.get(css))
            .cloned()
            .unwrap_or_default())
    }

    async fn text(&self, element: &FakeElement) -> Result<String> {
        Ok(element.text.clone())
    }

    async fn attribute(&self, element: &FakeElement, name: &str) -> Result<Option<String>> {
        Ok(element.attrs.get(name).cloned())
    }

    async fn click(&self, element: &FakeElement) -> Result<()> {
        if element.click_fails {
            bail!("element click intercepted");
        }
        self.activity.borrow_mut().clicked.push(element.text.clone());
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.activity.borrow_mut().scrolls += 1;
        self.cursor.set(self.cursor.get() + 1);
        Ok(())
    }

    async fn scroll_height(&self) -> Result<i64> {
        Ok(self.frame().map_or(0, |f| f.height))
    }

    async fn close(self) -> Result<()> {
        self.activity.borrow_mut().closed += 1;
        Ok(())
    }
}

/// Hands out clones of a template browser that all share one [`Activity`].
pub struct FakeLauncher {
    pub template: FakeBrowser,
    pub fail: bool,
}

impl FakeLauncher {
    pub fn new(template: FakeBrowser) -> Self {
        Self {
            template,
            fail: false,
        }
    }

    pub fn activity(&self) -> Rc<RefCell<Activity>> {
        Rc::clone(&self.template.activity)
    }
}

impl Launcher for FakeLauncher {
    type Session = FakeBrowser;

    async fn launch(&self) -> Result<FakeBrowser> {
        if self.fail {
            bail!("session not created: chrome not reachable");
        }
        self.template.activity.borrow_mut().launched += 1;
        Ok(self.template.clone())
    }
}
