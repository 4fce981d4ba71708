//! Mock site for testing: a scripted, in-memory [`Surface`] and [`Launcher`].
//!
//! Pages are named sets of elements. Clicking or pressing a key on an element
//! can move to another page; navigating loads the page registered for a URL.
//! Every interaction is journaled so tests can assert what the core did.
//!
//! ```ignore
//! use vgweb::mock::MockSite;
//! use vgweb::site;
//!
//! let site = MockSite::builder()
//!     .page("login", site::LOGIN_URL, |p| {
//!         p.element(site::login::username())
//!             .element(site::login::password())
//!             .on_click(site::login::submit(), "dashboard")
//!     })
//!     .page("dashboard", site::DASHBOARD_URL, |p| p.element(site::login::dashboard_heading()))
//!     .build();
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rustc_hash::FxHashMap;

use crate::driver::{BrowserConfig, Launcher, Selector, Surface};
use crate::error::DriverError;

/// One recorded call against the mock surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interaction {
    Launch,
    Navigate(String),
    Fill(String, String),
    Click(String),
    Press(String, String),
}

#[derive(Clone, Debug, Default)]
struct MockElement {
    texts: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// A page under construction. See [`MockSiteBuilder::page`].
#[derive(Clone, Debug, Default)]
pub struct MockPage {
    url: String,
    elements: FxHashMap<String, MockElement>,
    clicks: FxHashMap<String, String>,
    keys: FxHashMap<(String, String), String>,
}

impl MockPage {
    /// An element that is present but has no text.
    pub fn element(mut self, selector: Selector) -> Self {
        self.elements.entry(selector.expr().to_string()).or_default();
        self
    }

    pub fn text(self, selector: Selector, text: &str) -> Self {
        self.texts(selector, &[text])
    }

    /// Several matching elements, one text each, in document order.
    pub fn texts(mut self, selector: Selector, texts: &[&str]) -> Self {
        let el = self.elements.entry(selector.expr().to_string()).or_default();
        el.texts = texts.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Table rows, each a list of cell texts.
    pub fn rows(mut self, selector: Selector, rows: &[&[&str]]) -> Self {
        let el = self.elements.entry(selector.expr().to_string()).or_default();
        el.rows = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        self
    }

    /// Clicking `selector` loads page `target`. Adds the element if missing.
    pub fn on_click(self, selector: Selector, target: &str) -> Self {
        let mut page = self.element(selector.clone());
        page.clicks
            .insert(selector.expr().to_string(), target.to_string());
        page
    }

    /// Pressing `key` on `selector` loads page `target`. Adds the element if missing.
    pub fn on_key(self, selector: Selector, key: &str, target: &str) -> Self {
        let mut page = self.element(selector.clone());
        page.keys.insert(
            (selector.expr().to_string(), key.to_string()),
            target.to_string(),
        );
        page
    }
}

#[derive(Debug, Default)]
struct SiteState {
    pages: FxHashMap<String, MockPage>,
    routes: FxHashMap<String, String>,
    once: FxHashMap<String, String>,
    current: Option<String>,
    current_url: String,
    click_failures: FxHashMap<String, DriverError>,
    journal: Vec<Interaction>,
    launches: Vec<BrowserConfig>,
}

impl SiteState {
    fn page(&self) -> Option<&MockPage> {
        self.current.as_ref().and_then(|name| self.pages.get(name))
    }

    fn element(&self, selector: &Selector) -> Option<&MockElement> {
        self.page().and_then(|p| p.elements.get(selector.expr()))
    }

    fn require(&self, selector: &Selector) -> Result<&MockElement, DriverError> {
        self.element(selector)
            .ok_or_else(|| DriverError::NotFound(selector.to_string()))
    }

    fn load(&mut self, name: &str) {
        if let Some(page) = self.pages.get(name) {
            self.current_url = page.url.clone();
        }
        self.current = Some(name.to_string());
    }
}

/// Builder for [`MockSite`].
#[derive(Default)]
pub struct MockSiteBuilder {
    state: SiteState,
}

impl MockSiteBuilder {
    /// Register page `name` at `url`. Navigating to `url` loads the first
    /// page registered there unless a route overrides it.
    pub fn page(mut self, name: &str, url: &str, build: impl FnOnce(MockPage) -> MockPage) -> Self {
        let page = build(MockPage {
            url: url.to_string(),
            ..MockPage::default()
        });
        self.state.pages.insert(name.to_string(), page);
        self.state
            .routes
            .entry(url.to_string())
            .or_insert_with(|| name.to_string());
        self
    }

    /// Navigating to `url` loads page `target` instead (a redirect).
    pub fn route(mut self, url: &str, target: &str) -> Self {
        self.state.routes.insert(url.to_string(), target.to_string());
        self
    }

    pub fn build(self) -> MockSite {
        MockSite {
            state: Arc::new(Mutex::new(self.state)),
        }
    }
}

/// A scripted brokerage site. Clones share state; launching hands out a
/// [`MockSurface`] over the same state, so a test can keep a clone to
/// inspect the journal or change routes mid-test.
#[derive(Clone, Debug)]
pub struct MockSite {
    state: Arc<Mutex<SiteState>>,
}

impl MockSite {
    pub fn builder() -> MockSiteBuilder {
        MockSiteBuilder::default()
    }

    fn lock(&self) -> MutexGuard<'_, SiteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A surface over this site without going through [`Launcher`].
    pub fn surface(&self) -> MockSurface {
        MockSurface {
            state: Arc::clone(&self.state),
        }
    }

    /// Redirect `url` to page `target` from now on.
    pub fn set_route(&self, url: &str, target: &str) {
        self.lock()
            .routes
            .insert(url.to_string(), target.to_string());
    }

    /// Redirect the next navigation to `url` only, then fall back to the normal route.
    pub fn redirect_once(&self, url: &str, target: &str) {
        self.lock()
            .once
            .insert(url.to_string(), target.to_string());
    }

    /// Make clicks on `selector` fail with `error` (the click is still journaled).
    pub fn fail_clicks(&self, selector: &Selector, error: DriverError) {
        self.lock()
            .click_failures
            .insert(selector.expr().to_string(), error);
    }

    /// Every interaction so far.
    pub fn interactions(&self) -> Vec<Interaction> {
        self.lock().journal.clone()
    }

    /// URLs navigated to, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.lock()
            .journal
            .iter()
            .filter_map(|i| match i {
                Interaction::Navigate(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clicks_on(&self, selector: &Selector) -> usize {
        self.lock()
            .journal
            .iter()
            .filter(|i| matches!(i, Interaction::Click(s) if s == selector.expr()))
            .count()
    }

    /// Last value typed into `selector`.
    pub fn filled(&self, selector: &Selector) -> Option<String> {
        self.lock().journal.iter().rev().find_map(|i| match i {
            Interaction::Fill(s, v) if s == selector.expr() => Some(v.clone()),
            _ => None,
        })
    }

    /// Browser configs the site was launched with.
    pub fn launches(&self) -> Vec<BrowserConfig> {
        self.lock().launches.clone()
    }

    /// Name of the page currently shown.
    pub fn current_page(&self) -> Option<String> {
        self.lock().current.clone()
    }
}

impl Launcher for MockSite {
    type Surface = MockSurface;

    fn launch(&self, config: &BrowserConfig) -> Result<MockSurface, DriverError> {
        let mut state = self.lock();
        state.launches.push(config.clone());
        state.journal.push(Interaction::Launch);
        drop(state);
        Ok(self.surface())
    }
}

/// Surface over a [`MockSite`]. Waits never sleep: an element is there or it times out.
#[derive(Debug)]
pub struct MockSurface {
    state: Arc<Mutex<SiteState>>,
}

impl MockSurface {
    fn lock(&self) -> MutexGuard<'_, SiteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Surface for MockSurface {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.journal.push(Interaction::Navigate(url.to_string()));
        let target = state
            .once
            .remove(url)
            .or_else(|| state.routes.get(url).cloned());
        match target {
            Some(name) => state.load(&name),
            None => {
                state.current = None;
                state.current_url = url.to_string();
            }
        }
        Ok(())
    }

    fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.lock().current_url.clone())
    }

    fn exists(&self, selector: &Selector) -> Result<bool, DriverError> {
        Ok(self.lock().element(selector).is_some())
    }

    fn wait_for(&mut self, selector: &Selector, _timeout: Duration) -> Result<(), DriverError> {
        if self.lock().element(selector).is_some() {
            Ok(())
        } else {
            Err(DriverError::Timeout(selector.to_string()))
        }
    }

    fn read_text(&self, selector: &Selector) -> Result<String, DriverError> {
        let state = self.lock();
        let el = state.require(selector)?;
        Ok(el.texts.first().cloned().unwrap_or_default())
    }

    fn read_all(&self, selector: &Selector) -> Result<Vec<String>, DriverError> {
        Ok(self
            .lock()
            .element(selector)
            .map(|el| el.texts.clone())
            .unwrap_or_default())
    }

    fn read_rows(&self, selector: &Selector) -> Result<Vec<Vec<String>>, DriverError> {
        Ok(self
            .lock()
            .element(selector)
            .map(|el| el.rows.clone())
            .unwrap_or_default())
    }

    fn fill(&mut self, selector: &Selector, value: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.require(selector)?;
        state.journal.push(Interaction::Fill(
            selector.expr().to_string(),
            value.to_string(),
        ));
        Ok(())
    }

    fn click(&mut self, selector: &Selector) -> Result<(), DriverError> {
        let mut state = self.lock();
        let target = state
            .page()
            .filter(|p| p.elements.contains_key(selector.expr()))
            .map(|p| p.clicks.get(selector.expr()).cloned())
            .ok_or_else(|| DriverError::NotFound(selector.to_string()))?;
        state
            .journal
            .push(Interaction::Click(selector.expr().to_string()));
        if let Some(err) = state.click_failures.get(selector.expr()) {
            return Err(err.clone());
        }
        if let Some(name) = target {
            state.load(&name);
        }
        Ok(())
    }

    fn press(&mut self, selector: &Selector, key: &str) -> Result<(), DriverError> {
        let mut state = self.lock();
        let target = state
            .page()
            .filter(|p| p.elements.contains_key(selector.expr()))
            .map(|p| {
                p.keys
                    .get(&(selector.expr().to_string(), key.to_string()))
                    .cloned()
            })
            .ok_or_else(|| DriverError::NotFound(selector.to_string()))?;
        state.journal.push(Interaction::Press(
            selector.expr().to_string(),
            key.to_string(),
        ));
        if let Some(name) = target {
            state.load(&name);
        }
        Ok(())
    }
}
