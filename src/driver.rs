//! The automation surface the core drives, and how it gets launched.
//!
//! The browser engine itself lives behind [`Surface`]. Implementations:
//!
//! - **Chrome** (feature `chrome`): headless Chromium via `headless_chrome`
//! - **Mock** ([`crate::mock`]): a scripted site for tests

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::DriverError;

/// An element locator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn css(expr: impl Into<String>) -> Self {
        Selector::Css(expr.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Selector::XPath(expr.into())
    }

    pub fn expr(&self) -> &str {
        match self {
            Selector::Css(s) | Selector::XPath(s) => s,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css={s}"),
            Selector::XPath(s) => write!(f, "xpath={s}"),
        }
    }
}

/// A live page the core can navigate and interact with.
///
/// Every method is bounded: implementations apply their configured default
/// timeout where no explicit one is passed.
pub trait Surface {
    /// Load a URL and wait for the document.
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// URL of the current document.
    fn current_url(&self) -> Result<String, DriverError>;

    /// True if the element is present right now. Never waits.
    fn exists(&self, selector: &Selector) -> Result<bool, DriverError>;

    /// Wait until the element is present.
    fn wait_for(&mut self, selector: &Selector, timeout: Duration) -> Result<(), DriverError>;

    /// Visible text of the first match.
    fn read_text(&self, selector: &Selector) -> Result<String, DriverError>;

    /// Visible text of every match, in document order.
    fn read_all(&self, selector: &Selector) -> Result<Vec<String>, DriverError>;

    /// For each matching row, the visible text of its `th`/`td` cells.
    fn read_rows(&self, selector: &Selector) -> Result<Vec<Vec<String>>, DriverError>;

    /// Clear a field and type `value` into it.
    fn fill(&mut self, selector: &Selector, value: &str) -> Result<(), DriverError>;

    fn click(&mut self, selector: &Selector) -> Result<(), DriverError>;

    /// Send a key press (e.g. `"Enter"`) to an element.
    fn press(&mut self, selector: &Selector, key: &str) -> Result<(), DriverError>;
}

/// Browser launch parameters. Stealth policies adjust these before launch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: Option<String>,
    /// Ask the engine to mask automation fingerprints.
    pub stealth: bool,
    /// Default bound for element lookups.
    pub default_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            user_agent: None,
            stealth: false,
            default_timeout_ms: 10_000,
        }
    }
}

/// Configuration applied once to a session before launch to reduce bot detection.
pub trait StealthPolicy {
    fn apply(&self, config: &mut BrowserConfig) -> Result<(), DriverError>;
}

/// Desktop Firefox-on-Windows user agent, full-HD viewport, engine stealth on.
#[derive(Debug, Clone, Default)]
pub struct StandardStealth {
    /// Overrides the stock user agent when set.
    pub user_agent: Option<String>,
}

const STANDARD_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";

impl StealthPolicy for StandardStealth {
    fn apply(&self, config: &mut BrowserConfig) -> Result<(), DriverError> {
        let ua = self
            .user_agent
            .clone()
            .or_else(|| config.user_agent.clone())
            .unwrap_or_else(|| STANDARD_USER_AGENT.to_string());
        if ua.trim().is_empty() {
            return Err(DriverError::Browser("empty user agent".into()));
        }
        config.user_agent = Some(ua);
        config.viewport_width = config.viewport_width.max(1280);
        config.viewport_height = config.viewport_height.max(800);
        config.stealth = true;
        Ok(())
    }
}

/// No fingerprint changes at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStealth;

impl StealthPolicy for NoStealth {
    fn apply(&self, _config: &mut BrowserConfig) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Starts a browser and hands back its surface.
pub trait Launcher {
    type Surface: Surface;

    fn launch(&self, config: &BrowserConfig) -> Result<Self::Surface, DriverError>;
}
