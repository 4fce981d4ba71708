//! TOML configuration loading and validation.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::driver::BrowserConfig;
use crate::error::{Error, Result};
use crate::site;

/// Top-level configuration. Every section and field has a default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub site: SiteConfig,
    pub timeouts: TimeoutConfig,
    pub session: SessionConfig,
    pub pacing: PacingConfig,
}

/// Brokerage entry points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,
    #[serde(default = "default_holdings_url")]
    pub holdings_url: String,
    #[serde(default = "default_trade_url")]
    pub trade_url: String,
    /// Host serving the bot-detection interstitial.
    #[serde(default = "default_challenge_host")]
    pub challenge_host: String,
}

fn default_login_url() -> String {
    site::LOGIN_URL.into()
}
fn default_dashboard_url() -> String {
    site::DASHBOARD_URL.into()
}
fn default_holdings_url() -> String {
    site::HOLDINGS_URL.into()
}
fn default_trade_url() -> String {
    site::TRADE_URL.into()
}
fn default_challenge_host() -> String {
    site::CHALLENGE_HOST.into()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            dashboard_url: default_dashboard_url(),
            holdings_url: default_holdings_url(),
            trade_url: default_trade_url(),
            challenge_host: default_challenge_host(),
        }
    }
}

impl SiteConfig {
    /// Host part of the login URL; landing there mid-session means we were signed out.
    pub fn login_host(&self) -> &str {
        host_of(&self.login_url)
    }
}

/// Host (and port) part of a URL.
pub(crate) fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    rest.split(['/', '?', '#']).next().unwrap_or(rest)
}

/// Bounded waits, in milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_element_ms")]
    pub element_ms: u64,
    /// Short wait for optional modals and prompts.
    #[serde(default = "default_probe_ms")]
    pub probe_ms: u64,
    #[serde(default = "default_page_ms")]
    pub page_ms: u64,
    #[serde(default = "default_confirmation_ms")]
    pub confirmation_ms: u64,
}

fn default_element_ms() -> u64 {
    10_000
}
fn default_probe_ms() -> u64 {
    3_000
}
fn default_page_ms() -> u64 {
    60_000
}
fn default_confirmation_ms() -> u64 {
    10_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            element_ms: default_element_ms(),
            probe_ms: default_probe_ms(),
            page_ms: default_page_ms(),
            confirmation_ms: default_confirmation_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn element(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }
    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms)
    }
    pub fn page(&self) -> Duration {
        Duration::from_millis(self.page_ms)
    }
    pub fn confirmation(&self) -> Duration {
        Duration::from_millis(self.confirmation_ms)
    }
}

/// Session state machine bounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    /// Idle time after which an authenticated session is treated as expired.
    #[serde(default = "default_inactivity")]
    pub inactivity_timeout_secs: u64,
    /// Fresh navigate-and-classify attempts when the login page is unrecognized.
    #[serde(default = "default_layout_retries")]
    pub max_layout_retries: u32,
    /// Classification probes per login page load.
    #[serde(default = "default_login_polls")]
    pub login_polls: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Re-reads of the quote value while it shows a placeholder.
    #[serde(default = "default_quote_polls")]
    pub quote_polls: u32,
    /// Attempts for a read that fails on a missing element.
    #[serde(default = "default_read_attempts")]
    pub read_attempts: u32,
}

fn default_inactivity() -> u64 {
    15 * 60
}
fn default_layout_retries() -> u32 {
    2
}
fn default_login_polls() -> u32 {
    120
}
fn default_poll_interval() -> u64 {
    500
}
fn default_quote_polls() -> u32 {
    3
}
fn default_read_attempts() -> u32 {
    2
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: default_inactivity(),
            max_layout_retries: default_layout_retries(),
            login_polls: default_login_polls(),
            poll_interval_ms: default_poll_interval(),
            quote_polls: default_quote_polls(),
            read_attempts: default_read_attempts(),
        }
    }
}

impl SessionConfig {
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Randomized human-like pause before submitting the login form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_pause_min")]
    pub min_pause_ms: u64,
    #[serde(default = "default_pause_max")]
    pub max_pause_ms: u64,
}

fn default_pause_min() -> u64 {
    1_000
}
fn default_pause_max() -> u64 {
    3_000
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_pause_ms: default_pause_min(),
            max_pause_ms: default_pause_max(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Settings for fast, deterministic runs against the mock site: no pauses, no polling delay.
    pub fn for_tests() -> Self {
        let mut config = Config::default();
        config.session.poll_interval_ms = 0;
        config.session.login_polls = 3;
        config.timeouts.element_ms = 50;
        config.timeouts.probe_ms = 10;
        config.timeouts.confirmation_ms = 50;
        config.pacing.min_pause_ms = 0;
        config.pacing.max_pause_ms = 0;
        config
    }

    /// Validate config invariants.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("login_url", &self.site.login_url),
            ("dashboard_url", &self.site.dashboard_url),
            ("holdings_url", &self.site.holdings_url),
            ("trade_url", &self.site.trade_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::Config(format!("{name} must be an http(s) URL, got {url:?}")));
            }
        }
        if self.site.challenge_host.is_empty() {
            return Err(Error::Config("challenge_host must not be empty".into()));
        }
        if self.timeouts.element_ms == 0 || self.timeouts.confirmation_ms == 0 {
            return Err(Error::Config("element and confirmation timeouts must be > 0".into()));
        }
        if self.session.login_polls == 0 {
            return Err(Error::Config("login_polls must be > 0".into()));
        }
        if self.session.quote_polls == 0 {
            return Err(Error::Config("quote_polls must be > 0".into()));
        }
        if self.session.read_attempts == 0 {
            return Err(Error::Config("read_attempts must be > 0".into()));
        }
        if self.pacing.min_pause_ms > self.pacing.max_pause_ms {
            return Err(Error::Config("min_pause_ms must be <= max_pause_ms".into()));
        }
        if self.browser.viewport_width == 0 || self.browser.viewport_height == 0 {
            return Err(Error::Config("viewport must be non-empty".into()));
        }
        Ok(())
    }
}
