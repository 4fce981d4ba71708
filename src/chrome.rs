//! Headless Chromium surface via the `headless_chrome` crate.
//!
//! Enable with the `chrome` feature. Element lookups through this adapter
//! never wait unless the call is `wait_for`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::browser::tab::element::Element;
use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptions, Tab};
use log::debug;

use crate::driver::{BrowserConfig, Launcher, Selector, Surface};
use crate::error::DriverError;

fn browser_err(e: impl std::fmt::Display) -> DriverError {
    DriverError::Browser(e.to_string())
}

/// The lookup found nothing, as opposed to the tab or transport failing.
fn is_missing(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NoElementFound>().is_some() || e.downcast_ref::<Timeout>().is_some()
}

/// Empty for a lookup that matched nothing. Other failures are `Browser` errors.
fn all_or_empty<T>(found: anyhow::Result<Vec<T>>) -> Result<Vec<T>, DriverError> {
    match found {
        Ok(items) => Ok(items),
        Err(e) if is_missing(&e) => Ok(Vec::new()),
        Err(e) => Err(browser_err(e)),
    }
}

/// Launches a local Chrome/Chromium.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    /// Browser binary. Auto-detected when `None`.
    pub path: Option<PathBuf>,
}

impl Launcher for ChromeLauncher {
    type Surface = ChromeSurface;

    fn launch(&self, config: &BrowserConfig) -> Result<ChromeSurface, DriverError> {
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.viewport_width, config.viewport_height)))
            .path(self.path.clone())
            .build()
            .map_err(browser_err)?;
        let browser = Browser::new(options).map_err(browser_err)?;
        let tab = browser.new_tab().map_err(browser_err)?;
        tab.set_default_timeout(Duration::from_millis(config.default_timeout_ms));
        if let Some(ua) = &config.user_agent {
            tab.set_user_agent(ua, None, None).map_err(browser_err)?;
        }
        if config.stealth {
            tab.enable_stealth_mode().map_err(browser_err)?;
        }
        debug!("chrome tab ready");
        Ok(ChromeSurface {
            _browser: browser,
            tab,
        })
    }
}

/// One Chrome tab. Dropping it closes the browser.
pub struct ChromeSurface {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSurface {
    fn find(&self, selector: &Selector) -> Result<Element<'_>, DriverError> {
        let found = match selector {
            Selector::Css(css) => self.tab.find_element(css),
            Selector::XPath(xpath) => self.tab.find_element_by_xpath(xpath),
        };
        found.map_err(|e| {
            if is_missing(&e) {
                DriverError::NotFound(selector.to_string())
            } else {
                browser_err(e)
            }
        })
    }

    fn find_all(&self, selector: &Selector) -> Result<Vec<Element<'_>>, DriverError> {
        all_or_empty(match selector {
            Selector::Css(css) => self.tab.find_elements(css),
            Selector::XPath(xpath) => self.tab.find_elements_by_xpath(xpath),
        })
    }
}

impl Surface for ChromeSurface {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(browser_err)?;
        Ok(())
    }

    fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.tab.get_url())
    }

    fn exists(&self, selector: &Selector) -> Result<bool, DriverError> {
        Ok(!self.find_all(selector)?.is_empty())
    }

    fn wait_for(&mut self, selector: &Selector, timeout: Duration) -> Result<(), DriverError> {
        let found = match selector {
            Selector::Css(css) => self.tab.wait_for_element_with_custom_timeout(css, timeout),
            Selector::XPath(xpath) => self.tab.wait_for_xpath_with_custom_timeout(xpath, timeout),
        };
        match found {
            Ok(_) => Ok(()),
            Err(e) if is_missing(&e) => Err(DriverError::Timeout(selector.to_string())),
            Err(e) => Err(browser_err(e)),
        }
    }

    fn read_text(&self, selector: &Selector) -> Result<String, DriverError> {
        self.find(selector)?.get_inner_text().map_err(browser_err)
    }

    fn read_all(&self, selector: &Selector) -> Result<Vec<String>, DriverError> {
        self.find_all(selector)?
            .iter()
            .map(|el| el.get_inner_text().map_err(browser_err))
            .collect()
    }

    fn read_rows(&self, selector: &Selector) -> Result<Vec<Vec<String>>, DriverError> {
        self.find_all(selector)?
            .iter()
            .map(|row| {
                all_or_empty(row.find_elements("th, td"))?
                    .iter()
                    .map(|cell| cell.get_inner_text().map_err(browser_err))
                    .collect()
            })
            .collect()
    }

    fn fill(&mut self, selector: &Selector, value: &str) -> Result<(), DriverError> {
        let el = self.find(selector)?;
        el.click().map_err(browser_err)?;
        el.call_js_fn("function() { this.value = ''; }", vec![], false)
            .map_err(browser_err)?;
        el.type_into(value).map_err(browser_err)?;
        Ok(())
    }

    fn click(&mut self, selector: &Selector) -> Result<(), DriverError> {
        self.find(selector)?.click().map_err(browser_err)?;
        Ok(())
    }

    fn press(&mut self, selector: &Selector, key: &str) -> Result<(), DriverError> {
        self.find(selector)?.focus().map_err(browser_err)?;
        self.tab.press_key(key).map_err(browser_err)?;
        Ok(())
    }
}
