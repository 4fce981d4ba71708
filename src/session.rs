//! Session manager: owns the browser session and runs the login/MFA state machine.
//!
//! ```text
//! Unauthenticated --login--> Authenticated
//!                 \--login--> AwaitingMfa --submit_mfa--> Authenticated
//! Authenticated --idle or signed out--> Expired --ensure_authenticated--> re-login
//! any failure --> Unauthenticated
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::Rng;

use crate::config::{Config, PacingConfig, host_of};
use crate::driver::{Launcher, Selector, StealthPolicy, Surface};
use crate::error::{AuthError, DriverError};
use crate::site::login;
use crate::types::{AuthState, Credentials, MfaChannel};

/// A live browser surface plus its authentication state.
///
/// Owned by [`SessionManager`]; extractors and the order workflow borrow it
/// for one operation at a time.
pub struct Session<S> {
    surface: S,
    config: Arc<Config>,
    state: AuthState,
    last_activity: Instant,
}

impl<S: Surface> Session<S> {
    pub(crate) fn new(surface: S, config: Arc<Config>) -> Self {
        Self {
            surface,
            config,
            state: AuthState::Unauthenticated,
            last_activity: Instant::now(),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Time since the last navigation or successful login step.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub(crate) fn surface(&self) -> &S {
        &self.surface
    }

    pub(crate) fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub(crate) fn set_state(&mut self, state: AuthState) {
        if self.state != state {
            info!("session {} -> {}", self.state, state);
            self.state = state;
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Load a page and count it as activity.
    pub(crate) fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        debug!("navigate {url}");
        self.surface.navigate(url)?;
        self.touch();
        Ok(())
    }

    /// True if the current page sits on the login host. An authenticated
    /// session that lands there was signed out by the site and becomes `Expired`.
    pub(crate) fn signed_out(&mut self) -> Result<bool, DriverError> {
        let url = self.surface.current_url()?;
        let on_login = host_of(&url) == self.config.site.login_host();
        if on_login && self.state == AuthState::Authenticated {
            warn!("redirected to sign-in page, session expired");
            self.set_state(AuthState::Expired);
        }
        Ok(on_login)
    }

    /// Poll until one of `selectors` is present. Returns its index, or `None`
    /// once `timeout` passes.
    pub(crate) fn wait_for_any(
        &self,
        selectors: &[Selector],
        timeout: Duration,
    ) -> Result<Option<usize>, DriverError> {
        let deadline = Instant::now() + timeout;
        let interval = self
            .config
            .session
            .poll_interval()
            .max(Duration::from_millis(1));
        loop {
            for (i, selector) in selectors.iter().enumerate() {
                if self.surface.exists(selector)? {
                    return Ok(Some(i));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(interval);
        }
    }

    /// Short wait for an optional element (modal, prompt).
    pub(crate) fn appears(&self, selector: &Selector) -> Result<bool, DriverError> {
        let probe = self.config.timeouts.probe();
        Ok(self
            .wait_for_any(std::slice::from_ref(selector), probe)?
            .is_some())
    }
}

/// What the login flow is currently showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoginPage {
    Dashboard,
    Rejected,
    CodeEntry,
    PhoneChooser,
    ChannelChooser,
    DeliveryChooser,
    PushPrompt,
    CredentialForm,
    Challenge,
}

/// Probe order. Earlier entries win when several markers are present.
const PROBE_ORDER: [LoginPage; 9] = [
    LoginPage::Dashboard,
    LoginPage::Rejected,
    LoginPage::CodeEntry,
    LoginPage::PhoneChooser,
    LoginPage::ChannelChooser,
    LoginPage::DeliveryChooser,
    LoginPage::PushPrompt,
    LoginPage::CredentialForm,
    LoginPage::Challenge,
];

/// Owns the [`Session`] and the credentials needed to re-establish it.
pub struct SessionManager<S> {
    session: Session<S>,
    credentials: Option<Credentials>,
}

impl<S: Surface> SessionManager<S> {
    /// Wrap an already-launched surface. No stealth policy is applied.
    pub fn new(surface: S, config: Config) -> Self {
        Self {
            session: Session::new(surface, Arc::new(config)),
            credentials: None,
        }
    }

    /// Apply `stealth` to the browser config, then launch once.
    pub fn start<L>(launcher: &L, config: Config, stealth: &dyn StealthPolicy) -> Result<Self, AuthError>
    where
        L: Launcher<Surface = S>,
    {
        let mut browser = config.browser.clone();
        stealth.apply(&mut browser)?;
        info!(
            "launching browser (headless={}, viewport={}x{}, stealth={})",
            browser.headless, browser.viewport_width, browser.viewport_height, browser.stealth
        );
        let surface = launcher.launch(&browser)?;
        Ok(Self::new(surface, config))
    }

    pub fn state(&self) -> AuthState {
        self.session.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.state == AuthState::Authenticated
    }

    pub fn config(&self) -> &Config {
        &self.session.config
    }

    /// Sign in. Returns `Authenticated`, or `AwaitingMfa` when a one-time code was sent.
    ///
    /// Credentials are kept in memory for automatic re-login once a sign-in
    /// succeeds and dropped if the site rejects them. Any failure leaves the
    /// session `Unauthenticated`.
    pub fn login(&mut self, credentials: Credentials) -> Result<AuthState, AuthError> {
        info!("signing in as {}", credentials.username);
        match self.run_login(&credentials) {
            Ok(state) => {
                self.credentials = Some(credentials);
                self.session.touch();
                self.session.set_state(state);
                Ok(state)
            }
            Err(e) => {
                warn!("sign-in failed: {e}");
                if e == AuthError::InvalidCredentials {
                    self.credentials = None;
                }
                self.session.set_state(AuthState::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Enter the one-time code. Only valid while `AwaitingMfa`.
    pub fn submit_mfa(&mut self, code: &str) -> Result<AuthState, AuthError> {
        if self.session.state != AuthState::AwaitingMfa {
            return Err(AuthError::InvalidState(self.session.state));
        }
        match self.run_mfa(code.trim()) {
            Ok(()) => {
                self.session.touch();
                self.session.set_state(AuthState::Authenticated);
                Ok(AuthState::Authenticated)
            }
            Err(e) => {
                warn!("security code step failed: {e}");
                self.session.set_state(AuthState::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Hand out the session, signing in again first if it expired.
    ///
    /// A fresh authenticated session is returned without touching the browser.
    pub fn ensure_authenticated(&mut self) -> Result<&mut Session<S>, AuthError> {
        if self.is_fresh() {
            return Ok(&mut self.session);
        }
        match self.session.state {
            AuthState::AwaitingMfa => return Err(AuthError::InvalidState(AuthState::AwaitingMfa)),
            AuthState::Authenticated => {
                info!("session idle for {:?}, treating as expired", self.session.idle_for());
                self.session.set_state(AuthState::Expired);
            }
            AuthState::Unauthenticated | AuthState::Expired => {}
        }
        if self.session.state == AuthState::Expired {
            self.session.set_state(AuthState::Unauthenticated);
        }

        let Some(credentials) = self.credentials.clone() else {
            return Err(AuthError::InvalidState(self.session.state));
        };
        info!("re-establishing session");
        match self.login(credentials)? {
            AuthState::Authenticated => Ok(&mut self.session),
            state => Err(AuthError::InvalidState(state)),
        }
    }

    fn is_fresh(&self) -> bool {
        self.session.state == AuthState::Authenticated
            && self.session.idle_for() < self.config().session.inactivity_timeout()
    }

    fn run_login(&mut self, credentials: &Credentials) -> Result<AuthState, AuthError> {
        let page = match self.open_login_page()? {
            LoginPage::Dashboard => {
                info!("already signed in");
                return Ok(AuthState::Authenticated);
            }
            LoginPage::CredentialForm | LoginPage::Rejected => {
                self.enter_credentials(credentials)?;
                self.classify(&[LoginPage::CredentialForm])?
            }
            other => other,
        };
        self.walk_mfa(page, credentials)
    }

    /// Navigate to the login page and classify it, retrying from scratch on
    /// an unrecognized layout. Nothing has been typed yet, so retrying is safe.
    fn open_login_page(&mut self) -> Result<LoginPage, AuthError> {
        let retries = self.config().session.max_layout_retries;
        let login_url = self.config().site.login_url.clone();
        let mut attempt = 0;
        loop {
            self.session.navigate(&login_url)?;
            match self.classify(&[]) {
                Err(AuthError::UnexpectedPage(what)) if attempt < retries => {
                    attempt += 1;
                    warn!("unrecognized login page ({what}), retry {attempt}/{retries}");
                }
                other => return other,
            }
        }
    }

    fn enter_credentials(&mut self, credentials: &Credentials) -> Result<(), AuthError> {
        let element = self.config().timeouts.element();
        let pacing = self.config().pacing.clone();
        let surface = self.session.surface_mut();
        surface.wait_for(&login::username(), element)?;
        surface.fill(&login::username(), &credentials.username)?;
        surface.fill(&login::password(), &credentials.password)?;
        human_pause(&pacing);
        surface.click(&login::submit())?;
        debug!("credentials submitted");
        Ok(())
    }

    /// Walk the MFA delivery prompts until the dashboard or the code field shows.
    /// Each prompt is handled at most once, so the walk always ends.
    fn walk_mfa(&mut self, mut page: LoginPage, credentials: &Credentials) -> Result<AuthState, AuthError> {
        let delivery = credentials.mfa.clone().unwrap_or_default();
        let mut handled = vec![LoginPage::CredentialForm];
        loop {
            let surface = self.session.surface_mut();
            match page {
                LoginPage::Dashboard => return Ok(AuthState::Authenticated),
                LoginPage::CodeEntry => {
                    info!("security code requested");
                    return Ok(AuthState::AwaitingMfa);
                }
                LoginPage::Rejected => return Err(AuthError::InvalidCredentials),
                LoginPage::CredentialForm | LoginPage::Challenge => {
                    return Err(AuthError::UnexpectedPage(format!("{page:?} after sign-in")));
                }
                LoginPage::PushPrompt => {
                    debug!("declining app push");
                    surface.click(&login::no_app_link())?;
                    if self.session.appears(&login::continue_button())? {
                        self.session.surface_mut().click(&login::continue_button())?;
                    }
                }
                LoginPage::DeliveryChooser => {
                    debug!("choosing text/call delivery");
                    surface.click(&login::code_delivery_option())?;
                }
                LoginPage::PhoneChooser => {
                    let card = match &delivery.phone_last_four {
                        Some(last_four) => login::phone_card(last_four),
                        None => login::phone_cards(),
                    };
                    debug!("choosing phone {card}");
                    surface.click(&card)?;
                }
                LoginPage::ChannelChooser => {
                    let channel = match delivery.channel {
                        MfaChannel::Text => login::text_channel(),
                        MfaChannel::Call => login::call_channel(),
                    };
                    surface.click(&channel)?;
                }
            }
            handled.push(page);
            page = self.classify(&handled)?;
        }
    }

    fn run_mfa(&mut self, code: &str) -> Result<(), AuthError> {
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::InvalidMfaCode);
        }
        let element = self.config().timeouts.element();
        let polls = self.config().session.login_polls;
        let surface = self.session.surface_mut();
        surface.wait_for(&login::code_field(), element)?;
        surface.fill(&login::code_field(), code)?;
        if surface.exists(&login::no_remember_device())? {
            surface.click(&login::no_remember_device())?;
        }
        surface.click(&login::code_submit())?;

        for poll in 0..polls {
            if poll > 0 {
                thread::sleep(self.config().session.poll_interval());
            }
            if self.probe(&[])? == Some(LoginPage::Dashboard) {
                return Ok(());
            }
            if self.session.surface().exists(&login::code_rejected())? {
                return Err(AuthError::InvalidMfaCode);
            }
        }
        Err(AuthError::Timeout("dashboard after security code".into()))
    }

    /// Poll the page until it matches a known login state outside `exclude`.
    /// A bot-detection challenge keeps the poll going until the budget is spent.
    fn classify(&self, exclude: &[LoginPage]) -> Result<LoginPage, AuthError> {
        let polls = self.config().session.login_polls;
        let mut challenged = false;
        for poll in 0..polls {
            if poll > 0 {
                thread::sleep(self.config().session.poll_interval());
            }
            match self.probe(exclude)? {
                Some(LoginPage::Challenge) => {
                    if !challenged {
                        warn!("bot-detection challenge shown, waiting for it to clear");
                        challenged = true;
                    }
                }
                Some(page) => {
                    debug!("login page is {page:?}");
                    return Ok(page);
                }
                None => {}
            }
        }
        if challenged {
            return Err(AuthError::Timeout("bot-detection challenge did not clear".into()));
        }
        let url = self.session.surface().current_url()?;
        Err(AuthError::UnexpectedPage(url))
    }

    fn probe(&self, exclude: &[LoginPage]) -> Result<Option<LoginPage>, DriverError> {
        let url = self.session.surface().current_url()?;
        for page in PROBE_ORDER {
            if !exclude.contains(&page) && self.shows(page, &url)? {
                return Ok(Some(page));
            }
        }
        Ok(None)
    }

    fn shows(&self, page: LoginPage, url: &str) -> Result<bool, DriverError> {
        let surface = self.session.surface();
        let site = &self.config().site;
        Ok(match page {
            LoginPage::Dashboard => {
                url.starts_with(&site.dashboard_url) && surface.exists(&login::dashboard_heading())?
            }
            LoginPage::Rejected => surface.exists(&login::rejected_banner())?,
            LoginPage::CodeEntry => surface.exists(&login::code_field())?,
            LoginPage::PhoneChooser => surface.exists(&login::phone_cards())?,
            LoginPage::ChannelChooser => {
                surface.exists(&login::text_channel())? || surface.exists(&login::call_channel())?
            }
            LoginPage::DeliveryChooser => surface.exists(&login::code_delivery_option())?,
            LoginPage::PushPrompt => surface.exists(&login::no_app_link())?,
            LoginPage::CredentialForm => surface.exists(&login::username())?,
            LoginPage::Challenge => host_of(url) == site.challenge_host,
        })
    }
}

/// Randomized pause between typing and submitting, within the configured range.
/// A minimum above the maximum is clamped down to it.
pub(crate) fn human_pause(pacing: &PacingConfig) {
    if pacing.max_pause_ms == 0 {
        return;
    }
    let min = pacing.min_pause_ms.min(pacing.max_pause_ms);
    let ms = rand::rng().random_range(min..=pacing.max_pause_ms);
    thread::sleep(Duration::from_millis(ms));
}
