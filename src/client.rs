//! Client facade: the one object callers hold.
//!
//! Every call locks the session for its whole duration, so an order's
//! multi-step sequence never interleaves with another navigation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

use crate::config::Config;
use crate::driver::{Launcher, StealthPolicy, Surface};
use crate::error::{ExtractionError, Result};
use crate::extract;
use crate::order;
use crate::session::{Session, SessionManager};
use crate::types::{Account, AuthState, Credentials, Holding, OrderConfirmation, OrderRequest, Quote};

/// Requests cancellation of the call currently running on a [`Client`].
///
/// Reads stop at the next step boundary. An order stops only if the submit
/// control has not been pressed yet. The flag is cleared when the next call starts.
#[derive(Clone, Debug)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Brokerage client over one browser session.
pub struct Client<S> {
    manager: Mutex<SessionManager<S>>,
    cancel: Arc<AtomicBool>,
}

impl<S: Surface> Client<S> {
    /// Validate `config`, apply `stealth`, and launch the browser once.
    pub fn launch<L>(launcher: &L, config: Config, stealth: &dyn StealthPolicy) -> Result<Self>
    where
        L: Launcher<Surface = S>,
    {
        config.validate()?;
        let manager = SessionManager::start(launcher, config, stealth)?;
        Ok(Self {
            manager: Mutex::new(manager),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Lock the session manager and clear any stale cancellation.
    fn begin(&self) -> MutexGuard<'_, SessionManager<S>> {
        let guard = self.manager.lock().unwrap_or_else(PoisonError::into_inner);
        self.cancel.store(false, Ordering::Release);
        guard
    }

    pub fn login(&self, credentials: Credentials) -> Result<AuthState> {
        Ok(self.begin().login(credentials)?)
    }

    pub fn submit_mfa(&self, code: &str) -> Result<AuthState> {
        Ok(self.begin().submit_mfa(code)?)
    }

    pub fn state(&self) -> AuthState {
        self.begin().state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.begin().is_authenticated()
    }

    pub fn accounts(&self) -> Result<Vec<Account>> {
        self.read(extract::accounts)
    }

    pub fn holdings(&self, account_number: &str) -> Result<Vec<Holding>> {
        self.read(|session, cancel| extract::holdings(session, account_number, cancel))
    }

    pub fn quote(&self, symbol: &str) -> Result<Quote> {
        self.read(|session, cancel| extract::quote(session, symbol, cancel))
    }

    /// Place an order. Never retried: a session lost midway is `SessionLost`,
    /// and an unreadable outcome after submit is `AmbiguousSubmission`.
    pub fn place_order(&self, request: &OrderRequest) -> Result<OrderConfirmation> {
        order::validate(request)?;
        let mut manager = self.begin();
        let session = manager.ensure_authenticated()?;
        Ok(order::place_order(session, request, &self.cancel)?)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(Arc::clone(&self.cancel))
    }

    /// Run a read. If the site signed us out midway, sign in again and read once more.
    fn read<T>(
        &self,
        op: impl Fn(&mut Session<S>, &AtomicBool) -> std::result::Result<T, ExtractionError>,
    ) -> Result<T> {
        let mut manager = self.begin();
        let session = manager.ensure_authenticated()?;
        match op(session, &self.cancel) {
            Err(ExtractionError::SessionExpired) => {
                warn!("signed out during read, re-authenticating once");
                let session = manager.ensure_authenticated()?;
                Ok(op(session, &self.cancel)?)
            }
            other => Ok(other?),
        }
    }
}
