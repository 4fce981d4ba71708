//! Error types.
//!
//! One enum per concern (surface, authentication, extraction, orders) plus the
//! crate-level [`Error`] the client returns.

use std::path::PathBuf;

use crate::types::AuthState;

/// Failures reported by the automation surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("browser error: {0}")]
    Browser(String),
}

/// Login and MFA failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("login rejected: invalid username or password")]
    InvalidCredentials,

    #[error("security code rejected")]
    InvalidMfaCode,

    #[error("operation not valid while session is {0}")]
    InvalidState(AuthState),

    #[error("unrecognized page during login: {0}")]
    UnexpectedPage(String),

    #[error("timed out during login: {0}")]
    Timeout(String),

    #[error("browser failure during login: {0}")]
    Driver(String),
}

impl From<DriverError> for AuthError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::Timeout(what) => AuthError::Timeout(what),
            DriverError::NotFound(what) => AuthError::UnexpectedPage(format!("missing {what}")),
            DriverError::Browser(msg) => AuthError::Driver(msg),
        }
    }
}

/// Failures turning a rendered page into typed records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("cannot parse {field} from {value:?}")]
    ParseError { field: String, value: String },

    #[error("account {0} not found on page")]
    UnknownAccount(String),

    #[error("session expired while reading")]
    SessionExpired,

    #[error("read cancelled")]
    Cancelled,

    #[error("browser failure while reading: {0}")]
    Driver(String),
}

impl ExtractionError {
    pub(crate) fn parse(field: impl Into<String>, value: impl Into<String>) -> Self {
        ExtractionError::ParseError {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Layout or timing hiccup worth one more fresh read.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExtractionError::ElementNotFound(_))
    }
}

impl From<DriverError> for ExtractionError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::NotFound(what) | DriverError::Timeout(what) => {
                ExtractionError::ElementNotFound(what)
            }
            DriverError::Browser(msg) => ExtractionError::Driver(msg),
        }
    }
}

/// Order workflow failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("invalid order request: {0}")]
    InvalidRequest(String),

    #[error("symbol not tradable: {0}")]
    SymbolNotTradable(String),

    #[error("order rejected: {0}")]
    Rejected(String),

    /// Submit was pressed but the outcome could not be read. The order may be live.
    #[error("order may have been submitted but the result is unknown: {0}")]
    AmbiguousSubmission(String),

    #[error("session lost before the order was submitted")]
    SessionLost,

    #[error("unrecognized page during order entry: {0}")]
    UnexpectedPage(String),

    #[error("account {0} not offered on the trade ticket")]
    AccountNotFound(String),

    #[error("order request was already submitted")]
    AlreadySubmitted,

    #[error("order cancelled before submission")]
    Cancelled,

    #[error("browser failure during order entry: {0}")]
    Driver(String),
}

impl From<DriverError> for OrderError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::NotFound(what) | DriverError::Timeout(what) => {
                OrderError::UnexpectedPage(what)
            }
            DriverError::Browser(msg) => OrderError::Driver(msg),
        }
    }
}

/// All errors the client can return.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
