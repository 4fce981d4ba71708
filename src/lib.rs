// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! # vgweb
//!
//! Typed brokerage automation over a headless browser: sign in (with a
//! one-time code when the site asks), read accounts, holdings and quotes, and
//! place orders through the web trade ticket.
//!
//! ## Quick Start
//!
//! ```ignore
//! use vgweb::chrome::ChromeLauncher;
//! use vgweb::{AuthState, Client, Config, Credentials, OrderRequest, Side, StandardStealth};
//!
//! let client = Client::launch(&ChromeLauncher::default(), Config::default(), &StandardStealth::default())?;
//! if client.login(Credentials::new("user", "pass"))? == AuthState::AwaitingMfa {
//!     client.submit_mfa("123456")?;
//! }
//!
//! for account in client.accounts()? {
//!     println!("{} {}", account.number, account.total_value);
//! }
//!
//! let order = OrderRequest::market("123456", "INTC", Side::Buy, 1).with_dry_run(true);
//! let confirmation = client.place_order(&order)?;
//! assert_eq!(confirmation.confirmation_id, None);
//! ```
//!
//! ## Guarantees
//!
//! - Invalid order requests fail before the browser is touched.
//! - The final submit control is pressed at most once per [`OrderRequest`]
//!   (clones included). Dry runs never press it.
//! - An order whose outcome cannot be read after submit is reported as
//!   [`OrderError::AmbiguousSubmission`] and never retried.
//! - Reads either return a complete snapshot or a typed error.
//!
//! ## Price Representation
//!
//! Money is stored as [`i64`] cents:
//!
//! ```
//! use vgweb::Price;
//!
//! let price = Price(100_50);  // $100.50
//! assert_eq!(format!("{}", price), "$100.50");
//! ```

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod mock;
pub mod order;
pub mod parse;
pub mod session;
pub mod site;
pub mod types;

#[cfg(feature = "chrome")]
pub mod chrome;

pub use client::{CancelHandle, Client};
pub use config::Config;
pub use driver::{BrowserConfig, Launcher, NoStealth, Selector, StandardStealth, StealthPolicy, Surface};
pub use error::{AuthError, DriverError, Error, ExtractionError, OrderError, Result};
pub use order::OrderStep;
pub use session::{Session, SessionManager};
pub use types::{
    Account, AuthState, Credentials, Holding, MfaChannel, MfaDelivery, OrderConfirmation,
    OrderPreview, OrderRequest, OrderStatus, OrderType, Price, Quote, Side, TimeInForce,
};
