//! Core types: Price, Side, credentials, account/holding/quote snapshots, orders.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Money in cents.
///
/// `Price(10050)` represents $100.50. Page values are parsed straight into
/// cents so no floating-point rounding leaks into balances or limit prices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(pub i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Form-field text, e.g. `"101.25"`.
    pub fn to_field_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{sign}{}.{:02}", (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / 100;
        let cents = (self.0 % 100).abs();
        if self.0 < 0 {
            write!(f, "-${}.{:02}", dollars.abs(), cents)
        } else {
            write!(f, "${}.{:02}", dollars, cents)
        }
    }
}

/// Buy or sell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Price type on the ticket. Prices live on [`OrderRequest::limit_price`]
/// and [`OrderRequest::stop_price`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

impl OrderType {
    pub fn uses_limit_price(self) -> bool {
        matches!(self, OrderType::Limit | OrderType::StopLimit)
    }

    pub fn uses_stop_price(self) -> bool {
        matches!(self, OrderType::Stop | OrderType::StopLimit)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Stop => write!(f, "STOP"),
            OrderType::StopLimit => write!(f, "STOP LIMIT"),
        }
    }
}

/// How long an order stays working. The trade ticket offers exactly these two.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
    #[default]
    Day,
    GoodTillCancelled,
}

/// How the one-time code should be delivered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MfaChannel {
    #[default]
    Text,
    Call,
}

/// MFA delivery preference: which phone on file, and text or call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MfaDelivery {
    /// Last four digits of the phone number registered with the brokerage.
    pub phone_last_four: Option<String>,
    pub channel: MfaChannel,
}

/// Login credentials. Held in memory only; `Debug` redacts the password.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub mfa: Option<MfaDelivery>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mfa: None,
        }
    }

    /// Deliver the one-time code by text/call to the phone ending in `last_four`.
    pub fn with_mfa(mut self, last_four: impl Into<String>, channel: MfaChannel) -> Self {
        self.mfa = Some(MfaDelivery {
            phone_last_four: Some(last_four.into()),
            channel,
        });
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("mfa", &self.mfa)
            .finish()
    }
}

/// Authentication state of the browser session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    #[default]
    Unauthenticated,
    AwaitingMfa,
    Authenticated,
    Expired,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
            AuthState::AwaitingMfa => write!(f, "awaiting MFA code"),
            AuthState::Authenticated => write!(f, "authenticated"),
            AuthState::Expired => write!(f, "expired"),
        }
    }
}

/// Account snapshot from the holdings page. Never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub number: String,
    pub nickname: String,
    /// Account kind as labelled on the page, e.g. "Brokerage Account".
    pub kind: String,
    pub cash_balance: Price,
    pub total_value: Price,
    pub as_of: DateTime<Utc>,
}

/// One position row within an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    pub account_number: String,
    /// Table section the row sits in ("ETFs", "Mutual funds", ...).
    pub section: String,
    pub symbol: String,
    pub description: String,
    /// Shares held. Fractional for mutual funds.
    pub quantity: f64,
    pub price: Price,
    pub value: Price,
    pub cost_basis: Option<Price>,
}

/// Live quote. Ephemeral: always a fresh read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub bid: Option<Price>,
    pub ask: Option<Price>,
    pub last: Price,
    pub retrieved_at: DateTime<Utc>,
}

/// At-most-once submission latch, shared by an order request and its clones.
#[derive(Clone, Debug, Default)]
pub(crate) struct SubmissionLatch(Arc<AtomicBool>);

impl SubmissionLatch {
    /// Close the latch. Returns false if it was already closed.
    pub(crate) fn close(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// An order to place through the trade ticket.
///
/// Clones share the submission latch: once any of them reaches the final
/// submit control, every copy is spent.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub account_number: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: u64,
    /// Required iff `order_type` is `Limit` or `StopLimit`.
    pub limit_price: Option<Price>,
    /// Required iff `order_type` is `Stop` or `StopLimit`.
    pub stop_price: Option<Price>,
    pub duration: TimeInForce,
    /// Continue through the extended-hours notice when it appears.
    pub after_hours: bool,
    /// Stop at the preview; never press submit.
    pub dry_run: bool,
    #[serde(skip)]
    latch: SubmissionLatch,
}

impl OrderRequest {
    pub fn new(
        account_number: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        order_type: OrderType,
        quantity: u64,
    ) -> Self {
        Self {
            account_number: account_number.into(),
            symbol: symbol.into(),
            side,
            order_type,
            quantity,
            limit_price: None,
            stop_price: None,
            duration: TimeInForce::Day,
            after_hours: false,
            dry_run: false,
            latch: SubmissionLatch::default(),
        }
    }

    pub fn market(
        account_number: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: u64,
    ) -> Self {
        Self::new(account_number, symbol, side, OrderType::Market, quantity)
    }

    pub fn limit(
        account_number: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: u64,
        limit_price: Price,
    ) -> Self {
        Self::new(account_number, symbol, side, OrderType::Limit, quantity)
            .with_limit_price(limit_price)
    }

    /// Triggers a market order once `stop_price` trades.
    pub fn stop(
        account_number: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: u64,
        stop_price: Price,
    ) -> Self {
        Self::new(account_number, symbol, side, OrderType::Stop, quantity).with_stop_price(stop_price)
    }

    /// Triggers a limit order at `limit_price` once `stop_price` trades.
    pub fn stop_limit(
        account_number: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: u64,
        stop_price: Price,
        limit_price: Price,
    ) -> Self {
        Self::new(account_number, symbol, side, OrderType::StopLimit, quantity)
            .with_stop_price(stop_price)
            .with_limit_price(limit_price)
    }

    pub fn with_limit_price(mut self, price: Price) -> Self {
        self.limit_price = Some(price);
        self
    }

    pub fn with_stop_price(mut self, price: Price) -> Self {
        self.stop_price = Some(price);
        self
    }

    pub fn with_duration(mut self, duration: TimeInForce) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_after_hours(mut self, after_hours: bool) -> Self {
        self.after_hours = after_hours;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// True once the final submit control has been pressed for this order.
    pub fn is_submitted(&self) -> bool {
        self.latch.is_closed()
    }

    pub(crate) fn latch(&self) -> &SubmissionLatch {
        &self.latch
    }
}

/// The preview card shown before final submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderPreview {
    pub account: String,
    pub transaction: String,
    pub shares: String,
    pub security: String,
    pub order_type: String,
    pub duration: String,
    pub commission: String,
    pub estimated_amount: Option<Price>,
    pub note: String,
}

/// Status of a placement that reached a terminal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
    Accepted,
    /// The workflow surfaces these as `OrderError::Rejected`.
    Rejected,
    DryRunOnly,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Accepted => write!(f, "ACCEPTED"),
            OrderStatus::Rejected => write!(f, "REJECTED"),
            OrderStatus::DryRunOnly => write!(f, "DRY RUN"),
        }
    }
}

/// Result of a placement: the request echoed back plus what the site said.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderConfirmation {
    pub account_number: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: u64,
    pub limit_price: Option<Price>,
    pub stop_price: Option<Price>,
    pub status: OrderStatus,
    /// Broker-assigned order number. `None` for dry runs.
    pub confirmation_id: Option<String>,
    pub preview: OrderPreview,
    /// "MM/DD/YYYY H:MM AM ET" as read from the confirmation page.
    pub submitted_at: Option<String>,
}

impl OrderConfirmation {
    pub(crate) fn echo(
        request: &OrderRequest,
        status: OrderStatus,
        confirmation_id: Option<String>,
        preview: OrderPreview,
        submitted_at: Option<String>,
    ) -> Self {
        Self {
            account_number: request.account_number.clone(),
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            limit_price: request.limit_price,
            stop_price: request.stop_price,
            status,
            confirmation_id,
            preview,
            submitted_at,
        }
    }
}
