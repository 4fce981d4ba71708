//! Order workflow: drives the trade ticket from draft to confirmation.
//!
//! Each placement walks a checked state machine:
//!
//! ```text
//! Drafted -> SymbolEntered -> DetailsEntered -> PreviewShown -> Confirmed
//!                                   |                 |-------> DryRunStopped
//!                                   '-> Rejected <----'-------> Rejected
//! ```
//!
//! Nothing before `PreviewShown` has side effects at the brokerage. The submit
//! control is pressed at most once per request: the request's latch closes
//! immediately before the click, and anything that goes wrong afterwards is
//! reported as [`OrderError::AmbiguousSubmission`], never retried.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use regex::Regex;

use crate::driver::Surface;
use crate::error::{DriverError, ExtractionError, OrderError};
use crate::extract::lookup_quote;
use crate::parse::{is_placeholder, parse_money};
use crate::session::{Session, human_pause};
use crate::site::trade;
use crate::types::{
    OrderConfirmation, OrderPreview, OrderRequest, OrderStatus, OrderType, Price, Quote, Side,
    TimeInForce,
};

/// Reject malformed requests before any browser interaction.
pub fn validate(request: &OrderRequest) -> Result<(), OrderError> {
    if request.account_number.trim().is_empty() {
        return Err(OrderError::InvalidRequest("account number is empty".into()));
    }
    if request.symbol.is_empty() {
        return Err(OrderError::InvalidRequest("symbol is empty".into()));
    }
    if !request
        .symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.')
    {
        return Err(OrderError::InvalidRequest(format!(
            "invalid symbol {:?}",
            request.symbol
        )));
    }
    if request.quantity == 0 {
        return Err(OrderError::InvalidRequest("quantity must be positive".into()));
    }
    let order_type = request.order_type;
    check_price(order_type, "limit", order_type.uses_limit_price(), request.limit_price)?;
    check_price(order_type, "stop", order_type.uses_stop_price(), request.stop_price)
}

fn check_price(
    order_type: OrderType,
    kind: &str,
    required: bool,
    price: Option<Price>,
) -> Result<(), OrderError> {
    match (required, price) {
        (true, None) => Err(OrderError::InvalidRequest(format!(
            "{order_type} order requires a {kind} price"
        ))),
        (true, Some(price)) if price.0 <= 0 => Err(OrderError::InvalidRequest(format!(
            "{kind} price must be positive, got {price}"
        ))),
        (false, Some(_)) => Err(OrderError::InvalidRequest(format!(
            "{order_type} order must not carry a {kind} price"
        ))),
        _ => Ok(()),
    }
}

/// Where a placement currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderStep {
    Drafted,
    SymbolEntered { quote: Quote },
    DetailsEntered,
    PreviewShown { preview: OrderPreview },
    Confirmed {
        confirmation_id: String,
        submitted_at: Option<String>,
    },
    DryRunStopped,
    Rejected { reason: String },
}

impl OrderStep {
    pub fn name(&self) -> &'static str {
        match self {
            OrderStep::Drafted => "drafted",
            OrderStep::SymbolEntered { .. } => "symbol entered",
            OrderStep::DetailsEntered => "details entered",
            OrderStep::PreviewShown { .. } => "preview shown",
            OrderStep::Confirmed { .. } => "confirmed",
            OrderStep::DryRunStopped => "dry run stopped",
            OrderStep::Rejected { .. } => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_some()
    }

    /// The placement status a terminal step reports. `None` mid-workflow.
    pub fn status(&self) -> Option<OrderStatus> {
        match self {
            OrderStep::Confirmed { .. } => Some(OrderStatus::Accepted),
            OrderStep::DryRunStopped => Some(OrderStatus::DryRunOnly),
            OrderStep::Rejected { .. } => Some(OrderStatus::Rejected),
            _ => None,
        }
    }

    /// Move to `next`, or fail if the ticket cannot legally go there from here.
    pub fn advance(self, next: OrderStep) -> Result<OrderStep, OrderError> {
        use OrderStep::*;
        let legal = matches!(
            (&self, &next),
            (Drafted, SymbolEntered { .. })
                | (SymbolEntered { .. }, DetailsEntered)
                | (DetailsEntered, PreviewShown { .. } | Rejected { .. })
                | (
                    PreviewShown { .. },
                    Confirmed { .. } | DryRunStopped | Rejected { .. }
                )
        );
        if !legal {
            return Err(OrderError::UnexpectedPage(format!(
                "illegal order step {} -> {}",
                self.name(),
                next.name()
            )));
        }
        debug!("order {} -> {}", self.name(), next.name());
        Ok(next)
    }
}

/// Place `request` through the trade ticket.
///
/// Dry runs stop at the preview and return `DryRunOnly`. A request (or any
/// clone of it) that already reached the submit control fails with
/// `AlreadySubmitted` before touching the browser.
pub fn place_order<S: Surface>(
    session: &mut Session<S>,
    request: &OrderRequest,
    cancel: &AtomicBool,
) -> Result<OrderConfirmation, OrderError> {
    validate(request)?;
    if request.is_submitted() {
        return Err(OrderError::AlreadySubmitted);
    }
    info!(
        "placing {} {} {} x{} in {}{}",
        request.side,
        request.order_type,
        request.symbol,
        request.quantity,
        request.account_number,
        if request.dry_run { " (dry run)" } else { "" }
    );
    OrderWorkflow {
        session,
        request,
        cancel,
        step: OrderStep::Drafted,
    }
    .run()
}

struct OrderWorkflow<'a, S> {
    session: &'a mut Session<S>,
    request: &'a OrderRequest,
    cancel: &'a AtomicBool,
    step: OrderStep,
}

/// What the page showed after the submit click.
enum Outcome {
    Confirmed {
        confirmation_id: String,
        submitted_at: Option<String>,
    },
    Rejected(String),
    Unknown(String),
}

impl<S: Surface> OrderWorkflow<'_, S> {
    fn run(mut self) -> Result<OrderConfirmation, OrderError> {
        self.open_ticket().map_err(|e| self.signed_out_or(e))?;
        let quote = self.enter_symbol().map_err(|e| self.signed_out_or(e))?;
        self.transition(OrderStep::SymbolEntered { quote })?;

        self.enter_details().map_err(|e| self.signed_out_or(e))?;
        self.transition(OrderStep::DetailsEntered)?;

        let preview = match self.preview().map_err(|e| self.signed_out_or(e))? {
            Ok(preview) => preview,
            Err(reason) => {
                self.transition(OrderStep::Rejected {
                    reason: reason.clone(),
                })?;
                return Err(OrderError::Rejected(reason));
            }
        };
        self.transition(OrderStep::PreviewShown {
            preview: preview.clone(),
        })?;

        if self.request.dry_run {
            self.transition(OrderStep::DryRunStopped)?;
            info!("dry run for {} stopped at preview", self.request.symbol);
            return Ok(OrderConfirmation::echo(
                self.request,
                self.terminal_status()?,
                None,
                preview,
                None,
            ));
        }

        match self.submit()? {
            Outcome::Confirmed {
                confirmation_id,
                submitted_at,
            } => {
                self.transition(OrderStep::Confirmed {
                    confirmation_id: confirmation_id.clone(),
                    submitted_at: submitted_at.clone(),
                })
                .map_err(|e| OrderError::AmbiguousSubmission(e.to_string()))?;
                info!("order #{confirmation_id} received for {}", self.request.symbol);
                let status = self
                    .terminal_status()
                    .map_err(|e| OrderError::AmbiguousSubmission(e.to_string()))?;
                Ok(OrderConfirmation::echo(
                    self.request,
                    status,
                    Some(confirmation_id),
                    preview,
                    submitted_at,
                ))
            }
            Outcome::Rejected(reason) => {
                warn!("order rejected after submit: {reason}");
                self.transition(OrderStep::Rejected {
                    reason: reason.clone(),
                })
                .map_err(|e| OrderError::AmbiguousSubmission(e.to_string()))?;
                Err(OrderError::Rejected(reason))
            }
            Outcome::Unknown(what) => {
                warn!("order for {} may be live: {what}", self.request.symbol);
                Err(OrderError::AmbiguousSubmission(what))
            }
        }
    }

    fn transition(&mut self, next: OrderStep) -> Result<(), OrderError> {
        let current = std::mem::replace(&mut self.step, OrderStep::Drafted);
        self.step = current.advance(next)?;
        Ok(())
    }

    fn terminal_status(&self) -> Result<OrderStatus, OrderError> {
        self.step.status().ok_or_else(|| {
            OrderError::UnexpectedPage(format!("order stopped at {}", self.step.name()))
        })
    }

    /// A step that lost its page before submit is `SessionLost` when the
    /// browser landed on the sign-in host.
    fn signed_out_or(&mut self, err: OrderError) -> OrderError {
        if !matches!(
            err,
            OrderError::UnexpectedPage(_)
                | OrderError::SymbolNotTradable(_)
                | OrderError::AccountNotFound(_)
        ) {
            return err;
        }
        match self.session.signed_out() {
            Ok(true) => {
                warn!("signed out at {} while ordering {}", self.step.name(), self.request.symbol);
                OrderError::SessionLost
            }
            Ok(false) => err,
            Err(e) => {
                debug!("could not check for sign-out after {err}: {e}");
                err
            }
        }
    }

    fn check_cancel(&self) -> Result<(), OrderError> {
        if self.cancel.load(Ordering::Acquire) {
            info!("order for {} cancelled at {}", self.request.symbol, self.step.name());
            return Err(OrderError::Cancelled);
        }
        Ok(())
    }

    fn open_ticket(&mut self) -> Result<(), OrderError> {
        self.check_cancel()?;
        let url = self.session.config().site.trade_url.clone();
        self.session.navigate(&url)?;
        if self.session.signed_out()? {
            return Err(OrderError::SessionLost);
        }

        let element = self.session.config().timeouts.element();
        let account = trade::account_option(&self.request.account_number);
        let surface = self.session.surface_mut();
        surface.wait_for(&trade::account_chooser(), element)?;
        surface.click(&trade::account_chooser())?;
        if !self.session.appears(&trade::account_modal())? || !self.session.surface().exists(&account)? {
            return Err(OrderError::AccountNotFound(
                self.request.account_number.clone(),
            ));
        }
        self.session.surface_mut().click(&account)?;
        Ok(())
    }

    fn enter_symbol(&mut self) -> Result<Quote, OrderError> {
        self.check_cancel()?;
        let quote = lookup_quote(self.session, &self.request.symbol)
            .map_err(from_read)?
            .ok_or_else(|| OrderError::SymbolNotTradable(self.request.symbol.clone()))?;

        if self.session.appears(&trade::cannot_complete_modal())? {
            debug!("dismissing trade-cannot-be-completed notice");
            self.session.surface_mut().click(&trade::ok_button())?;
        }
        Ok(quote)
    }

    fn enter_details(&mut self) -> Result<(), OrderError> {
        self.check_cancel()?;
        let request = self.request;
        let element = self.session.config().timeouts.element();
        let side = trade::label(match request.side {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        });
        let order_type = trade::label(match request.order_type {
            OrderType::Market => "Market",
            OrderType::Limit => "Limit",
            OrderType::Stop => "Stop",
            OrderType::StopLimit => "Stop Limit",
        });
        let duration = trade::label(match request.duration {
            TimeInForce::Day => "Day",
            TimeInForce::GoodTillCancelled => "60-day (GTC)",
        });

        let surface = self.session.surface_mut();
        surface.wait_for(&side, element)?;
        surface.click(&side)?;
        surface.fill(&trade::shares(), &request.quantity.to_string())?;
        surface.click(&order_type)?;
        if let Some(price) = request.limit_price {
            surface.fill(&trade::limit_price(), &price.to_field_string())?;
        }
        if let Some(price) = request.stop_price {
            surface.fill(&trade::stop_price(), &price.to_field_string())?;
        }
        surface.click(&duration)?;

        if request.side == Side::Sell && self.session.appears(&trade::cost_basis_checkbox())? {
            debug!("acknowledging cost basis notice");
            let surface = self.session.surface_mut();
            surface.click(&trade::cost_basis_checkbox())?;
            surface.wait_for(&trade::continue_button(), element)?;
            surface.click(&trade::continue_button())?;
        }
        Ok(())
    }

    /// Click Preview. `Ok(Err(reason))` when the ticket shows a warning card instead.
    fn preview(&mut self) -> Result<Result<OrderPreview, String>, OrderError> {
        self.check_cancel()?;
        let element = self.session.config().timeouts.element();
        self.session.surface_mut().click(&trade::preview_button())?;
        if self.request.after_hours && self.session.appears(&trade::continue_button())? {
            debug!("continuing through extended-hours notice");
            self.session.surface_mut().click(&trade::continue_button())?;
        }

        let shown = self
            .session
            .wait_for_any(&[trade::warning_card(), trade::preview_card()], element)?;
        match shown {
            Some(0) => Ok(Err(self.read_warning()?)),
            Some(_) => {
                let text = self.session.surface().read_text(&trade::preview_card())?;
                let preview = parse_preview(&text).ok_or_else(|| {
                    OrderError::UnexpectedPage(format!("unreadable order preview {text:?}"))
                })?;
                debug!("preview: {preview:?}");
                Ok(Ok(preview))
            }
            None => Err(OrderError::UnexpectedPage("no order preview shown".into())),
        }
    }

    /// Press submit once. Errors here are only those that prove the click never happened.
    fn submit(&mut self) -> Result<Outcome, OrderError> {
        self.check_cancel()?;
        let element = self.session.config().timeouts.element();
        self.session
            .surface_mut()
            .wait_for(&trade::submit_order(), element)?;
        human_pause(&self.session.config().pacing);

        if !self.request.latch().close() {
            return Err(OrderError::AlreadySubmitted);
        }
        info!("submitting order for {}", self.request.symbol);
        match self.session.surface_mut().click(&trade::submit_order()) {
            Ok(()) => {}
            Err(DriverError::NotFound(what)) => {
                return Err(OrderError::UnexpectedPage(format!("submit control vanished: {what}")));
            }
            Err(e) => return Ok(Outcome::Unknown(format!("submit click failed: {e}"))),
        }
        Ok(self
            .read_outcome()
            .unwrap_or_else(|e| Outcome::Unknown(format!("reading confirmation failed: {e}"))))
    }

    fn read_outcome(&mut self) -> Result<Outcome, DriverError> {
        let timeout = self.session.config().timeouts.confirmation();
        let shown = self.session.wait_for_any(
            &[trade::confirmation_heading(), trade::warning_card()],
            timeout,
        )?;
        match shown {
            Some(0) => {
                let surface = self.session.surface();
                let heading = surface.read_text(&trade::confirmation_heading())?;
                let Some(confirmation_id) = parse_order_number(&heading) else {
                    return Ok(Outcome::Unknown(format!("unreadable confirmation {heading:?}")));
                };
                let submitted_at = if surface.exists(&trade::confirmation_subheading())? {
                    parse_submitted_at(&surface.read_text(&trade::confirmation_subheading())?)
                } else {
                    None
                };
                Ok(Outcome::Confirmed {
                    confirmation_id,
                    submitted_at,
                })
            }
            Some(_) => Ok(Outcome::Rejected(self.read_warning()?)),
            None if self.session.signed_out()? => {
                Ok(Outcome::Unknown("signed out after submit".into()))
            }
            None => Ok(Outcome::Unknown("no confirmation page".into())),
        }
    }

    /// Warning card text as `header: item; item`.
    fn read_warning(&self) -> Result<String, DriverError> {
        let surface = self.session.surface();
        let header = if surface.exists(&trade::warning_header())? {
            surface.read_text(&trade::warning_header())?
        } else {
            String::new()
        };
        let items = surface.read_all(&trade::warning_items())?;
        let header = header.trim();
        let reason = match (header.is_empty(), items.is_empty()) {
            (true, true) => surface.read_text(&trade::warning_card())?.trim().to_string(),
            (false, true) => header.to_string(),
            (true, false) => items.join("; "),
            (false, false) => format!("{header}: {}", items.join("; ")),
        };
        Ok(reason)
    }
}

fn from_read(e: ExtractionError) -> OrderError {
    match e {
        ExtractionError::Driver(msg) => OrderError::Driver(msg),
        ExtractionError::SessionExpired => OrderError::SessionLost,
        ExtractionError::Cancelled => OrderError::Cancelled,
        other => OrderError::UnexpectedPage(other.to_string()),
    }
}

const PREVIEW_LABELS: [&str; 8] = [
    "Account",
    "Transaction",
    "Shares",
    "Security",
    "Order type",
    "Duration",
    "Commission",
    "Estimated amount",
];

/// Split the preview card's text on its field labels.
///
/// Labels are located in display order, so a label word inside an earlier
/// value (the account name often contains "Account") is not mistaken for the
/// next field. Text after the trailing `*` is the footnote. Returns `None` when
/// the transaction, shares or security label is missing.
pub fn parse_preview(text: &str) -> Option<OrderPreview> {
    let mut found: Vec<Option<(usize, usize)>> = Vec::with_capacity(PREVIEW_LABELS.len());
    let mut cursor = 0;
    for label in PREVIEW_LABELS {
        match text[cursor..].find(label) {
            Some(offset) => {
                let start = cursor + offset;
                cursor = start + label.len();
                found.push(Some((start, cursor)));
            }
            None => found.push(None),
        }
    }
    if found[1].is_none() || found[2].is_none() || found[3].is_none() {
        return None;
    }

    let estimated_end = found[7].map(|(_, end)| end);
    let footnote = estimated_end.and_then(|end| text[end..].find('*').map(|i| end + i));
    let value = |i: usize| -> String {
        let Some((_, start)) = found[i] else {
            return String::new();
        };
        let end = found[i + 1..]
            .iter()
            .flatten()
            .map(|(s, _)| *s)
            .next()
            .or(footnote)
            .unwrap_or(text.len());
        text[start..end.max(start)].trim().to_string()
    };

    let estimated = value(7);
    let estimated_amount = if is_placeholder(&estimated) {
        None
    } else {
        parse_money(&estimated, "estimated amount").ok()
    };
    let note = footnote
        .map(|i| text[i + 1..].trim().to_string())
        .unwrap_or_default();
    Some(OrderPreview {
        account: value(0),
        transaction: value(1),
        shares: value(2),
        security: value(3),
        order_type: value(4),
        duration: value(5),
        commission: value(6),
        estimated_amount,
        note,
    })
}

/// The broker's order number from "Received order #123456".
#[allow(clippy::expect_used)] // compile-time constant pattern
pub fn parse_order_number(text: &str) -> Option<String> {
    static ORDER_NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = ORDER_NUMBER
        .get_or_init(|| Regex::new(r"Received order #(\d+)").expect("order number regex is valid"));
    re.captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// "Submitted on 10/16/2026 at 9:45 A.M. ET" as `10/16/2026 9:45 AM ET`.
#[allow(clippy::expect_used)] // compile-time constant pattern
pub fn parse_submitted_at(text: &str) -> Option<String> {
    static SUBMITTED: OnceLock<Regex> = OnceLock::new();
    let re = SUBMITTED.get_or_init(|| {
        Regex::new(r"Submitted on (\d{2}/\d{2}/\d{4}) at (\d{1,2}:\d{2} [AP]\.M\. ET)")
            .expect("submission time regex is valid")
    });
    let cap = re.captures(text)?;
    let date = cap.get(1)?.as_str();
    let time = cap.get(2)?.as_str().replace('.', "");
    Some(format!("{date} {time}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn market() -> OrderRequest {
        OrderRequest::market("123456", "INTC", Side::Buy, 1)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    #[test]
    fn valid_requests_pass() {
        validate(&market()).unwrap();
        validate(&OrderRequest::limit("123456", "BRK.B", Side::Sell, 2, Price(400_00))).unwrap();
    }

    #[test]
    fn limit_without_price_is_invalid() {
        let req = OrderRequest::new("123456", "INTC", Side::Buy, OrderType::Limit, 1);
        assert!(matches!(validate(&req), Err(OrderError::InvalidRequest(_))));
    }

    #[test]
    fn nonpositive_limit_is_invalid() {
        let req = OrderRequest::limit("123456", "INTC", Side::Buy, 1, Price::ZERO);
        assert!(matches!(validate(&req), Err(OrderError::InvalidRequest(_))));
    }

    #[test]
    fn market_with_limit_price_is_invalid() {
        let req = market().with_limit_price(Price(1_00));
        assert!(matches!(validate(&req), Err(OrderError::InvalidRequest(_))));
    }

    #[test]
    fn stop_orders_need_a_stop_price() {
        validate(&OrderRequest::stop("123456", "INTC", Side::Sell, 1, Price(40_00))).unwrap();
        validate(&OrderRequest::stop_limit("123456", "INTC", Side::Sell, 1, Price(40_00), Price(39_50)))
            .unwrap();

        let bare = OrderRequest::new("123456", "INTC", Side::Sell, OrderType::Stop, 1);
        assert_eq!(
            validate(&bare),
            Err(OrderError::InvalidRequest("STOP order requires a stop price".into()))
        );
        let no_limit = OrderRequest::stop("123456", "INTC", Side::Sell, 1, Price(40_00))
            .with_limit_price(Price(39_50));
        assert!(matches!(validate(&no_limit), Err(OrderError::InvalidRequest(_))));
        let mut stop_limit =
            OrderRequest::stop_limit("123456", "INTC", Side::Sell, 1, Price(40_00), Price(39_50));
        stop_limit.stop_price = Some(Price(-1));
        assert!(matches!(validate(&stop_limit), Err(OrderError::InvalidRequest(_))));
        let market = market().with_stop_price(Price(40_00));
        assert!(matches!(validate(&market), Err(OrderError::InvalidRequest(_))));
    }

    #[test]
    fn bad_fields_are_invalid() {
        let mut req = market();
        req.quantity = 0;
        assert!(validate(&req).is_err());
        let mut req = market();
        req.symbol = "IN TC".into();
        assert!(validate(&req).is_err());
        let mut req = market();
        req.account_number = " ".into();
        assert!(validate(&req).is_err());
    }

    // ========================================================================
    // Step transitions
    // ========================================================================

    #[test]
    fn happy_path_transitions() {
        let preview = OrderPreview::default();
        let step = OrderStep::Drafted
            .advance(OrderStep::SymbolEntered {
                quote: Quote {
                    symbol: "INTC".into(),
                    bid: None,
                    ask: None,
                    last: Price(45_00),
                    retrieved_at: chrono::Utc::now(),
                },
            })
            .and_then(|s| s.advance(OrderStep::DetailsEntered))
            .and_then(|s| s.advance(OrderStep::PreviewShown { preview }))
            .and_then(|s| s.advance(OrderStep::DryRunStopped))
            .unwrap();
        assert!(step.is_terminal());
        assert_eq!(step.status(), Some(OrderStatus::DryRunOnly));
    }

    #[test]
    fn terminal_steps_report_status() {
        let rejected = OrderStep::DetailsEntered
            .advance(OrderStep::Rejected {
                reason: "Insufficient funds".into(),
            })
            .unwrap();
        assert_eq!(rejected.status(), Some(OrderStatus::Rejected));
        let confirmed = OrderStep::Confirmed {
            confirmation_id: "1".into(),
            submitted_at: None,
        };
        assert_eq!(confirmed.status(), Some(OrderStatus::Accepted));
        assert_eq!(OrderStep::DetailsEntered.status(), None);
        assert!(!OrderStep::Drafted.is_terminal());
    }

    #[test]
    fn skipping_preview_is_illegal() {
        let err = OrderStep::DetailsEntered
            .advance(OrderStep::Confirmed {
                confirmation_id: "1".into(),
                submitted_at: None,
            })
            .unwrap_err();
        assert!(matches!(err, OrderError::UnexpectedPage(_)));
        assert!(OrderStep::DryRunStopped.advance(OrderStep::Drafted).is_err());
    }

    // ========================================================================
    // Page text
    // ========================================================================

    const PREVIEW: &str = "Account Joint Brokerage Account — *3456 Transaction Buy Shares 1 \
        Security INTC Intel Corp Order type Market Duration Day Commission $0.00 \
        Estimated amount $45.12 * Market orders may execute at a different price.";

    #[test]
    fn preview_fields() {
        let p = parse_preview(PREVIEW).unwrap();
        assert_eq!(p.account, "Joint Brokerage Account — *3456");
        assert_eq!(p.transaction, "Buy");
        assert_eq!(p.shares, "1");
        assert_eq!(p.security, "INTC Intel Corp");
        assert_eq!(p.order_type, "Market");
        assert_eq!(p.duration, "Day");
        assert_eq!(p.commission, "$0.00");
        assert_eq!(p.estimated_amount, Some(Price(45_12)));
        assert_eq!(p.note, "Market orders may execute at a different price.");
    }

    #[test]
    fn preview_without_optional_fields() {
        let p = parse_preview("Transaction Sell Shares 3 Security VTI").unwrap();
        assert_eq!(p.account, "");
        assert_eq!(p.security, "VTI");
        assert_eq!(p.estimated_amount, None);
        assert_eq!(p.note, "");
    }

    #[test]
    fn preview_missing_core_fields() {
        assert!(parse_preview("Something went wrong").is_none());
        assert!(parse_preview("Transaction Buy Security INTC").is_none());
    }

    #[test]
    fn order_number() {
        assert_eq!(
            parse_order_number("Received order #12345678").as_deref(),
            Some("12345678")
        );
        assert_eq!(parse_order_number("Order received"), None);
    }

    #[test]
    fn submitted_at() {
        assert_eq!(
            parse_submitted_at("Submitted on 10/16/2026 at 9:45 A.M. ET").as_deref(),
            Some("10/16/2026 9:45 AM ET")
        );
        assert_eq!(parse_submitted_at("Submitted today"), None);
    }
}
