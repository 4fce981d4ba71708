//! Data extractors: turn the holdings page and trade ticket into typed records.
//!
//! The `parse_*` functions are pure and see only cell texts. The navigating
//! functions feed them and never return a partial result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chrono::Utc;
use log::{debug, warn};
use rustc_hash::FxHashSet;

use crate::driver::Surface;
use crate::error::ExtractionError;
use crate::parse::{is_placeholder, parse_money, parse_quantity};
use crate::session::Session;
use crate::site::{holdings, trade};
use crate::types::{Account, Holding, Price, Quote};

/// Account panel title split into (nickname, kind, number).
///
/// Titles look like `Joint — Brokerage Account — *1234`. Only brokerage
/// accounts are tradable here, so anything else yields `None`.
pub fn parse_account_header(text: &str) -> Option<(String, String, String)> {
    let parts: Vec<&str> = text.split('—').map(str::trim).collect();
    let [nickname, kind, number] = parts.as_slice() else {
        return None;
    };
    if !kind.to_lowercase().contains("brokerage") {
        return None;
    }
    let number = number.trim_start_matches('*').trim();
    if number.is_empty() {
        return None;
    }
    Some((nickname.to_string(), kind.to_string(), number.to_string()))
}

/// One account's holdings table.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountTable {
    /// Sum of the cash and money-market sections.
    pub cash: Price,
    /// From the total row, or the sum of position values when there is none.
    pub total: Price,
    pub holdings: Vec<Holding>,
}

/// Position row layout: `[expander, symbol, description, price, $ change,
/// % change, quantity, value?, cost basis?]`.
const SYMBOL: usize = 1;
const DESCRIPTION: usize = 2;
const PRICE: usize = 3;
const QUANTITY: usize = 6;
const VALUE: usize = 7;
const COST_BASIS: usize = 8;

/// Parse the rows of one account's table (all `tbody`s, in order).
///
/// Rows are section titles (one cell), column headers (a `Symbol` cell),
/// positions, and a trailing `Total` row. A row that fits none of these is a
/// `ParseError`, as is a symbol seen twice.
pub fn parse_account_table(
    account_number: &str,
    rows: &[Vec<String>],
) -> Result<AccountTable, ExtractionError> {
    let mut section = String::new();
    let mut holdings: Vec<Holding> = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut cash = Price::ZERO;
    let mut total = None;

    for row in rows {
        let cells: Vec<&str> = row.iter().map(|c| c.trim()).collect();
        let filled: Vec<&str> = cells.iter().copied().filter(|c| !c.is_empty()).collect();
        let Some(first) = filled.first() else {
            continue;
        };

        if first.to_lowercase().starts_with("total") {
            total = Some(parse_total(&filled)?);
        } else if cells.iter().any(|c| c.eq_ignore_ascii_case("symbol")) {
            continue;
        } else if filled.len() == 1 {
            section = first.to_string();
        } else if cells.len() > QUANTITY {
            let holding = parse_position(account_number, &section, &cells)?;
            if !seen.insert(holding.symbol.clone()) {
                return Err(ExtractionError::parse("symbol", holding.symbol));
            }
            if holding.quantity <= 0.0 {
                debug!("skipping closed position {} in {account_number}", holding.symbol);
                continue;
            }
            if is_cash_section(&section) {
                cash = add_money(cash, holding.value, "cash")?;
            }
            holdings.push(holding);
        } else {
            return Err(ExtractionError::parse("row", cells.join(" | ")));
        }
    }

    let total = match total {
        Some(total) => total,
        None => holdings
            .iter()
            .try_fold(Price::ZERO, |sum, h| add_money(sum, h.value, "total"))?,
    };
    debug!(
        "account {account_number}: {} holdings, cash {cash}, total {total}",
        holdings.len()
    );
    Ok(AccountTable {
        cash,
        total,
        holdings,
    })
}

fn add_money(a: Price, b: Price, field: &str) -> Result<Price, ExtractionError> {
    a.0.checked_add(b.0)
        .map(Price)
        .ok_or_else(|| ExtractionError::parse(field, format!("{a} + {b}")))
}

fn is_cash_section(section: &str) -> bool {
    let s = section.to_lowercase();
    s.contains("cash") || s.contains("money market")
}

fn parse_total(cells: &[&str]) -> Result<Price, ExtractionError> {
    let joined = cells.join(" ");
    joined
        .split_whitespace()
        .rev()
        .find_map(|token| parse_money(token, "total").ok())
        .ok_or_else(|| ExtractionError::parse("total", joined.clone()))
}

fn parse_position(
    account_number: &str,
    section: &str,
    cells: &[&str],
) -> Result<Holding, ExtractionError> {
    let symbol = cells[SYMBOL];
    if symbol.is_empty() {
        return Err(ExtractionError::parse("symbol", cells.join(" | ")));
    }
    let price = parse_money(cells[PRICE], "price")?;
    let quantity = parse_quantity(cells[QUANTITY], "quantity")?;
    let value = match cells.get(VALUE) {
        Some(v) if !is_placeholder(v) => parse_money(v, "value")?,
        _ => Price((price.0 as f64 * quantity).round() as i64),
    };
    let cost_basis = match cells.get(COST_BASIS) {
        Some(c) if !is_placeholder(c) => Some(parse_money(c, "cost_basis")?),
        _ => None,
    };
    Ok(Holding {
        account_number: account_number.to_string(),
        section: section.to_string(),
        symbol: symbol.to_string(),
        description: cells[DESCRIPTION].to_string(),
        quantity,
        price,
        value,
        cost_basis,
    })
}

/// Build a quote from the trade ticket's label/value pairs.
///
/// Returns `Ok(None)` while the last price still shows a placeholder. When no
/// label names the last price, the second value is taken as it.
pub fn parse_quote(
    symbol: &str,
    labels: &[String],
    values: &[String],
) -> Result<Option<Quote>, ExtractionError> {
    if values.is_empty() {
        return Err(ExtractionError::ElementNotFound(format!("quote values for {symbol}")));
    }
    let find = |names: &[&str]| {
        labels
            .iter()
            .position(|l| {
                let l = l.trim().to_lowercase();
                names.iter().any(|n| l.starts_with(n))
            })
            .and_then(|i| values.get(i))
    };
    let optional = |text: Option<&String>, field: &str| match text {
        Some(t) if !is_placeholder(t) => parse_money(t, field).map(Some),
        _ => Ok(None),
    };

    let Some(last_text) = find(&["last", "price"]).or_else(|| values.get(1)) else {
        return Err(ExtractionError::ElementNotFound(format!("last price for {symbol}")));
    };
    if is_placeholder(last_text) {
        return Ok(None);
    }
    Ok(Some(Quote {
        symbol: symbol.to_string(),
        bid: optional(find(&["bid"]), "bid")?,
        ask: optional(find(&["ask"]), "ask")?,
        last: parse_money(last_text, "last")?,
        retrieved_at: Utc::now(),
    }))
}

/// All brokerage accounts on the holdings page.
pub fn accounts<S: Surface>(
    session: &mut Session<S>,
    cancel: &AtomicBool,
) -> Result<Vec<Account>, ExtractionError> {
    with_retries(session, cancel, |session| {
        let panels = load_holdings_page(session)?;
        let as_of = Utc::now();
        let mut accounts = Vec::new();
        for (index, header) in panels.iter().enumerate() {
            check_cancel(cancel)?;
            let Some((nickname, kind, number)) = parse_account_header(header) else {
                debug!("skipping non-brokerage panel {header:?}");
                continue;
            };
            let table = read_table(session, index, &number)?;
            accounts.push(Account {
                number,
                nickname,
                kind,
                cash_balance: table.cash,
                total_value: table.total,
                as_of,
            });
        }
        Ok(accounts)
    })
}

/// Positions held in one account.
pub fn holdings<S: Surface>(
    session: &mut Session<S>,
    account_number: &str,
    cancel: &AtomicBool,
) -> Result<Vec<Holding>, ExtractionError> {
    with_retries(session, cancel, |session| {
        let panels = load_holdings_page(session)?;
        let index = panels
            .iter()
            .position(|h| {
                parse_account_header(h).is_some_and(|(_, _, number)| number == account_number)
            })
            .ok_or_else(|| ExtractionError::UnknownAccount(account_number.to_string()))?;
        Ok(read_table(session, index, account_number)?.holdings)
    })
}

/// A fresh quote from the trade ticket.
pub fn quote<S: Surface>(
    session: &mut Session<S>,
    symbol: &str,
    cancel: &AtomicBool,
) -> Result<Quote, ExtractionError> {
    with_retries(session, cancel, |session| {
        let url = session.config().site.trade_url.clone();
        session.navigate(&url)?;
        if session.signed_out()? {
            return Err(ExtractionError::SessionExpired);
        }
        lookup_quote(session, symbol)?
            .ok_or_else(|| ExtractionError::parse("quote", crate::site::QUOTE_PLACEHOLDER))
    })
}

/// Type `symbol` into the ticket's quote box and poll for the quote.
///
/// `Ok(None)` means the price never left its placeholder. Shared with the
/// order workflow, which is already on the ticket.
pub(crate) fn lookup_quote<S: Surface>(
    session: &mut Session<S>,
    symbol: &str,
) -> Result<Option<Quote>, ExtractionError> {
    let element = session.config().timeouts.element();
    let polls = session.config().session.quote_polls;
    let interval = session.config().session.poll_interval();
    let surface = session.surface_mut();
    surface.wait_for(&trade::quote_box(), element)?;
    surface.fill(&trade::quote_box(), symbol)?;
    surface.press(&trade::quote_box(), "Enter")?;
    surface.wait_for(&trade::quote_values(), element)?;

    for poll in 0..polls {
        if poll > 0 {
            thread::sleep(interval);
        }
        let surface = session.surface();
        let labels = surface.read_all(&trade::quote_labels())?;
        let values = surface.read_all(&trade::quote_values())?;
        if let Some(quote) = parse_quote(symbol, &labels, &values)? {
            debug!("quote {symbol}: last {}", quote.last);
            return Ok(Some(quote));
        }
    }
    warn!("quote for {symbol} never resolved");
    Ok(None)
}

/// Load the holdings page, expand every panel, and return the panel titles.
fn load_holdings_page<S: Surface>(session: &mut Session<S>) -> Result<Vec<String>, ExtractionError> {
    let url = session.config().site.holdings_url.clone();
    let page = session.config().timeouts.page();
    session.navigate(&url)?;
    if session.signed_out()? {
        return Err(ExtractionError::SessionExpired);
    }
    let surface = session.surface_mut();
    surface.wait_for(&holdings::expand_all(), page)?;
    surface.click(&holdings::expand_all())?;
    let panels = surface.read_all(&holdings::account_headers())?;
    if panels.is_empty() {
        return Err(ExtractionError::ElementNotFound(holdings::account_headers().to_string()));
    }
    Ok(panels)
}

fn read_table<S: Surface>(
    session: &mut Session<S>,
    index: usize,
    account_number: &str,
) -> Result<AccountTable, ExtractionError> {
    let rows = session.surface().read_rows(&holdings::table_rows(index))?;
    if rows.is_empty() {
        return Err(ExtractionError::ElementNotFound(holdings::table_rows(index).to_string()));
    }
    parse_account_table(account_number, &rows)
}

fn check_cancel(cancel: &AtomicBool) -> Result<(), ExtractionError> {
    if cancel.load(Ordering::Acquire) {
        Err(ExtractionError::Cancelled)
    } else {
        Ok(())
    }
}

/// Run a read, re-running it from a fresh navigation on a transient failure.
fn with_retries<S: Surface, T>(
    session: &mut Session<S>,
    cancel: &AtomicBool,
    mut read: impl FnMut(&mut Session<S>) -> Result<T, ExtractionError>,
) -> Result<T, ExtractionError> {
    let attempts = session.config().session.read_attempts;
    let mut attempt = 1;
    loop {
        check_cancel(cancel)?;
        match read(session) {
            Err(e) if e.is_transient() && attempt < attempts => {
                warn!("{e}; retrying read ({attempt}/{attempts})");
                attempt += 1;
            }
            other => return other,
        }
    }
}
