// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Accounts, holdings and quotes read from the scripted site.

mod common;

use std::sync::atomic::AtomicBool;

use common::*;
use vgweb::extract;
use vgweb::site::{self, holdings, trade};
use vgweb::{Config, Error, ExtractionError, NoStealth, Price, SessionManager};

fn extraction_error<T: std::fmt::Debug>(result: vgweb::Result<T>) -> ExtractionError {
    match result {
        Err(Error::Extraction(e)) => e,
        other => panic!("expected an extraction error, got {other:?}"),
    }
}

// ============================================================================
// Accounts
// ============================================================================

#[test]
fn accounts_list_brokerage_panels_only() {
    let site = standard().build();
    let client = signed_in(&site);

    let accounts = client.accounts().unwrap();
    let numbers: Vec<&str> = accounts.iter().map(|a| a.number.as_str()).collect();
    assert_eq!(numbers, [ACCOUNT, OTHER_ACCOUNT]);

    let joint = &accounts[0];
    assert_eq!(joint.nickname, "Joint Account");
    assert_eq!(joint.kind, "Brokerage Account");
    assert_eq!(joint.cash_balance, Price(500_00));
    assert_eq!(joint.total_value, Price(3_135_33));

    let individual = &accounts[1];
    assert_eq!(individual.cash_balance, Price::ZERO);
    assert_eq!(individual.total_value, Price(400_00));
    assert_eq!(site.clicks_on(&holdings::expand_all()), 1);
}

#[test]
fn account_table_without_total_row_sums_positions() {
    let site = standard()
        .page("holdings", site::HOLDINGS_URL, |p| {
            p.element(holdings::expand_all())
                .text(holdings::account_headers(), "Joint Account — Brokerage Account — *123456")
                .rows(
                    holdings::table_rows(0),
                    &[
                        &["Stocks"],
                        &["", "INTC", "Intel Corp", "$45.11", "", "", "3", "$135.33"],
                        &["", "AAPL", "Apple Inc", "$200.00", "", "", "2", "—"],
                    ],
                )
        })
        .build();
    let client = signed_in(&site);

    let accounts = client.accounts().unwrap();
    assert_eq!(accounts[0].total_value, Price(535_33));
}

// ============================================================================
// Holdings
// ============================================================================

#[test]
fn holdings_for_one_account() {
    let site = standard().build();
    let client = signed_in(&site);

    let positions = client.holdings(ACCOUNT).unwrap();
    let symbols: Vec<&str> = positions.iter().map(|h| h.symbol.as_str()).collect();
    assert_eq!(symbols, ["VTI", "INTC", "VMFXX"]);
    for h in &positions {
        assert_eq!(h.account_number, ACCOUNT);
        assert!(h.quantity > 0.0, "{h:?}");
        assert!(h.value.0 >= 0, "{h:?}");
    }

    let intc = &positions[1];
    assert_eq!(intc.section, "ETFs");
    assert_eq!(intc.description, "Intel Corp");
    assert_eq!(intc.price, Price(45_11));
    assert_eq!(intc.quantity, 3.0);
    assert_eq!(intc.value, Price(135_33));
    assert_eq!(positions[2].section, "Cash & money market");

    let other = client.holdings(OTHER_ACCOUNT).unwrap();
    assert_eq!(other.len(), 1);
    assert_eq!(other[0].symbol, "AAPL");
}

#[test]
fn unknown_and_non_brokerage_accounts() {
    let site = standard().build();
    let client = signed_in(&site);

    assert_eq!(
        extraction_error(client.holdings("000000")),
        ExtractionError::UnknownAccount("000000".into())
    );
    // the IRA panel exists but is not tradable here
    assert_eq!(
        extraction_error(client.holdings("999999")),
        ExtractionError::UnknownAccount("999999".into())
    );
}

#[test]
fn malformed_row_is_parse_error() {
    let site = standard()
        .page("holdings", site::HOLDINGS_URL, |p| {
            p.element(holdings::expand_all())
                .text(holdings::account_headers(), "Joint Account — Brokerage Account — *123456")
                .rows(
                    holdings::table_rows(0),
                    &[&["", "INTC", "Intel Corp", "n/a", "", "", "3", "$135.33"]],
                )
        })
        .build();
    let client = signed_in(&site);

    assert!(matches!(
        extraction_error(client.holdings(ACCOUNT)),
        ExtractionError::ParseError { .. }
    ));
}

#[test]
fn missing_table_is_retried_then_reported() {
    let site = standard()
        .page("holdings", site::HOLDINGS_URL, |p| {
            p.element(holdings::expand_all())
                .text(holdings::account_headers(), "Joint Account — Brokerage Account — *123456")
        })
        .build();
    let client = signed_in(&site);
    let before = site.navigations().len();

    assert!(matches!(
        extraction_error(client.holdings(ACCOUNT)),
        ExtractionError::ElementNotFound(_)
    ));
    let attempts = Config::for_tests().session.read_attempts as usize;
    assert_eq!(site.navigations().len(), before + attempts);
}

// ============================================================================
// Quotes
// ============================================================================

#[test]
fn quote_reads_bid_ask_last() {
    let site = standard().build();
    let client = signed_in(&site);

    let quote = client.quote("INTC").unwrap();
    assert_eq!(quote.symbol, "INTC");
    assert_eq!(quote.bid, Some(Price(45_10)));
    assert_eq!(quote.ask, Some(Price(45_12)));
    assert_eq!(quote.last, Price(45_11));
    assert_eq!(site.filled(&trade::quote_box()).as_deref(), Some("INTC"));
    // reading a quote never opens an order
    assert_eq!(site.clicks_on(&trade::preview_button()), 0);
}

#[test]
fn unresolved_quote_is_parse_error() {
    let site = standard()
        .page("quoted", site::TRADE_URL, |p| {
            quoted_page(p, &["Bid", "Ask", "Last"], &["$—", "$—", "$—"])
        })
        .build();
    let client = signed_in(&site);

    assert!(matches!(
        extraction_error(client.quote("ZZZZ")),
        ExtractionError::ParseError { .. }
    ));
}

// ============================================================================
// Session loss and cancellation
// ============================================================================

#[test]
fn expiry_mid_read_reauthenticates_once() {
    let site = standard().build();
    let client = signed_in(&site);
    site.redirect_once(site::HOLDINGS_URL, "login");

    let accounts = client.accounts().unwrap();
    assert_eq!(accounts.len(), 2);
    assert!(client.is_authenticated());
}

#[test]
fn persistent_sign_out_is_session_expired() {
    let site = standard().build();
    let client = signed_in(&site);
    site.set_route(site::TRADE_URL, "login");

    assert_eq!(extraction_error(client.quote("INTC")), ExtractionError::SessionExpired);
}

#[test]
fn cancelled_read_never_navigates() {
    init_logging();
    let site = standard().build();
    let mut manager = SessionManager::start(&site, Config::for_tests(), &NoStealth).unwrap();
    manager.login(creds()).unwrap();
    let navigations = site.navigations().len();

    let session = manager.ensure_authenticated().unwrap();
    let cancel = AtomicBool::new(true);
    assert_eq!(extract::accounts(session, &cancel), Err(ExtractionError::Cancelled));
    assert_eq!(site.navigations().len(), navigations);
}
