//! A scripted brokerage site shared by the integration tests.
//!
//! `standard()` returns a builder for a complete site: sign-in without MFA,
//! a holdings page with two brokerage accounts and one IRA, and a trade ticket
//! that previews and confirms. Tests override individual pages by name.

#![allow(dead_code)]

use vgweb::mock::{MockPage, MockSite, MockSiteBuilder, MockSurface};
use vgweb::site::{self, holdings, login, trade};
use vgweb::{Client, Config, Credentials, NoStealth};

pub const ACCOUNT: &str = "123456";
pub const OTHER_ACCOUNT: &str = "654321";
pub const ORDER_NUMBER: &str = "12345678";

pub const PREVIEW: &str = "Account Joint Brokerage Account — *3456 Transaction Buy Shares 1 \
    Security INTC Intel Corp Order type Market Duration Day Commission $0.00 \
    Estimated amount $45.12 * Market orders may execute at a different price.";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn creds() -> Credentials {
    Credentials::new("user", "pass")
}

pub fn standard() -> MockSiteBuilder {
    MockSite::builder()
        .page("login", site::LOGIN_URL, |p| {
            p.element(login::username())
                .element(login::password())
                .on_click(login::submit(), "dashboard")
        })
        .page("dashboard", site::DASHBOARD_URL, |p| {
            p.element(login::dashboard_heading())
        })
        .page("holdings", site::HOLDINGS_URL, holdings_page)
        .page("ticket", site::TRADE_URL, ticket_page)
        .page("quoted", site::TRADE_URL, |p| {
            quoted_page(p, &["Bid", "Ask", "Last"], &["$45.10", "$45.12", "$45.11"])
        })
        .page("preview", site::TRADE_URL, |p| {
            p.text(trade::preview_card(), PREVIEW)
                .on_click(trade::submit_order(), "confirmed")
        })
        .page("confirmed", site::TRADE_URL, |p| {
            confirmation_page(p, &format!("Received order #{ORDER_NUMBER}"))
        })
}

/// A client over `site`, launched with test settings.
pub fn client(site: &MockSite) -> Client<MockSurface> {
    init_logging();
    Client::launch(site, Config::for_tests(), &NoStealth).unwrap()
}

/// A client already signed in.
pub fn signed_in(site: &MockSite) -> Client<MockSurface> {
    let client = client(site);
    client.login(creds()).unwrap();
    client
}

pub fn holdings_page(p: MockPage) -> MockPage {
    p.element(holdings::expand_all())
        .texts(
            holdings::account_headers(),
            &[
                "Joint Account — Brokerage Account — *123456",
                "Roth IRA — Mutual Fund Account — *999999",
                "Individual — Brokerage Account — *654321",
            ],
        )
        .rows(
            holdings::table_rows(0),
            &[
                &["ETFs"],
                &["", "Symbol", "Name", "Price", "Change", "% Change", "Quantity", "Value"],
                &["", "VTI", "Vanguard Total Stock Market ETF", "$250.00", "+$1.00", "+0.40%", "10", "$2,500.00"],
                &["", "INTC", "Intel Corp", "$45.11", "-$0.20", "-0.44%", "3", "$135.33"],
                &["Cash & money market"],
                &["", "Symbol", "Name", "Price", "Change", "% Change", "Quantity", "Value"],
                &["", "VMFXX", "Federal Money Market Fund", "$1.00", "$0.00", "0.00%", "500.00", "$500.00"],
                &["Total", "$3,135.33"],
            ],
        )
        .rows(
            holdings::table_rows(1),
            &[&["", "VFIAX", "500 Index Admiral", "$480.00", "", "", "1.5", "$720.00"]],
        )
        .rows(
            holdings::table_rows(2),
            &[
                &["Stocks"],
                &["", "AAPL", "Apple Inc", "$200.00", "", "", "2", "$400.00"],
                &["Total", "$400.00"],
            ],
        )
}

pub fn ticket_page(p: MockPage) -> MockPage {
    p.element(trade::account_chooser())
        .element(trade::account_modal())
        .element(trade::account_option(ACCOUNT))
        .element(trade::account_option(OTHER_ACCOUNT))
        .on_key(trade::quote_box(), "Enter", "quoted")
}

/// The ticket after a symbol lookup, with the order form visible.
pub fn quoted_page(p: MockPage, labels: &[&str], values: &[&str]) -> MockPage {
    p.element(trade::quote_box())
        .texts(trade::quote_labels(), labels)
        .texts(trade::quote_values(), values)
        .element(trade::label("Buy"))
        .element(trade::label("Sell"))
        .element(trade::shares())
        .element(trade::label("Market"))
        .element(trade::label("Limit"))
        .element(trade::limit_price())
        .element(trade::label("Stop"))
        .element(trade::label("Stop Limit"))
        .element(trade::stop_price())
        .element(trade::label("Day"))
        .element(trade::label("60-day (GTC)"))
        .on_click(trade::preview_button(), "preview")
}

pub fn confirmation_page(p: MockPage, heading: &str) -> MockPage {
    p.text(trade::confirmation_heading(), heading).text(
        trade::confirmation_subheading(),
        "Submitted on 10/16/2026 at 10:31 A.M. ET",
    )
}

pub fn warning_page(p: MockPage, header: &str, items: &[&str]) -> MockPage {
    p.element(trade::warning_card())
        .text(trade::warning_header(), header)
        .texts(trade::warning_items(), items)
}
