// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Property-based tests for parsing and order-safety invariants.
//!
//! These tests use proptest to check that parsers never panic, that request
//! validation is total, and that dry runs never press submit.

mod common;

use common::*;
use proptest::prelude::*;
use vgweb::extract::{parse_account_header, parse_account_table, parse_quote};
use vgweb::order::{parse_preview, validate};
use vgweb::parse::{parse_money, parse_quantity};
use vgweb::site::trade;
use vgweb::{Error, OrderError, OrderRequest, OrderStatus, OrderType, Price, Side, TimeInForce};

/// Generate a positive price up to $100,000.00
fn price_strategy() -> impl Strategy<Value = Price> {
    (1i64..=10_000_000i64).prop_map(Price)
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn duration_strategy() -> impl Strategy<Value = TimeInForce> {
    prop_oneof![Just(TimeInForce::Day), Just(TimeInForce::GoodTillCancelled)]
}

/// Ticker-like symbols, including class shares such as `BRK.B`
fn symbol_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{1,5}(\\.[A-Z])?"
}

fn request_strategy() -> impl Strategy<Value = OrderRequest> {
    (
        symbol_strategy(),
        side_strategy(),
        1u64..=10_000u64,
        prop::option::of(price_strategy()),
        prop::option::of(price_strategy()),
        duration_strategy(),
    )
        .prop_map(|(symbol, side, qty, limit, stop, duration)| {
            let order_type = match (limit, stop) {
                (None, None) => OrderType::Market,
                (Some(_), None) => OrderType::Limit,
                (None, Some(_)) => OrderType::Stop,
                (Some(_), Some(_)) => OrderType::StopLimit,
            };
            let mut request = OrderRequest::new(ACCOUNT, symbol, side, order_type, qty);
            request.limit_price = limit;
            request.stop_price = stop;
            request.with_duration(duration)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // ========================================================================
    // PARSING
    // ========================================================================

    /// Display output parses back to the same cents
    #[test]
    fn money_display_round_trips(cents in -10_000_000_00i64..=10_000_000_00i64) {
        let price = Price(cents);
        prop_assert_eq!(parse_money(&price.to_string(), "v").unwrap(), price);
    }

    /// Field strings are plain decimals the ticket accepts
    #[test]
    fn field_string_has_two_decimals(price in price_strategy()) {
        let field = price.to_field_string();
        prop_assert!(!field.contains('$') && !field.contains(','));
        let (_, cents) = field.split_once('.').unwrap();
        prop_assert_eq!(cents.len(), 2);
        prop_assert_eq!(parse_money(&field, "v").unwrap(), price);
    }

    #[test]
    fn money_parser_never_panics(text in "\\PC{0,24}") {
        let _ = parse_money(&text, "v");
        let _ = parse_quantity(&text, "q");
    }

    #[test]
    fn header_parser_never_panics(text in "\\PC{0,64}") {
        let _ = parse_account_header(&text);
    }

    #[test]
    fn preview_parser_never_panics(text in "\\PC{0,200}") {
        let _ = parse_preview(&text);
    }

    /// Arbitrary cell grids either parse or fail with a typed error
    #[test]
    fn table_parser_never_panics(
        rows in prop::collection::vec(prop::collection::vec("\\PC{0,12}", 0..10), 0..8)
    ) {
        let _ = parse_account_table(ACCOUNT, &rows);
    }

    #[test]
    fn quote_parser_never_panics(
        labels in prop::collection::vec("\\PC{0,8}", 0..5),
        values in prop::collection::vec("\\PC{0,10}", 0..5),
    ) {
        let _ = parse_quote("INTC", &labels, &values);
    }

    /// Parsed holdings keep the quantities and prices they were given
    #[test]
    fn position_rows_parse(
        qty in 1u32..=100_000u32,
        price in price_strategy(),
    ) {
        let rows = vec![
            vec!["Stocks".to_string()],
            vec![
                String::new(),
                "INTC".into(),
                "Intel Corp".into(),
                price.to_string(),
                String::new(),
                String::new(),
                qty.to_string(),
            ],
        ];
        let table = parse_account_table(ACCOUNT, &rows).unwrap();
        prop_assert_eq!(table.holdings.len(), 1);
        let holding = &table.holdings[0];
        prop_assert_eq!(holding.quantity, f64::from(qty));
        prop_assert_eq!(holding.price, price);
        prop_assert!(holding.value.0 >= 0);
        prop_assert_eq!(table.total, holding.value);
    }

    // ========================================================================
    // VALIDATION
    // ========================================================================

    /// Well-formed requests always validate
    #[test]
    fn generated_requests_validate(request in request_strategy()) {
        prop_assert!(validate(&request).is_ok());
    }

    /// Limit and stop prices are required exactly for the order types that use them
    #[test]
    fn limit_price_matches_order_type(
        symbol in symbol_strategy(),
        side in side_strategy(),
        qty in 1u64..=10_000u64,
        price in price_strategy(),
    ) {
        let bare_limit = OrderRequest::new(ACCOUNT, symbol.clone(), side, OrderType::Limit, qty);
        prop_assert!(matches!(validate(&bare_limit), Err(OrderError::InvalidRequest(_))));

        let priced_market = OrderRequest::market(ACCOUNT, symbol.clone(), side, qty).with_limit_price(price);
        prop_assert!(matches!(validate(&priced_market), Err(OrderError::InvalidRequest(_))));

        let bare_stop_limit = OrderRequest::new(ACCOUNT, symbol, side, OrderType::StopLimit, qty)
            .with_limit_price(price);
        prop_assert!(matches!(validate(&bare_stop_limit), Err(OrderError::InvalidRequest(_))));
    }

    #[test]
    fn nonpositive_limit_is_invalid(
        symbol in symbol_strategy(),
        cents in -1_000_00i64..=0i64,
    ) {
        let request = OrderRequest::limit(ACCOUNT, symbol, Side::Buy, 1, Price(cents));
        prop_assert!(matches!(validate(&request), Err(OrderError::InvalidRequest(_))));
    }

    #[test]
    fn symbols_with_other_characters_are_invalid(
        symbol in "[A-Z]{0,3}[^A-Za-z0-9.][A-Z]{0,3}",
    ) {
        let request = OrderRequest::market(ACCOUNT, symbol, Side::Buy, 1);
        prop_assert!(matches!(validate(&request), Err(OrderError::InvalidRequest(_))));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // ========================================================================
    // ORDER SAFETY
    // ========================================================================

    /// Dry runs reach the preview and never press submit
    #[test]
    fn dry_run_never_submits(request in request_strategy()) {
        let site = standard().build();
        let client = signed_in(&site);
        let request = request.with_dry_run(true);

        let confirmation = client.place_order(&request).unwrap();
        prop_assert_eq!(confirmation.status, OrderStatus::DryRunOnly);
        prop_assert_eq!(confirmation.confirmation_id, None);
        prop_assert_eq!(site.clicks_on(&trade::submit_order()), 0);
        prop_assert!(!request.is_submitted());
    }

    /// Invalid requests fail before the browser is touched
    #[test]
    fn invalid_request_has_no_side_effects(
        symbol in symbol_strategy(),
        qty in 1u64..=10_000u64,
    ) {
        let site = standard().build();
        let client = signed_in(&site);
        let before = site.interactions().len();

        let request = OrderRequest::new(ACCOUNT, symbol, Side::Buy, OrderType::Limit, qty);
        let result = client.place_order(&request);
        prop_assert!(matches!(result, Err(Error::Order(OrderError::InvalidRequest(_)))));
        prop_assert_eq!(site.interactions().len(), before);
    }

    /// A spent request is refused without any browser interaction
    #[test]
    fn submitted_request_never_resubmits(request in request_strategy()) {
        let site = standard().build();
        let client = signed_in(&site);

        client.place_order(&request).unwrap();
        let before = site.interactions().len();
        let again = client.place_order(&request.clone());
        prop_assert!(matches!(again, Err(Error::Order(OrderError::AlreadySubmitted))));
        prop_assert_eq!(site.interactions().len(), before);
        prop_assert_eq!(site.clicks_on(&trade::submit_order()), 1);
    }
}
