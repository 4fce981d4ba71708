//! Brokerage URLs and every element locator the core depends on.
//!
//! When the site's layout drifts, this is the file to fix.

use crate::driver::Selector;

pub const LOGIN_URL: &str = "https://logon.vanguard.com/logon?site=pi";
pub const DASHBOARD_URL: &str = "https://dashboard.web.vanguard.com/";
pub const HOLDINGS_URL: &str = "https://holdings.web.vanguard.com/";
pub const TRADE_URL: &str = "https://etfs-stocks.web.vanguard.com/c/trade/ticket";
pub const CHALLENGE_HOST: &str = "challenges.web.vanguard.com";

/// Placeholder the trade ticket shows until a quote resolves.
pub const QUOTE_PLACEHOLDER: &str = "$—";

/// Sign-in flow.
pub mod login {
    use super::Selector;

    pub fn dashboard_heading() -> Selector {
        Selector::xpath("//h2[contains(text(), 'Accounts')]")
    }
    pub fn username() -> Selector {
        Selector::css("#USER")
    }
    pub fn password() -> Selector {
        Selector::css("#PASSWORD-blocked")
    }
    pub fn submit() -> Selector {
        Selector::css("#username-password-submit-btn-1")
    }
    pub fn rejected_banner() -> Selector {
        Selector::xpath(
            "//*[contains(@class, 'error') and contains(text(), 'username or password')]",
        )
    }
    pub fn no_app_link() -> Selector {
        Selector::xpath("//a[contains(text(), \"I don't see this in my app\")]")
    }
    pub fn continue_button() -> Selector {
        Selector::xpath("//button[contains(text(), 'Continue')]")
    }
    /// "Text or call me" card on the delivery-method chooser.
    pub fn code_delivery_option() -> Selector {
        Selector::css("button.col-md:nth-child(2) > div:nth-child(1)")
    }
    /// Masked phone cards, text like `***-***-1234`.
    pub fn phone_cards() -> Selector {
        Selector::xpath("//div[contains(text(), '***-***-')]")
    }
    pub fn phone_card(last_four: &str) -> Selector {
        Selector::xpath(format!("//div[text()='***-***-{last_four}']"))
    }
    pub fn text_channel() -> Selector {
        Selector::xpath("//div[contains(text(), 'Text')]")
    }
    pub fn call_channel() -> Selector {
        Selector::xpath("//div[contains(text(), 'Call')]")
    }
    pub fn code_field() -> Selector {
        Selector::css("#CODE")
    }
    /// "Don't remember this device" radio under the code field.
    pub fn no_remember_device() -> Selector {
        Selector::css("c11n-radio.c11n-radio:nth-child(2) > label:nth-child(2)")
    }
    pub fn code_submit() -> Selector {
        Selector::css("#security-code-submit-btn")
    }
    pub fn code_rejected() -> Selector {
        Selector::xpath("//*[contains(@class, 'error') and contains(text(), 'code')]")
    }
}

/// Holdings page.
pub mod holdings {
    use super::Selector;

    pub fn expand_all() -> Selector {
        Selector::xpath("//span[contains(text(), 'Expand all accounts')]")
    }
    /// Account panel titles, e.g. `Joint — Brokerage Account — *1234`.
    pub fn account_headers() -> Selector {
        Selector::css("#overflow-override span > span > span > span")
    }
    /// Rows of the `index`-th account's holdings table, every `tbody`.
    pub fn table_rows(index: usize) -> Selector {
        Selector::css(format!("#self_managed_table_{index} tbody tr"))
    }
}

/// Trade ticket and its preview/confirmation pages.
pub mod trade {
    use super::Selector;

    pub fn account_chooser() -> Selector {
        Selector::xpath("//div[text()=' Select Account ']")
    }
    pub fn account_modal() -> Selector {
        Selector::css(".c11n-modal-dialog-open")
    }
    pub fn account_option(account_number: &str) -> Selector {
        Selector::xpath(format!("//tds-list-option[contains(., '{account_number}')]"))
    }
    pub fn quote_box() -> Selector {
        Selector::xpath("//input[@placeholder='Get Quote']")
    }
    pub fn quote_labels() -> Selector {
        Selector::xpath("//div[@data-testid='txt-quote-label']")
    }
    pub fn quote_values() -> Selector {
        Selector::xpath("//div[@data-testid='txt-quote-value']")
    }
    pub fn cannot_complete_modal() -> Selector {
        Selector::css("twe-trade-cannot-be-completed-modal tds-modal .modal__content")
    }
    pub fn ok_button() -> Selector {
        Selector::xpath("//button[contains(text(), 'OK')]")
    }
    pub fn label(text: &str) -> Selector {
        Selector::xpath(format!("//label[text()='{text}']"))
    }
    pub fn shares() -> Selector {
        Selector::xpath("//input[@placeholder='Enter Shares']")
    }
    pub fn limit_price() -> Selector {
        Selector::css("#limitPrice")
    }
    pub fn stop_price() -> Selector {
        Selector::css("#stopPrice")
    }
    pub fn cost_basis_checkbox() -> Selector {
        Selector::css("twe-cost-basis-modal tds-checkbox .tds-checkbox__indicator.tds-checkbox--blue")
    }
    pub fn continue_button() -> Selector {
        Selector::xpath("//button[contains(text(), 'Continue')]")
    }
    pub fn preview_button() -> Selector {
        Selector::css("twe-trade-detail tds-card-body div.twe-flex-button-wrap > button:nth-child(2)")
    }
    /// Warning card listing why the order cannot be previewed or placed.
    pub fn warning_card() -> Selector {
        Selector::css("twe-trade-detail tds-card tds-card-body > div:nth-child(3)")
    }
    pub fn warning_header() -> Selector {
        Selector::css("twe-trade-detail tds-card tds-card-body > div:nth-child(3) p")
    }
    pub fn warning_items() -> Selector {
        Selector::css("twe-trade-detail tds-card tds-card-body > div:nth-child(3) li")
    }
    pub fn preview_card() -> Selector {
        Selector::css(".col-lg-7 > tds-card:nth-child(1) > div:nth-child(1) > tds-card-body:nth-child(1)")
    }
    pub fn submit_order() -> Selector {
        Selector::xpath("//button[text()=' Submit Order ']")
    }
    pub fn confirmation_heading() -> Selector {
        Selector::css("twe-confirm div.col-lg-7 > h2")
    }
    pub fn confirmation_subheading() -> Selector {
        Selector::css("twe-confirm div.col-lg-7 > div.page-heading p")
    }
}
