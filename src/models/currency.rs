use std::collections::BTreeSet;
use tracing::debug;

use super::CurrencyCode;

/// Reference currency every rate is quoted against.
pub const BASE_CURRENCY: &str = "EUR";

/// Country (ISO 3166 alpha-2) to currency. Euro-area members map to the base currency.
const COUNTRY_TO_CURRENCY: &[(&str, &str)] = &[
    ("BG", "BGN"),
    ("CO", "COP"),
    ("DK", "DKK"),
    ("ES", "EUR"),
    ("FI", "EUR"),
    ("HR", "EUR"),
    ("HU", "HUF"),
    ("IT", "EUR"),
    ("LT", "EUR"),
    ("NO", "NOK"),
    ("PL", "PLN"),
    ("RO", "RON"),
    ("RS", "RSD"),
    ("SE", "SEK"),
];

/// Country codes that are commonly mistyped, mapped to their correct form.
const COUNTRY_ALIASES: &[(&str, &str)] = &[("PO", "PL")];

/// Trim, uppercase and apply alias corrections to a country code.
pub fn normalize_country_code(code: &str) -> String {
    let code = code.trim().to_ascii_uppercase();
    COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == code)
        .map(|(_, correct)| correct.to_string())
        .unwrap_or(code)
}

pub fn country_currency(country: &str) -> Option<CurrencyCode> {
    COUNTRY_TO_CURRENCY
        .iter()
        .find(|(c, _)| *c == country)
        .and_then(|(_, currency)| CurrencyCode::new(currency).ok())
}

/// Distinct currencies for the given countries, sorted, excluding `base`.
/// Countries without a mapping are skipped.
pub fn requested_currencies(countries: &[String], base: &CurrencyCode) -> Vec<CurrencyCode> {
    let mut currencies = BTreeSet::new();
    for country in countries {
        match country_currency(country) {
            Some(currency) if &currency != base => {
                currencies.insert(currency);
            }
            Some(_) => {}
            None => debug!("No currency mapping for country {}, skipping", country),
        }
    }
    currencies.into_iter().collect()
}
