use std::collections::{BTreeMap, BTreeSet};

use crate::models::{CurrencyCode, MergedRates, MonthKey, MonthlyRateRow};

/// Label for a base-currency row when no source contributed to the month.
pub const IDENTITY_SOURCE: &str = "identity";

/// Reduce a merged month into one row per currency, sorted by currency code.
///
/// Raw rates are `1 base = r × currency`; rows store the inverse of the
/// monthly mean, `1 currency = avg_rate_to_base × base`. The base currency is
/// always present with a rate of exactly 1 and a single observation.
pub fn aggregate_month(month: MonthKey, merged: &MergedRates, base: &CurrencyCode) -> Vec<MonthlyRateRow> {
    let mut sums: BTreeMap<&CurrencyCode, (f64, u32)> = BTreeMap::new();

    for day in merged.rates.values() {
        for (currency, rate) in day {
            let entry = sums.entry(currency).or_insert((0.0, 0));
            entry.0 += rate;
            entry.1 += 1;
        }
    }
    sums.insert(base, (1.0, 1));

    let month_label = blended_label(merged);

    sums.into_iter()
        .map(|(currency, (sum, count))| {
            let avg_base_to_cur = sum / f64::from(count);
            let source = if currency == base {
                month_label.clone()
            } else {
                merged
                    .provenance
                    .get(currency)
                    .cloned()
                    .unwrap_or_else(|| month_label.clone())
            };

            MonthlyRateRow {
                month_sk: month.month_sk(),
                currency_code: currency.clone(),
                avg_rate_to_base: 1.0 / avg_base_to_cur,
                obs_count: count,
                source,
            }
        })
        .collect()
}

/// Distinct source labels of the month joined with `+`, e.g. `exchangerate.host+frankfurter`.
fn blended_label(merged: &MergedRates) -> String {
    let labels: BTreeSet<&str> = merged.provenance.values().map(String::as_str).collect();
    if labels.is_empty() {
        IDENTITY_SOURCE.to_string()
    } else {
        labels.into_iter().collect::<Vec<_>>().join("+")
    }
}
