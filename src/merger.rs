//! Combines the primary and secondary providers into one rate table per month.
//!
//! The primary source is asked first for every currency it claims to support.
//! Anything that is unsupported, or supported but absent from its response,
//! counts as a gap and is requested from the secondary source.

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::api::{PrimaryRateSource, SecondaryRateSource, SupportedCurrencies};
use crate::error::FxError;
use crate::models::{CurrencyCode, DailyRateTable, MergedRates, MonthKey};

/// How the requested currencies are split between the two sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlan {
    pub primary_candidates: Vec<CurrencyCode>,
    pub known_gaps: Vec<CurrencyCode>,
}

pub fn plan_sources(requested: &[CurrencyCode], supported: &SupportedCurrencies) -> SourcePlan {
    match supported {
        SupportedCurrencies::Known(codes) => {
            let (primary_candidates, known_gaps): (Vec<_>, Vec<_>) =
                requested.iter().cloned().partition(|c| codes.contains(c));
            SourcePlan { primary_candidates, known_gaps }
        }
        SupportedCurrencies::Unknown => SourcePlan {
            primary_candidates: requested.to_vec(),
            known_gaps: Vec::new(),
        },
    }
}

/// Every currency with at least one observation on any date.
pub fn observed_currencies(rates: &DailyRateTable) -> BTreeSet<CurrencyCode> {
    rates.values().flat_map(|day| day.keys().cloned()).collect()
}

/// Requested currencies never observed, followed by any known gaps not already listed.
pub fn missing_currencies(
    requested: &[CurrencyCode],
    observed: &BTreeSet<CurrencyCode>,
    known_gaps: &[CurrencyCode],
) -> Vec<CurrencyCode> {
    let mut missing: Vec<CurrencyCode> = requested.iter().filter(|c| !observed.contains(c)).cloned().collect();
    for gap in known_gaps {
        if !missing.contains(gap) {
            missing.push(gap.clone());
        }
    }
    missing
}

/// Copy observations for `allowed` currencies from `incoming` into `merged`, tagging them with `label`.
///
/// Every date the source returned is kept, even when none of its currencies are allowed.
pub fn merge_into(merged: &mut MergedRates, incoming: DailyRateTable, allowed: &[CurrencyCode], label: &str) {
    for (date, day) in incoming {
        let merged_day = merged.rates.entry(date).or_default();
        for (currency, rate) in day {
            if !allowed.contains(&currency) {
                continue;
            }
            merged_day.insert(currency.clone(), rate);
            merged.provenance.entry(currency).or_insert_with(|| label.to_string());
        }
    }
}

/// Fetch and merge one month from both sources.
///
/// Returns `FxError::NoData` when neither source returned a single date.
pub async fn gather_month(
    primary: &dyn PrimaryRateSource,
    secondary: &dyn SecondaryRateSource,
    requested: &[CurrencyCode],
    supported: &SupportedCurrencies,
    month: MonthKey,
) -> Result<MergedRates, FxError> {
    let plan = plan_sources(requested, supported);
    let mut merged = MergedRates::default();

    if !plan.primary_candidates.is_empty() {
        let table = primary.fetch_month(month).await;
        merge_into(&mut merged, table, &plan.primary_candidates, &primary.label());
        debug!("{}: {} observations from {}", month, merged.observation_count(), primary.label());
    }

    let observed = observed_currencies(&merged.rates);
    let missing = missing_currencies(requested, &observed, &plan.known_gaps);

    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|c| c.as_str()).collect();
        warn!("Missing currencies for {}: {:?}", month, names);

        let table = secondary.fetch_month(month, &missing).await;
        merge_into(&mut merged, table, &missing, &secondary.label());
    }

    if merged.is_empty() {
        return Err(FxError::NoData(month));
    }
    Ok(merged)
}
