use chrono::NaiveDate;

use crate::error::FxError;

/// Inclusive first and last calendar day of `year`-`month`.
pub fn month_range(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), FxError> {
    let invalid = || FxError::InvalidMonth { year, month };

    if !(1..=12).contains(&month) {
        return Err(invalid());
    }

    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .ok_or_else(invalid)?;

    Ok((start, end))
}
