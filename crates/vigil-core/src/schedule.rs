//! Due-date derivation for deadlines that are not stored directly.

use chrono::{Days, Months, NaiveDate};

use crate::{Error, Result, status::parse_date};

/// The next due date after an event performed on `last`, for an instrument
/// that must be redone every `frequency_days` days. Calendar arithmetic:
/// month and year boundaries roll over.
pub fn derive_due_date(last: NaiveDate, frequency_days: i64) -> Result<NaiveDate> {
  if frequency_days < 0 {
    return Err(Error::InvalidFrequency(frequency_days));
  }
  last
    .checked_add_days(Days::new(frequency_days as u64))
    .ok_or(Error::DateOutOfRange {
      date: last,
      days: frequency_days,
    })
}

/// [`derive_due_date`] over a stored date string. Unlike classification this
/// is strict: a malformed last-event date is an error, never a guess.
pub fn derive_due_date_raw(last: &str, frequency_days: i64) -> Result<NaiveDate> {
  derive_due_date(parse_date(last)?, frequency_days)
}

/// Add whole calendar months. A day that does not exist in the target month
/// clamps to that month's last day (Aug 31 + 6 months is Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
  date
    .checked_add_months(Months::new(months))
    .ok_or(Error::MonthsOutOfRange { date, months })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn rolls_over_month_boundary() {
    assert_eq!(derive_due_date(ymd(2024, 1, 20), 15).unwrap(), ymd(2024, 2, 4));
  }

  #[test]
  fn rolls_over_year_boundary() {
    assert_eq!(derive_due_date(ymd(2023, 12, 20), 15).unwrap(), ymd(2024, 1, 4));
  }

  #[test]
  fn handles_leap_day() {
    assert_eq!(derive_due_date(ymd(2024, 2, 28), 1).unwrap(), ymd(2024, 2, 29));
    assert_eq!(derive_due_date(ymd(2023, 2, 28), 1).unwrap(), ymd(2023, 3, 1));
  }

  #[test]
  fn difference_equals_frequency() {
    let start = ymd(2023, 10, 1);
    for frequency in [0_i64, 1, 15, 29, 30, 31, 180, 365, 366, 1000] {
      let due = derive_due_date(start, frequency).unwrap();
      assert_eq!((due - start).num_days(), frequency, "frequency {frequency}");
    }
  }

  #[test]
  fn zero_frequency_is_same_day() {
    assert_eq!(derive_due_date(ymd(2024, 5, 5), 0).unwrap(), ymd(2024, 5, 5));
  }

  #[test]
  fn negative_frequency_fails() {
    let err = derive_due_date(ymd(2024, 5, 5), -1).unwrap_err();
    assert!(matches!(err, Error::InvalidFrequency(-1)));
  }

  #[test]
  fn malformed_last_date_fails() {
    let err = derive_due_date_raw("yesterday", 30).unwrap_err();
    assert!(matches!(err, Error::InvalidDate(_)));
  }

  #[test]
  fn raw_form_parses_iso_dates() {
    assert_eq!(derive_due_date_raw("2023-10-01", 180).unwrap(), ymd(2024, 3, 29));
  }

  #[test]
  fn overflow_is_reported() {
    let err = derive_due_date(NaiveDate::MAX, 1).unwrap_err();
    assert!(matches!(err, Error::DateOutOfRange { days: 1, .. }));
  }

  #[test]
  fn month_overflow_reports_months() {
    let err = add_months(NaiveDate::MAX, 6).unwrap_err();
    assert!(matches!(err, Error::MonthsOutOfRange { months: 6, .. }));
    assert!(err.to_string().ends_with("plus 6 months is outside the supported calendar"));
  }

  #[test]
  fn months_clamp_to_end_of_month() {
    assert_eq!(add_months(ymd(2023, 11, 20), 6).unwrap(), ymd(2024, 5, 20));
    assert_eq!(add_months(ymd(2023, 8, 31), 6).unwrap(), ymd(2024, 2, 29));
  }
}
