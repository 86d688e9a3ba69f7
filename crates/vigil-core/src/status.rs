//! Expiration-state classification.
//!
//! A state is never stored. It is recomputed from a due date and the
//! evaluation date on every read, so the same pair always yields the same
//! state.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Error, Result};

/// Due dates this many days out (or fewer) are critical.
pub const CRITICAL_WINDOW_DAYS: i64 = 7;

/// Due dates this many days out (or fewer) are about to expire.
pub const WARNING_WINDOW_DAYS: i64 = 30;

// ─── State ───────────────────────────────────────────────────────────────────

/// Where a deadline stands relative to the evaluation date.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ExpirationState {
  /// More than 30 days left.
  #[serde(rename = "VIGENTE")]
  #[strum(serialize = "VIGENTE")]
  Current,
  /// Between 8 and 30 days left.
  #[serde(rename = "POR_VENCER")]
  #[strum(serialize = "POR_VENCER")]
  DueSoon,
  /// Between 0 and 7 days left; due today counts as critical.
  #[serde(rename = "CRITICO")]
  #[strum(serialize = "CRITICO")]
  Critical,
  /// The due date has passed.
  #[serde(rename = "VENCIDO")]
  #[strum(serialize = "VENCIDO")]
  Overdue,
  /// No usable date.
  #[serde(rename = "N/A")]
  #[strum(serialize = "N/A")]
  NotApplicable,
}

impl ExpirationState {
  /// Overdue and critical deadlines need immediate action.
  pub fn requires_attention(self) -> bool {
    matches!(self, Self::Overdue | Self::Critical)
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse a stored date. Accepts `YYYY-MM-DD` and RFC 3339 / ISO date-times,
/// in which case only the calendar date is kept.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
  let trimmed = raw.trim();
  if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
    return Ok(date);
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
    return Ok(dt.date_naive());
  }
  if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
  {
    return Ok(dt.date());
  }
  Err(Error::InvalidDate(raw.to_owned()))
}

/// Like [`parse_date`], but a blank or missing value is `Ok(None)` rather
/// than an error.
pub fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
  match raw.map(str::trim) {
    None | Some("") => Ok(None),
    Some(text) => parse_date(text).map(Some),
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Whole calendar days from `today` until `due`; negative once it has passed.
pub fn days_remaining(due: NaiveDate, today: NaiveDate) -> i64 {
  (due - today).num_days()
}

/// Classify a due date as of `today`.
pub fn classify(due: Option<NaiveDate>, today: NaiveDate) -> ExpirationState {
  let Some(due) = due else {
    return ExpirationState::NotApplicable;
  };
  match days_remaining(due, today) {
    d if d < 0 => ExpirationState::Overdue,
    d if d <= CRITICAL_WINDOW_DAYS => ExpirationState::Critical,
    d if d <= WARNING_WINDOW_DAYS => ExpirationState::DueSoon,
    _ => ExpirationState::Current,
  }
}

/// Classify a stored date string. Malformed input degrades to
/// [`ExpirationState::NotApplicable`] instead of failing.
pub fn classify_raw(due: Option<&str>, today: NaiveDate) -> ExpirationState {
  classify(parse_optional_date(due).ok().flatten(), today)
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Tally of states across a set of deadlines (the dashboard counters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
  pub overdue:        usize,
  pub critical:       usize,
  pub due_soon:       usize,
  pub current:        usize,
  pub not_applicable: usize,
}

impl StatusSummary {
  pub fn tally(states: impl IntoIterator<Item = ExpirationState>) -> Self {
    let mut summary = Self::default();
    for state in states {
      summary.record(state);
    }
    summary
  }

  pub fn record(&mut self, state: ExpirationState) {
    match state {
      ExpirationState::Overdue => self.overdue += 1,
      ExpirationState::Critical => self.critical += 1,
      ExpirationState::DueSoon => self.due_soon += 1,
      ExpirationState::Current => self.current += 1,
      ExpirationState::NotApplicable => self.not_applicable += 1,
    }
  }

  /// Overdue plus critical.
  pub fn requires_attention(&self) -> usize { self.overdue + self.critical }

  pub fn total(&self) -> usize {
    self.overdue + self.critical + self.due_soon + self.current + self.not_applicable
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use chrono::Days;

  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 15).unwrap() }

  fn offset(days: i64) -> Option<NaiveDate> {
    let t = today();
    if days >= 0 {
      t.checked_add_days(Days::new(days as u64))
    } else {
      t.checked_sub_days(Days::new(days.unsigned_abs()))
    }
  }

  // ─── Boundaries ────────────────────────────────────────────────────────

  #[test]
  fn yesterday_is_overdue() {
    assert_eq!(classify(offset(-1), today()), ExpirationState::Overdue);
  }

  #[test]
  fn today_is_critical() {
    assert_eq!(classify(offset(0), today()), ExpirationState::Critical);
  }

  #[test]
  fn seven_days_is_critical() {
    assert_eq!(classify(offset(7), today()), ExpirationState::Critical);
  }

  #[test]
  fn eight_days_is_due_soon() {
    assert_eq!(classify(offset(8), today()), ExpirationState::DueSoon);
  }

  #[test]
  fn thirty_days_is_due_soon() {
    assert_eq!(classify(offset(30), today()), ExpirationState::DueSoon);
  }

  #[test]
  fn thirty_one_days_is_current() {
    assert_eq!(classify(offset(31), today()), ExpirationState::Current);
  }

  #[test]
  fn missing_date_is_not_applicable() {
    assert_eq!(classify(None, today()), ExpirationState::NotApplicable);
  }

  #[test]
  fn far_past_and_future() {
    assert_eq!(classify(offset(-400), today()), ExpirationState::Overdue);
    assert_eq!(classify(offset(400), today()), ExpirationState::Current);
  }

  // ─── Raw input ─────────────────────────────────────────────────────────

  #[test]
  fn raw_classification_is_lenient() {
    assert_eq!(
      classify_raw(Some("not a date"), today()),
      ExpirationState::NotApplicable
    );
    assert_eq!(classify_raw(Some(""), today()), ExpirationState::NotApplicable);
    assert_eq!(classify_raw(None, today()), ExpirationState::NotApplicable);
    assert_eq!(
      classify_raw(Some("2024-03-22"), today()),
      ExpirationState::Critical
    );
  }

  #[test]
  fn time_of_day_is_ignored() {
    assert_eq!(
      parse_date("2024-03-14T23:59:59Z").unwrap(),
      NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    );
    assert_eq!(
      classify_raw(Some("2024-03-14T23:59:59.000Z"), today()),
      ExpirationState::Overdue
    );
    assert_eq!(
      parse_date("2024-03-16T08:00:00").unwrap(),
      NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
    );
  }

  #[test]
  fn strict_parse_reports_input() {
    let err = parse_date("31/12/2024").unwrap_err();
    assert!(matches!(err, Error::InvalidDate(s) if s == "31/12/2024"));
  }

  #[test]
  fn days_remaining_signs() {
    assert_eq!(days_remaining(offset(5).unwrap(), today()), 5);
    assert_eq!(days_remaining(offset(-3).unwrap(), today()), -3);
  }

  // ─── Labels ────────────────────────────────────────────────────────────

  #[test]
  fn labels_round_trip_through_strum_and_serde() {
    assert_eq!(ExpirationState::DueSoon.to_string(), "POR_VENCER");
    assert_eq!(ExpirationState::NotApplicable.to_string(), "N/A");
    assert_eq!(
      ExpirationState::from_str("critico").unwrap(),
      ExpirationState::Critical
    );
    assert_eq!(
      serde_json::to_string(&ExpirationState::NotApplicable).unwrap(),
      "\"N/A\""
    );
    let parsed: ExpirationState = serde_json::from_str("\"VENCIDO\"").unwrap();
    assert_eq!(parsed, ExpirationState::Overdue);
  }

  // ─── Summary ───────────────────────────────────────────────────────────

  #[test]
  fn summary_counts_each_bucket() {
    let summary = StatusSummary::tally([
      ExpirationState::Overdue,
      ExpirationState::Critical,
      ExpirationState::Critical,
      ExpirationState::DueSoon,
      ExpirationState::Current,
      ExpirationState::NotApplicable,
    ]);
    assert_eq!(summary.overdue, 1);
    assert_eq!(summary.critical, 2);
    assert_eq!(summary.due_soon, 1);
    assert_eq!(summary.current, 1);
    assert_eq!(summary.not_applicable, 1);
    assert_eq!(summary.requires_attention(), 3);
    assert_eq!(summary.total(), 6);
  }
}
