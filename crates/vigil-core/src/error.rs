//! Error types for `vigil-core`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::category::Category;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid date: {0:?}")]
  InvalidDate(String),

  #[error("invalid frequency: {0} days (must be zero or positive)")]
  InvalidFrequency(i64),

  #[error("{date} plus {days} days is outside the supported calendar")]
  DateOutOfRange { date: NaiveDate, days: i64 },

  #[error("{date} plus {months} months is outside the supported calendar")]
  MonthsOutOfRange { date: NaiveDate, months: u32 },

  #[error("{category} record not found: {id}")]
  RecordNotFound { category: Category, id: String },

  #[error("duplicate {category} record id: {id}")]
  DuplicateRecord { category: Category, id: String },

  #[error("{0} record has an empty id")]
  MissingId(Category),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
