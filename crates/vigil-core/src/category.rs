//! The equipment categories held by the registry.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// One registry collection. The declaration order is the order in which
/// collections are walked when aggregating.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Category {
  Worklift,
  Vehicle,
  Trailer,
  Tank,
  Luminaire,
  Handheld,
  PressureTest,
  SafetyInstrument,
  BaseEquipment,
  Catalog,
  Integral,
}

impl Category {
  /// Human-readable module name shown next to counts and events.
  pub fn label(self) -> &'static str {
    match self {
      Self::Worklift => "Worklift / Plataformas",
      Self::Vehicle => "Flota Pickups",
      Self::Trailer => "Trailers",
      Self::Tank => "Tanques",
      Self::Luminaire => "Luminarias",
      Self::Handheld => "Handies",
      Self::PressureTest => "TPR Checklist",
      Self::SafetyInstrument => "HSE",
      Self::BaseEquipment => "Base y Equipos",
      Self::Catalog => "Catálogo ID",
      Self::Integral => "Inventario Integrales",
    }
  }
}
