//! Typed partial updates.
//!
//! Each category has a patch struct listing exactly the fields that may be
//! edited, all optional. A field left as `None` is untouched. Identity and
//! timestamps are never part of a patch. [`RecordPatch`] tags a patch with
//! its category so a single entry point can route single and bulk edits.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
  category::Category,
  record::{
    BaseEquipment, CatalogEntry, CatalogState, Handheld, HoseChecklist,
    IntegralItem, Luminaire, PressureTest, SafetyInstrument, Tank, Trailer,
    Unit, Vehicle, Worklift,
  },
};

macro_rules! patch {
  (
    $(#[$attr:meta])*
    $name:ident => $target:ty { $($field:ident: $ty:ty),* $(,)? }
  ) => {
    $(#[$attr])*
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    pub struct $name {
      $(
        #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
        pub $field: Option<$ty>,
      )*
    }

    impl $name {
      /// True when the patch names no field at all.
      pub fn is_empty(&self) -> bool {
        true $(&& self.$field.is_none())*
      }

      pub(crate) fn apply_to(&self, target: &mut $target) {
        $(
          if let Some(value) = &self.$field {
            target.$field = value.clone();
          }
        )*
      }
    }
  };
}

/// A field that appears in the input is `Some`, even when its value is
/// `null`. Absent fields fall back to `None` through `#[serde(default)]`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  T::deserialize(deserializer).map(Some)
}

// Deadline fields are `Option<Option<String>>`: `Some(None)`, or `null` in
// JSON, clears the date.

patch!(WorkliftPatch => Worklift {
  number: u32,
  kind: String,
  brand: String,
  model: String,
  serial_number: String,
  internal_number: String,
  location: String,
  inspection_date: Option<String>,
  inspection_due: Option<String>,
  enabled: bool,
  client_enabled: bool,
  operational_state: String,
  notes: String,
});

patch!(VehiclePatch => Vehicle {
  plate: String,
  internal_number: String,
  brand: String,
  model: String,
  condition: String,
  current_location: String,
  assigned_to: String,
  enabled: bool,
  client_enabled: bool,
  technical_review_due: Option<String>,
  provisional_permit_due: Option<String>,
  service_date: Option<String>,
  service_km: u64,
  current_km: u64,
  operational_state: String,
  notes: String,
});

patch!(TrailerPatch => Trailer {
  equipment: String,
  trailer_type: String,
  tag: String,
  features: String,
  notes: String,
});

patch!(TankPatch => Tank {
  number: u32,
  equipment: String,
  tank_type: String,
  tank_tag: String,
});

patch!(LuminairePatch => Luminaire {
  number: String,
  location: String,
});

patch!(HandheldPatch => Handheld {
  tag: String,
  brand: String,
  model: String,
  serial_number: String,
  location: String,
  checked_on: Option<String>,
  notes: String,
});

patch!(PressureTestPatch => PressureTest {
  tag: String,
  location: String,
  inspection_date: Option<String>,
  checklist: HoseChecklist,
  fit_for_service: bool,
  notes: String,
});

patch!(SafetyInstrumentPatch => SafetyInstrument {
  instrument_number: String,
  brand: String,
  location: String,
  last_calibration: Option<String>,
  frequency_days: i64,
  cylinder_test_due: Option<String>,
  certificate_number: String,
  fit_after_check: bool,
  owner: String,
  notes: String,
});

patch!(BaseEquipmentPatch => BaseEquipment {
  element: String,
  quantity: u32,
});

patch!(CatalogEntryPatch => CatalogEntry {
  item_number: u32,
  element: String,
  serial_number: String,
  location: String,
  state: CatalogState,
});

patch!(IntegralItemPatch => IntegralItem {
  item: String,
  variant: String,
  location: String,
  quantity: u32,
  unit: Unit,
});

// ─── Tagged patch ────────────────────────────────────────────────────────────

/// A patch for any category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "fields", rename_all = "snake_case")]
pub enum RecordPatch {
  Worklift(WorkliftPatch),
  Vehicle(VehiclePatch),
  Trailer(TrailerPatch),
  Tank(TankPatch),
  Luminaire(LuminairePatch),
  Handheld(HandheldPatch),
  PressureTest(PressureTestPatch),
  SafetyInstrument(SafetyInstrumentPatch),
  BaseEquipment(BaseEquipmentPatch),
  #[serde(rename = "catalog")]
  CatalogEntry(CatalogEntryPatch),
  #[serde(rename = "integral")]
  IntegralItem(IntegralItemPatch),
}

impl RecordPatch {
  pub fn category(&self) -> Category {
    match self {
      Self::Worklift(_) => Category::Worklift,
      Self::Vehicle(_) => Category::Vehicle,
      Self::Trailer(_) => Category::Trailer,
      Self::Tank(_) => Category::Tank,
      Self::Luminaire(_) => Category::Luminaire,
      Self::Handheld(_) => Category::Handheld,
      Self::PressureTest(_) => Category::PressureTest,
      Self::SafetyInstrument(_) => Category::SafetyInstrument,
      Self::BaseEquipment(_) => Category::BaseEquipment,
      Self::CatalogEntry(_) => Category::Catalog,
      Self::IntegralItem(_) => Category::Integral,
    }
  }
}
