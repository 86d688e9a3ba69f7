//! Record types: one per registry category.
//!
//! Deadline fields are kept as the raw strings received from the persistence
//! layer. They are parsed when a state or due date is requested, so that one
//! malformed value degrades a single status instead of rejecting the whole
//! snapshot. For the same reason every record field has a default, so a
//! partially filled record still loads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  category::Category,
  patch::{
    BaseEquipmentPatch, CatalogEntryPatch, HandheldPatch, IntegralItemPatch,
    LuminairePatch, PressureTestPatch, SafetyInstrumentPatch, TankPatch,
    TrailerPatch, VehiclePatch, WorkliftPatch,
  },
  schedule::{add_months, derive_due_date_raw},
  status::{ExpirationState, classify, classify_raw, days_remaining, parse_optional_date},
};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Identity and bookkeeping timestamps carried by every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
  pub id:         String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Meta {
  /// Fresh identity with a random id.
  pub fn new(now: DateTime<Utc>) -> Self {
    Self::with_id(Uuid::new_v4().to_string(), now)
  }

  pub fn with_id(id: impl Into<String>, now: DateTime<Utc>) -> Self {
    Self {
      id:         id.into(),
      created_at: now,
      updated_at: now,
    }
  }
}

/// Implemented by every record type stored in a
/// [`Collection`](crate::registry::Collection).
pub trait Record: Clone {
  const CATEGORY: Category;

  /// The typed partial update accepted for this category.
  type Patch;

  fn meta(&self) -> &Meta;

  fn meta_mut(&mut self) -> &mut Meta;

  /// Overwrite the fields named in `patch`; identity and timestamps are left
  /// to the caller.
  fn apply_patch(&mut self, patch: &Self::Patch);

  fn id(&self) -> &str { &self.meta().id }
}

macro_rules! impl_record {
  ($ty:ty, $category:expr, $patch:ty) => {
    impl Record for $ty {
      const CATEGORY: Category = $category;
      type Patch = $patch;

      fn meta(&self) -> &Meta { &self.meta }

      fn meta_mut(&mut self) -> &mut Meta { &mut self.meta }

      fn apply_patch(&mut self, patch: &Self::Patch) { patch.apply_to(self) }
    }
  };
}

// ─── Worklifts ───────────────────────────────────────────────────────────────

/// A telescopic platform, telehandler or forklift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Worklift {
  #[serde(flatten)]
  pub meta:              Meta,
  pub number:            u32,
  /// Subtype, e.g. "Plataforma telescópica". Matched by the master list.
  pub kind:              String,
  pub brand:             String,
  pub model:             String,
  pub serial_number:     String,
  pub internal_number:   String,
  pub location:          String,
  pub inspection_date:   Option<String>,
  pub inspection_due:    Option<String>,
  pub enabled:           bool,
  /// Cleared for operation on the client's sites.
  pub client_enabled:    bool,
  pub operational_state: String,
  pub notes:             String,
}

impl Worklift {
  pub fn inspection_state(&self, today: NaiveDate) -> ExpirationState {
    classify_raw(self.inspection_due.as_deref(), today)
  }
}

impl_record!(Worklift, Category::Worklift, WorkliftPatch);

// ─── Vehicles ────────────────────────────────────────────────────────────────

/// A pickup in the light-vehicle fleet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vehicle {
  #[serde(flatten)]
  pub meta:                   Meta,
  pub number:                 u32,
  /// Licence plate.
  pub plate:                  String,
  pub model_year:             String,
  pub condition:              String,
  pub internal_number:        String,
  pub traction:               String,
  pub satellite_tracking:     bool,
  pub brand:                  String,
  pub model:                  String,
  pub current_location:       String,
  pub assigned_to:            String,
  pub enabled:                bool,
  pub client_enabled:         bool,
  /// Mandatory vehicle technical review.
  pub technical_review_due:   Option<String>,
  /// Provisional circulation permit, when one was issued.
  pub provisional_permit_due: Option<String>,
  pub service_date:           Option<String>,
  pub service_km:             u64,
  pub current_km:             u64,
  pub operational_state:      String,
  pub notes:                  String,
}

impl Vehicle {
  pub fn technical_review_state(&self, today: NaiveDate) -> ExpirationState {
    classify_raw(self.technical_review_due.as_deref(), today)
  }

  pub fn provisional_permit_state(&self, today: NaiveDate) -> ExpirationState {
    classify_raw(self.provisional_permit_due.as_deref(), today)
  }
}

impl_record!(Vehicle, Category::Vehicle, VehiclePatch);

// ─── Trailers, tanks, luminaires ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trailer {
  #[serde(flatten)]
  pub meta:         Meta,
  pub equipment:    String,
  pub trailer_type: String,
  /// Asset tag for the current numbering campaign.
  pub tag:          String,
  pub features:     String,
  pub notes:        String,
}

impl_record!(Trailer, Category::Trailer, TrailerPatch);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tank {
  #[serde(flatten)]
  pub meta:      Meta,
  pub number:    u32,
  pub equipment: String,
  /// Subtype, e.g. "Tanques de agua". Matched by the master list.
  pub tank_type: String,
  pub tank_tag:  String,
}

impl_record!(Tank, Category::Tank, TankPatch);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Luminaire {
  #[serde(flatten)]
  pub meta:     Meta,
  pub number:   String,
  pub location: String,
}

impl_record!(Luminaire, Category::Luminaire, LuminairePatch);

// ─── Handhelds ───────────────────────────────────────────────────────────────

/// A handheld radio and its accessories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Handheld {
  #[serde(flatten)]
  pub meta:               Meta,
  pub tag:                String,
  pub brand:              String,
  pub model:              String,
  pub serial_number:      String,
  pub battery:            String,
  pub battery_model:      String,
  pub battery_serial:     String,
  pub charger_base:       String,
  pub charger_model:      String,
  pub charger_serial:     String,
  pub power_supply:       String,
  pub power_supply_model: String,
  pub received_on:        Option<String>,
  pub location:           String,
  pub checked_on:         Option<String>,
  pub notes:              String,
}

impl_record!(Handheld, Category::Handheld, HandheldPatch);

// ─── Pressure tests ──────────────────────────────────────────────────────────

/// Visual checklist results for a hose inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoseChecklist {
  pub has_label:        bool,
  pub chemical_burns:   bool,
  pub cuts_or_holes:    bool,
  pub abrasive_wear:    bool,
  pub broken_stitching: bool,
  pub other_damage:     bool,
}

impl HoseChecklist {
  /// A hose passes when it is labelled and shows no damage.
  pub fn passes(&self) -> bool {
    self.has_label
      && !(self.chemical_burns
        || self.cuts_or_holes
        || self.abrasive_wear
        || self.broken_stitching
        || self.other_damage)
  }
}

/// A pressure-rated hose (TPR) and its last inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureTest {
  #[serde(flatten)]
  pub meta:            Meta,
  pub item:            u32,
  pub location:        String,
  pub tag:             String,
  pub length_m:        f64,
  pub max_cwp_psi:     u32,
  pub inspection_date: Option<String>,
  pub brand:           String,
  pub checklist:       HoseChecklist,
  pub fit_for_service: bool,
  pub notes:           String,
}

impl PressureTest {
  /// No due date is stored for hoses; it is the inspection date plus
  /// `validity_months`. `Ok(None)` when there is no inspection date.
  pub fn due_date(&self, validity_months: u32) -> Result<Option<NaiveDate>> {
    parse_optional_date(self.inspection_date.as_deref())?
      .map(|date| add_months(date, validity_months))
      .transpose()
  }

  pub fn inspection_state(
    &self,
    today: NaiveDate,
    validity_months: u32,
  ) -> ExpirationState {
    classify(self.due_date(validity_months).ok().flatten(), today)
  }
}

impl_record!(PressureTest, Category::PressureTest, PressureTestPatch);

// ─── Safety instruments ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
  /// Gas detector, fixed or portable.
  #[default]
  Detector,
  /// Self-contained breathing apparatus (ERA), which also carries a cylinder.
  BreathingApparatus,
}

impl InstrumentKind {
  pub fn label(self) -> &'static str {
    match self {
      Self::Detector => "Detectores",
      Self::BreathingApparatus => "Equipos ERA",
    }
  }

  pub fn code(self) -> &'static str {
    match self {
      Self::Detector => "DETECTOR",
      Self::BreathingApparatus => "ERA",
    }
  }
}

/// A calibrated HSE instrument. Its calibration due date is derived from the
/// last calibration and the frequency; breathing apparatus add a second,
/// independent cylinder hydrostatic-test deadline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyInstrument {
  #[serde(flatten)]
  pub meta:                Meta,
  pub kind:                InstrumentKind,
  pub location:            String,
  pub instrument_number:   String,
  pub brand:               String,
  pub model:               Option<String>,
  /// Detector sensor type.
  pub sensor_type:         Option<String>,
  pub cylinder_serial:     Option<String>,
  pub cylinder_test_due:   Option<String>,
  pub last_calibration:    Option<String>,
  pub frequency_days:      i64,
  pub certificate_number:  String,
  pub acceptance_criteria: String,
  pub fit_after_check:     bool,
  /// Person responsible for the instrument.
  pub owner:               String,
  pub notes:               String,
}

impl SafetyInstrument {
  /// Next calibration due date. `Ok(None)` when the instrument was never
  /// calibrated; errors when the stored date or frequency is invalid.
  pub fn calibration_due(&self) -> Result<Option<NaiveDate>> {
    match self.last_calibration.as_deref().map(str::trim) {
      None | Some("") => Ok(None),
      Some(last) => derive_due_date_raw(last, self.frequency_days).map(Some),
    }
  }

  pub fn calibration_state(&self, today: NaiveDate) -> ExpirationState {
    classify(self.calibration_due().ok().flatten(), today)
  }

  pub fn days_until_calibration(&self, today: NaiveDate) -> Option<i64> {
    self
      .calibration_due()
      .ok()
      .flatten()
      .map(|due| days_remaining(due, today))
  }

  /// Only breathing apparatus have a cylinder; detectors are always N/A.
  pub fn cylinder_test_state(&self, today: NaiveDate) -> ExpirationState {
    match self.kind {
      InstrumentKind::BreathingApparatus => {
        classify_raw(self.cylinder_test_due.as_deref(), today)
      }
      InstrumentKind::Detector => ExpirationState::NotApplicable,
    }
  }
}

impl_record!(SafetyInstrument, Category::SafetyInstrument, SafetyInstrumentPatch);

// ─── Inventories ─────────────────────────────────────────────────────────────

/// Counted base furniture and equipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseEquipment {
  #[serde(flatten)]
  pub meta:     Meta,
  pub element:  String,
  pub quantity: u32,
}

impl_record!(BaseEquipment, Category::BaseEquipment, BaseEquipmentPatch);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogState {
  #[default]
  Active,
  Retired,
  InRepair,
}

/// An individually identified item in the catalog of record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
  #[serde(flatten)]
  pub meta:          Meta,
  pub item_number:   u32,
  /// Free-text description searched by the master-list fallback rule.
  pub element:       String,
  pub serial_number: String,
  pub features:      String,
  pub location:      String,
  pub state:         CatalogState,
  pub notes:         String,
}

impl_record!(CatalogEntry, Category::Catalog, CatalogEntryPatch);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
  Meters,
  #[default]
  Units,
}

/// A normalised inventory row of integral pipe fittings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegralItem {
  #[serde(flatten)]
  pub meta:     Meta,
  pub location: String,
  /// e.g. `Codos 2"`, `Líneas integrales 2"1502`.
  pub item:     String,
  pub variant:  String,
  pub unit:     Unit,
  pub quantity: u32,
  pub notes:    String,
}

impl_record!(IntegralItem, Category::Integral, IntegralItemPatch);
