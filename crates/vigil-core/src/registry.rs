//! The category registry: one owned, encapsulated collection per category.
//!
//! Records are read through slices and iterators and changed only through
//! [`Collection::insert`], [`Collection::update`], [`Collection::bulk_update`]
//! and [`Collection::remove`]. The aggregators take `&CategoryRegistry`, so
//! they can never mutate what they read.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
  Error, Result,
  category::Category,
  patch::RecordPatch,
  record::{
    BaseEquipment, CatalogEntry, Handheld, IntegralItem, Luminaire,
    PressureTest, Record, SafetyInstrument, Tank, Trailer, Vehicle, Worklift,
  },
};

// ─── Collection ──────────────────────────────────────────────────────────────

/// Records of one category, in insertion order, with unique non-empty ids.
#[derive(Clone, PartialEq)]
pub struct Collection<R> {
  records: Vec<R>,
}

impl<R> Default for Collection<R> {
  fn default() -> Self { Self { records: Vec::new() } }
}

impl<R: fmt::Debug> fmt::Debug for Collection<R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(&self.records).finish()
  }
}

impl<R: Record> Collection<R> {
  pub fn new() -> Self { Self::default() }

  /// Build a collection, rejecting empty or duplicate ids.
  pub fn from_records(records: Vec<R>) -> Result<Self> {
    let mut collection = Self::new();
    for record in records {
      collection.insert(record)?;
    }
    Ok(collection)
  }

  pub fn category(&self) -> Category { R::CATEGORY }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn iter(&self) -> std::slice::Iter<'_, R> { self.records.iter() }

  pub fn as_slice(&self) -> &[R] { &self.records }

  pub fn get(&self, id: &str) -> Option<&R> {
    self.records.iter().find(|r| r.id() == id)
  }

  fn position(&self, id: &str) -> Result<usize> {
    self
      .records
      .iter()
      .position(|r| r.id() == id)
      .ok_or_else(|| Error::RecordNotFound {
        category: R::CATEGORY,
        id:       id.to_owned(),
      })
  }

  /// Append a record.
  pub fn insert(&mut self, record: R) -> Result<()> {
    if record.id().is_empty() {
      return Err(Error::MissingId(R::CATEGORY));
    }
    if self.get(record.id()).is_some() {
      return Err(Error::DuplicateRecord {
        category: R::CATEGORY,
        id:       record.id().to_owned(),
      });
    }
    self.records.push(record);
    Ok(())
  }

  /// Apply `patch` to the record with `id` and stamp `updated_at = now`.
  pub fn update(
    &mut self,
    id: &str,
    patch: &R::Patch,
    now: DateTime<Utc>,
  ) -> Result<&R> {
    let index = self.position(id)?;
    let record = &mut self.records[index];
    record.apply_patch(patch);
    record.meta_mut().updated_at = now;
    Ok(record)
  }

  /// Apply the same patch to every listed record. Ids that are not present
  /// are skipped; returns how many records were updated.
  pub fn bulk_update<S: AsRef<str>>(
    &mut self,
    ids: &[S],
    patch: &R::Patch,
    now: DateTime<Utc>,
  ) -> usize {
    let mut updated = 0;
    for id in ids {
      let id = id.as_ref();
      match self.update(id, patch, now) {
        Ok(_) => updated += 1,
        Err(_) => tracing::debug!(category = %R::CATEGORY, id, "bulk update skipped unknown id"),
      }
    }
    updated
  }

  pub fn remove(&mut self, id: &str) -> Result<R> {
    let index = self.position(id)?;
    Ok(self.records.remove(index))
  }
}

impl<'a, R> IntoIterator for &'a Collection<R> {
  type Item = &'a R;
  type IntoIter = std::slice::Iter<'a, R>;

  fn into_iter(self) -> Self::IntoIter { self.records.iter() }
}

impl<R: Serialize> Serialize for Collection<R> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(&self.records)
  }
}

impl<'de, R> Deserialize<'de> for Collection<R>
where
  R: Record + Deserialize<'de>,
{
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let records = Vec::<R>::deserialize(deserializer)?;
    Self::from_records(records).map_err(serde::de::Error::custom)
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// All category collections. Each collection is authoritative for its own
/// records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRegistry {
  worklifts:          Collection<Worklift>,
  vehicles:           Collection<Vehicle>,
  trailers:           Collection<Trailer>,
  tanks:              Collection<Tank>,
  luminaires:         Collection<Luminaire>,
  handhelds:          Collection<Handheld>,
  pressure_tests:     Collection<PressureTest>,
  safety_instruments: Collection<SafetyInstrument>,
  base_equipment:     Collection<BaseEquipment>,
  catalog:            Collection<CatalogEntry>,
  integrals:          Collection<IntegralItem>,
}

macro_rules! accessors {
  ($($field:ident, $field_mut:ident: $ty:ty;)*) => {
    impl CategoryRegistry {
      $(
        pub fn $field(&self) -> &Collection<$ty> { &self.$field }

        pub fn $field_mut(&mut self) -> &mut Collection<$ty> { &mut self.$field }
      )*
    }
  };
}

accessors! {
  worklifts, worklifts_mut: Worklift;
  vehicles, vehicles_mut: Vehicle;
  trailers, trailers_mut: Trailer;
  tanks, tanks_mut: Tank;
  luminaires, luminaires_mut: Luminaire;
  handhelds, handhelds_mut: Handheld;
  pressure_tests, pressure_tests_mut: PressureTest;
  safety_instruments, safety_instruments_mut: SafetyInstrument;
  base_equipment, base_equipment_mut: BaseEquipment;
  catalog, catalog_mut: CatalogEntry;
  integrals, integrals_mut: IntegralItem;
}

impl CategoryRegistry {
  pub fn new() -> Self { Self::default() }

  /// Parse a JSON snapshot. Ids are validated per collection.
  pub fn from_json(json: &str) -> Result<Self> { Ok(serde_json::from_str(json)?) }

  pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string_pretty(self)?) }

  /// Number of records in one category.
  pub fn count(&self, category: Category) -> usize {
    match category {
      Category::Worklift => self.worklifts.len(),
      Category::Vehicle => self.vehicles.len(),
      Category::Trailer => self.trailers.len(),
      Category::Tank => self.tanks.len(),
      Category::Luminaire => self.luminaires.len(),
      Category::Handheld => self.handhelds.len(),
      Category::PressureTest => self.pressure_tests.len(),
      Category::SafetyInstrument => self.safety_instruments.len(),
      Category::BaseEquipment => self.base_equipment.len(),
      Category::Catalog => self.catalog.len(),
      Category::Integral => self.integrals.len(),
    }
  }

  /// Route a tagged patch to the collection it targets.
  pub fn apply_patch(
    &mut self,
    id: &str,
    patch: &RecordPatch,
    now: DateTime<Utc>,
  ) -> Result<()> {
    match patch {
      RecordPatch::Worklift(p) => self.worklifts.update(id, p, now).map(drop),
      RecordPatch::Vehicle(p) => self.vehicles.update(id, p, now).map(drop),
      RecordPatch::Trailer(p) => self.trailers.update(id, p, now).map(drop),
      RecordPatch::Tank(p) => self.tanks.update(id, p, now).map(drop),
      RecordPatch::Luminaire(p) => self.luminaires.update(id, p, now).map(drop),
      RecordPatch::Handheld(p) => self.handhelds.update(id, p, now).map(drop),
      RecordPatch::PressureTest(p) => {
        self.pressure_tests.update(id, p, now).map(drop)
      }
      RecordPatch::SafetyInstrument(p) => {
        self.safety_instruments.update(id, p, now).map(drop)
      }
      RecordPatch::BaseEquipment(p) => {
        self.base_equipment.update(id, p, now).map(drop)
      }
      RecordPatch::CatalogEntry(p) => self.catalog.update(id, p, now).map(drop),
      RecordPatch::IntegralItem(p) => self.integrals.update(id, p, now).map(drop),
    }
  }

  /// Bulk form of [`apply_patch`](Self::apply_patch); unknown ids are
  /// skipped. Returns the number of records updated.
  pub fn bulk_apply_patch<S: AsRef<str>>(
    &mut self,
    ids: &[S],
    patch: &RecordPatch,
    now: DateTime<Utc>,
  ) -> usize {
    match patch {
      RecordPatch::Worklift(p) => self.worklifts.bulk_update(ids, p, now),
      RecordPatch::Vehicle(p) => self.vehicles.bulk_update(ids, p, now),
      RecordPatch::Trailer(p) => self.trailers.bulk_update(ids, p, now),
      RecordPatch::Tank(p) => self.tanks.bulk_update(ids, p, now),
      RecordPatch::Luminaire(p) => self.luminaires.bulk_update(ids, p, now),
      RecordPatch::Handheld(p) => self.handhelds.bulk_update(ids, p, now),
      RecordPatch::PressureTest(p) => self.pressure_tests.bulk_update(ids, p, now),
      RecordPatch::SafetyInstrument(p) => {
        self.safety_instruments.bulk_update(ids, p, now)
      }
      RecordPatch::BaseEquipment(p) => self.base_equipment.bulk_update(ids, p, now),
      RecordPatch::CatalogEntry(p) => self.catalog.bulk_update(ids, p, now),
      RecordPatch::IntegralItem(p) => self.integrals.bulk_update(ids, p, now),
    }
  }
}
