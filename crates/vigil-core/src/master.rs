//! The master list: consolidated quantities derived from the categories.
//!
//! Every recomputation re-derives every line item from scratch. The rule for
//! an item is chosen by name alone, first match wins, so an item is counted by
//! exactly one rule.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{category::Category, registry::CategoryRegistry};

/// The default catalog of master line items, in report order.
pub const MASTER_CATALOG: &[&str] = &[
  "Pick up",
  "Manipuladores telescópicos",
  "Autoelevador",
  "Plataforma telescópica",
  "Tráiler",
  "Luminarias",
  "Generadores",
  "Tanques de agua",
  "Tanques de gas oíl",
  "HCR",
  "Plug cátcher",
  "Desander",
  "Manifold 3 1/16” 10 KPSI",
  "Manifold 3 1/16” 15 KPSI",
  "Manifold 2\" 15 KPSI",
  "Cabina de control",
  "Sensores de presión",
  "Sensores de nivel",
  "Piletas con zaranda y golpeador",
  "Piletas con golpeador",
  "Bombas de PH 15 Kpsi",
  "Bomba de PH 10 Kpsi",
  "Manómetros digitales",
  "Torqueadoras",
  "Graseras chicas",
  "Graseras Lincol",
  "Unidad de filtrado",
  "Taller",
  "Hidrolavadora",
  "Bomba centrifuga eléctrica",
  "Bomba centrifuga a explosión",
  "Pileta con tornillo",
  "Pileta con removedores + generador",
  "Piletas de 70 m3",
  "Líneas integrales 3\"1502",
  "Líneas integrales 2\"1502",
  "Codos 3\"",
  "Codos 2\"",
  "TEE 3\"",
  "TEE 2\"",
  "Red 3M a 2H",
  "Red 3H a 2M",
  "VTB 2x2",
  "VTB 3x3",
  "VTB 2x1",
  "Equipos autónomos",
  "Detectores fijos de H2S",
  "Detectores fijos de mezcla explosiva",
  "Portatiles multigas",
  "Portatiles monogas",
  "Handy",
];

/// Names counted as the whole of one collection.
const WHOLE_COLLECTIONS: &[(&str, Category)] = &[
  ("Pick up", Category::Vehicle),
  ("Tráiler", Category::Trailer),
  ("Luminarias", Category::Luminaire),
  ("Handy", Category::Handheld),
];

/// Trailer-like units tracked on the list but not counted from any module.
const UNCOUNTED: &[&str] = &["Cabina de control", "Taller"];

/// Names containing this marker count tanks by `tank_type`.
const TANK_MARKER: &str = "Tanques de";

/// Names counting worklifts by `kind`.
const WORKLIFT_KINDS: &[&str] =
  &["Manipuladores telescópicos", "Autoelevador", "Plataforma telescópica"];

/// Names containing any of these sum the integral inventory.
const FITTING_MARKERS: &[&str] = &["Líneas integrales", "Codos", "TEE", "Red", "VTB"];

/// Every "Líneas…" item also matches rows of this family.
const LINE_FAMILY: &str = "Líneas";

// ─── Types ───────────────────────────────────────────────────────────────────

/// Which rule produced a line item's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "category", rename_all = "snake_case")]
pub enum Provenance {
  /// Seed value; never recomputed.
  Manual,
  /// Size of a whole collection.
  Collection(Category),
  /// Filtered count over a subtype field.
  Subtype(Category),
  /// Sum of inventory quantities.
  InventorySum,
  /// Count of catalog entries mentioning the name.
  Catalog,
  /// No rule produced a count.
  NoRule,
}

impl fmt::Display for Provenance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Manual => f.write_str("Manual"),
      Self::Collection(category) => write!(f, "Módulo {}", category.label()),
      Self::Subtype(category) => write!(f, "Módulo {} (por tipo)", category.label()),
      Self::InventorySum => write!(f, "{} (Suma)", Category::Integral.label()),
      Self::Catalog => f.write_str(Category::Catalog.label()),
      Self::NoRule => f.write_str("Manual / Sin Regla"),
    }
  }
}

/// One row of the master list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterLineItem {
  pub id:                 String,
  pub name:               String,
  pub quantity:           u64,
  pub provenance:         Provenance,
  /// `None` until the first recomputation.
  pub last_calculated_at: Option<DateTime<Utc>>,
}

/// The rule selected for a line item name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule<'a> {
  Collection(Category),
  Uncounted,
  TankType,
  WorkliftKind,
  Fitting {
    /// First whitespace token of the name.
    keyword:     &'a str,
    line_family: bool,
  },
  CatalogSearch,
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

/// The default catalog, not yet computed.
pub fn seed() -> Vec<MasterLineItem> { seed_from(MASTER_CATALOG.iter().copied()) }

/// A caller-supplied catalog, not yet computed. Ids are `master-{index}`.
pub fn seed_from<I, S>(names: I) -> Vec<MasterLineItem>
where
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  names
    .into_iter()
    .enumerate()
    .map(|(idx, name)| MasterLineItem {
      id:                 format!("master-{idx}"),
      name:               name.into(),
      quantity:           0,
      provenance:         Provenance::Manual,
      last_calculated_at: None,
    })
    .collect()
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Choose the rule for a line item name. The checks run in a fixed order and
/// the first that applies wins.
pub fn select_rule(name: &str) -> Rule<'_> {
  if let Some((_, category)) = WHOLE_COLLECTIONS.iter().find(|(n, _)| *n == name) {
    return Rule::Collection(*category);
  }
  if UNCOUNTED.contains(&name) {
    return Rule::Uncounted;
  }
  if name.contains(TANK_MARKER) {
    return Rule::TankType;
  }
  if WORKLIFT_KINDS.contains(&name) {
    return Rule::WorkliftKind;
  }
  if FITTING_MARKERS.iter().any(|marker| name.contains(marker)) {
    // TODO: first-token matching gives every size of a fitting the same
    // total (both `Codos` rows sum together); needs a size-aware key.
    let keyword = name.split(' ').next().unwrap_or(name);
    return Rule::Fitting {
      keyword,
      line_family: name.contains(LINE_FAMILY),
    };
  }
  Rule::CatalogSearch
}

/// Evaluate one rule against the registry.
pub fn evaluate(
  rule: Rule<'_>,
  name: &str,
  registry: &CategoryRegistry,
) -> (u64, Provenance) {
  match rule {
    Rule::Collection(category) => {
      (registry.count(category) as u64, Provenance::Collection(category))
    }
    Rule::Uncounted => (0, Provenance::NoRule),
    Rule::TankType => {
      let count = registry
        .tanks()
        .iter()
        .filter(|t| t.tank_type.contains(name))
        .count();
      (count as u64, Provenance::Subtype(Category::Tank))
    }
    Rule::WorkliftKind => {
      let count = registry
        .worklifts()
        .iter()
        .filter(|w| w.kind.contains(name))
        .count();
      (count as u64, Provenance::Subtype(Category::Worklift))
    }
    Rule::Fitting {
      keyword,
      line_family,
    } => {
      let sum = registry
        .integrals()
        .iter()
        .filter(|i| {
          i.item.contains(keyword) || (line_family && i.item.contains(LINE_FAMILY))
        })
        .map(|i| u64::from(i.quantity))
        .sum();
      (sum, Provenance::InventorySum)
    }
    Rule::CatalogSearch => {
      let count = registry
        .catalog()
        .iter()
        .filter(|c| c.element.contains(name))
        .count();
      if count > 0 {
        (count as u64, Provenance::Catalog)
      } else {
        (0, Provenance::NoRule)
      }
    }
  }
}

// ─── Recompute ───────────────────────────────────────────────────────────────

/// Recompute every line item against the registry. Items keep their order,
/// id and name; quantity, provenance and `last_calculated_at` are replaced.
pub fn recompute(
  items: &[MasterLineItem],
  registry: &CategoryRegistry,
  now: DateTime<Utc>,
) -> Vec<MasterLineItem> {
  let recomputed: Vec<MasterLineItem> = items
    .iter()
    .map(|item| {
      let (quantity, provenance) =
        evaluate(select_rule(&item.name), &item.name, registry);
      MasterLineItem {
        id: item.id.clone(),
        name: item.name.clone(),
        quantity,
        provenance,
        last_calculated_at: Some(now),
      }
    })
    .collect();

  tracing::debug!(
    items = recomputed.len(),
    counted = recomputed.iter().filter(|i| i.provenance != Provenance::NoRule).count(),
    "recomputed master list"
  );
  recomputed
}
