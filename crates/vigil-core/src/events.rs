//! The due-event timeline.
//!
//! [`collect_events`] walks every deadline-bearing field of every record and
//! emits one [`DueEvent`] per populated field, sorted by date. Events are
//! rebuilt on every call; nothing here is cached or stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  category::Category,
  record::{InstrumentKind, Record},
  registry::CategoryRegistry,
  status::{ExpirationState, StatusSummary, classify, parse_optional_date},
};

/// Default validity of a hose inspection, in months.
pub const DEFAULT_PRESSURE_TEST_VALIDITY_MONTHS: u32 = 6;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Business rules for deadlines that are not stored on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRules {
  /// A pressure-test hose is due this many months after its inspection.
  pub pressure_test_validity_months: u32,
}

impl Default for EventRules {
  fn default() -> Self {
    Self {
      pressure_test_validity_months: DEFAULT_PRESSURE_TEST_VALIDITY_MONTHS,
    }
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// Which field of the record a deadline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deadline {
  Inspection,
  TechnicalReview,
  ProvisionalPermit,
  Calibration,
  CylinderTest,
}

/// One deadline of one record, as shown on the calendar and list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueEvent {
  pub record_id: String,
  pub category:  Category,
  /// Module name shown to users; safety instruments split by kind.
  pub label:     String,
  pub deadline:  Deadline,
  pub title:     String,
  pub date:      NaiveDate,
  pub state:     ExpirationState,
  pub details:   String,
  pub owner:     Option<String>,
}

// ─── Walking deadlines ───────────────────────────────────────────────────────

/// A deadline located on a record, before its date is known to be usable.
struct Pending<'a> {
  record_id: &'a str,
  category:  Category,
  label:     &'static str,
  deadline:  Deadline,
  title:     String,
  details:   String,
  owner:     Option<String>,
}

impl Pending<'_> {
  fn into_event(self, date: NaiveDate, today: NaiveDate) -> DueEvent {
    DueEvent {
      record_id: self.record_id.to_owned(),
      category: self.category,
      label: self.label.to_owned(),
      deadline: self.deadline,
      title: self.title,
      date,
      state: classify(Some(date), today),
      details: self.details,
      owner: self.owner,
    }
  }
}

fn stored(raw: Option<&str>) -> Result<Option<NaiveDate>> { parse_optional_date(raw) }

/// Visit every deadline field of every deadline-bearing record, populated or
/// not, in category-then-record-then-field order.
fn walk<'a>(
  registry: &'a CategoryRegistry,
  rules: &EventRules,
  mut visit: impl FnMut(Pending<'a>, Result<Option<NaiveDate>>),
) {
  for w in registry.worklifts() {
    visit(
      Pending {
        record_id: w.id(),
        category:  Category::Worklift,
        label:     Category::Worklift.label(),
        deadline:  Deadline::Inspection,
        title:     format!("Worklift {} - {}", w.internal_number, w.model),
        details:   format!("Ubicación: {}", w.location),
        owner:     Some("Mantenimiento".to_owned()),
      },
      stored(w.inspection_due.as_deref()),
    );
  }

  for v in registry.vehicles() {
    let details = format!("Interno: {} - KM: {}", v.internal_number, v.current_km);
    visit(
      Pending {
        record_id: v.id(),
        category:  Category::Vehicle,
        label:     Category::Vehicle.label(),
        deadline:  Deadline::TechnicalReview,
        title:     format!("Pickup {}", v.plate),
        details:   details.clone(),
        owner:     Some("Flota".to_owned()),
      },
      stored(v.technical_review_due.as_deref()),
    );
    visit(
      Pending {
        record_id: v.id(),
        category:  Category::Vehicle,
        label:     Category::Vehicle.label(),
        deadline:  Deadline::ProvisionalPermit,
        title:     format!("Pickup {} (provisoria)", v.plate),
        details,
        owner:     Some("Flota".to_owned()),
      },
      stored(v.provisional_permit_due.as_deref()),
    );
  }

  for h in registry.safety_instruments() {
    let owner = (!h.owner.is_empty()).then(|| h.owner.clone());
    visit(
      Pending {
        record_id: h.id(),
        category:  Category::SafetyInstrument,
        label:     h.kind.label(),
        deadline:  Deadline::Calibration,
        title:     format!("{} {}", h.kind.code(), h.instrument_number),
        details:   format!("Marca: {}", h.brand),
        owner:     owner.clone(),
      },
      h.calibration_due(),
    );
    if h.kind == InstrumentKind::BreathingApparatus {
      visit(
        Pending {
          record_id: h.id(),
          category:  Category::SafetyInstrument,
          label:     h.kind.label(),
          deadline:  Deadline::CylinderTest,
          title:     format!("{} {} - PH cilindro", h.kind.code(), h.instrument_number),
          details:   format!(
            "Cilindro: {}",
            h.cylinder_serial.as_deref().unwrap_or("-")
          ),
          owner,
        },
        stored(h.cylinder_test_due.as_deref()),
      );
    }
  }

  for t in registry.pressure_tests() {
    visit(
      Pending {
        record_id: t.id(),
        category:  Category::PressureTest,
        label:     Category::PressureTest.label(),
        deadline:  Deadline::Inspection,
        title:     format!("TPR Checklist {}", t.tag),
        details:   format!("Ubicación: {}", t.location),
        owner:     Some("Calidad".to_owned()),
      },
      t.due_date(rules.pressure_test_validity_months),
    );
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Every populated deadline in the registry as of `today`, ascending by date.
/// Equal dates keep category-then-record order. A deadline that cannot be
/// dated is logged and skipped; the rest are still returned.
pub fn collect_events(
  registry: &CategoryRegistry,
  today: NaiveDate,
  rules: &EventRules,
) -> Vec<DueEvent> {
  let mut events = Vec::new();
  walk(registry, rules, |pending, date| match date {
    Ok(Some(date)) => events.push(pending.into_event(date, today)),
    Ok(None) => {}
    Err(error) => tracing::warn!(
      category = %pending.category,
      record_id = pending.record_id,
      deadline = ?pending.deadline,
      %error,
      "skipping deadline that cannot be dated"
    ),
  });

  // Stable: equal dates keep encounter order.
  events.sort_by_key(|e| e.date);
  tracing::debug!(events = events.len(), %today, "collected due events");
  events
}

// ─── Per-record states ───────────────────────────────────────────────────────

/// The state of one deadline field, for status indicators. Unlike events,
/// missing and malformed dates are kept and read as N/A.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineStatus {
  pub record_id: String,
  pub category:  Category,
  pub deadline:  Deadline,
  pub title:     String,
  pub due:       Option<NaiveDate>,
  pub state:     ExpirationState,
  /// Why the due date could not be determined, when it was present.
  pub problem:   Option<String>,
}

/// One entry per deadline field of every deadline-bearing record, in
/// category-then-record order, unsorted.
pub fn deadline_statuses(
  registry: &CategoryRegistry,
  today: NaiveDate,
  rules: &EventRules,
) -> Vec<DeadlineStatus> {
  let mut statuses = Vec::new();
  walk(registry, rules, |pending, date| {
    let (due, problem) = match date {
      Ok(due) => (due, None),
      Err(error) => (None, Some(error.to_string())),
    };
    statuses.push(DeadlineStatus {
      record_id: pending.record_id.to_owned(),
      category: pending.category,
      deadline: pending.deadline,
      title: pending.title,
      due,
      state: classify(due, today),
      problem,
    });
  });
  statuses
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Order-preserving filter over collected events. Empty fields match all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFilter {
  /// Case-insensitive substring of the title or the category label.
  pub text:  Option<String>,
  pub state: Option<ExpirationState>,
  /// Inclusive lower bound on the date.
  pub from:  Option<NaiveDate>,
  /// Inclusive upper bound on the date.
  pub until: Option<NaiveDate>,
}

impl EventFilter {
  /// Events falling in one calendar month.
  pub fn month(year: i32, month: u32) -> Option<Self> {
    let from = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
      NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
      NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(Self {
      from: Some(from),
      until: next.pred_opt(),
      ..Self::default()
    })
  }

  pub fn matches(&self, event: &DueEvent) -> bool {
    if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
      let needle = text.to_lowercase();
      if !event.title.to_lowercase().contains(&needle)
        && !event.label.to_lowercase().contains(&needle)
      {
        return false;
      }
    }
    if self.state.is_some_and(|state| state != event.state) {
      return false;
    }
    if self.from.is_some_and(|from| event.date < from) {
      return false;
    }
    if self.until.is_some_and(|until| event.date > until) {
      return false;
    }
    true
  }

  pub fn apply<'a>(
    &'a self,
    events: &'a [DueEvent],
  ) -> impl Iterator<Item = &'a DueEvent> + 'a {
    events.iter().filter(move |e| self.matches(e))
  }
}

/// Tally over a set of events. Events are always dated, so `not_applicable`
/// stays zero; use [`dashboard_summary`] for the full picture.
pub fn summarize<'a>(events: impl IntoIterator<Item = &'a DueEvent>) -> StatusSummary {
  StatusSummary::tally(events.into_iter().map(|e| e.state))
}

/// Dashboard tally over every deadline field, undated ones counted as N/A.
pub fn dashboard_summary(
  registry: &CategoryRegistry,
  today: NaiveDate,
  rules: &EventRules,
) -> StatusSummary {
  StatusSummary::tally(
    deadline_statuses(registry, today, rules)
      .into_iter()
      .map(|s| s.state),
  )
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::record::{
    HoseChecklist, InstrumentKind, Meta, PressureTest, SafetyInstrument, Vehicle,
    Worklift,
  };

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() }

  fn meta(id: &str) -> Meta { Meta::with_id(id, Utc.timestamp_opt(0, 0).unwrap()) }

  fn worklift(id: &str, due: Option<&str>) -> Worklift {
    Worklift {
      meta: meta(id),
      internal_number: format!("INT-{id}"),
      model: "GS-1930".into(),
      location: "Mase-01".into(),
      inspection_due: due.map(Into::into),
      ..Default::default()
    }
  }

  fn vehicle(id: &str, review: Option<&str>, permit: Option<&str>) -> Vehicle {
    Vehicle {
      meta: meta(id),
      plate: format!("AA{id}"),
      technical_review_due: review.map(Into::into),
      provisional_permit_due: permit.map(Into::into),
      ..Default::default()
    }
  }

  fn era(id: &str, last: &str, frequency_days: i64, cylinder: Option<&str>) -> SafetyInstrument {
    SafetyInstrument {
      meta: meta(id),
      kind: InstrumentKind::BreathingApparatus,
      instrument_number: "ERA-01".into(),
      brand: "Drager".into(),
      last_calibration: Some(last.into()),
      frequency_days,
      cylinder_test_due: cylinder.map(Into::into),
      owner: "Seguridad".into(),
      ..Default::default()
    }
  }

  fn hose(id: &str, inspected: &str) -> PressureTest {
    PressureTest {
      meta: meta(id),
      tag: "TPR-001".into(),
      location: "Mase-02".into(),
      inspection_date: Some(inspected.into()),
      checklist: HoseChecklist {
        has_label: true,
        ..Default::default()
      },
      fit_for_service: true,
      ..Default::default()
    }
  }

  fn registry() -> CategoryRegistry {
    let mut r = CategoryRegistry::new();
    r.worklifts_mut().insert(worklift("wl-1", Some("2024-03-20"))).unwrap();
    r.worklifts_mut().insert(worklift("wl-2", None)).unwrap();
    r.vehicles_mut()
      .insert(vehicle("pk-1", Some("2024-02-01"), Some("2024-03-05")))
      .unwrap();
    r.vehicles_mut().insert(vehicle("pk-2", Some("2024-03-20"), None)).unwrap();
    r.safety_instruments_mut()
      .insert(era("hse-2", "2023-09-01", 365, Some("2025-01-01")))
      .unwrap();
    r.pressure_tests_mut().insert(hose("tpr-1", "2023-11-20")).unwrap();
    r
  }

  // ─── Completeness ──────────────────────────────────────────────────────

  #[test]
  fn one_event_per_populated_deadline() {
    let events = collect_events(&registry(), today(), &EventRules::default());
    // wl-1, pk-1 x2, pk-2, hse-2 x2, tpr-1.
    assert_eq!(events.len(), 7);
    assert!(events.iter().all(|e| e.record_id != "wl-2"));
  }

  #[test]
  fn two_deadlines_are_classified_independently() {
    let events = collect_events(&registry(), today(), &EventRules::default());
    let era: Vec<_> = events.iter().filter(|e| e.record_id == "hse-2").collect();
    assert_eq!(era.len(), 2);
    let calibration = era.iter().find(|e| e.deadline == Deadline::Calibration).unwrap();
    let cylinder = era.iter().find(|e| e.deadline == Deadline::CylinderTest).unwrap();
    // 2023-09-01 + 365 days = 2024-08-31.
    assert_eq!(calibration.date, NaiveDate::from_ymd_opt(2024, 8, 31).unwrap());
    assert_eq!(calibration.state, ExpirationState::Current);
    assert_eq!(cylinder.state, ExpirationState::Current);
    assert_eq!(calibration.label, "Equipos ERA");
    assert_eq!(calibration.owner.as_deref(), Some("Seguridad"));

    let pickup: Vec<_> = events.iter().filter(|e| e.record_id == "pk-1").collect();
    assert_eq!(pickup[0].state, ExpirationState::Overdue);
    assert_eq!(pickup[1].state, ExpirationState::Critical);
  }

  #[test]
  fn pressure_tests_use_configured_validity() {
    let default = collect_events(&registry(), today(), &EventRules::default());
    let hose = default.iter().find(|e| e.category == Category::PressureTest).unwrap();
    assert_eq!(hose.date, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
    assert_eq!(hose.state, ExpirationState::Current);

    let strict = EventRules {
      pressure_test_validity_months: 3,
    };
    let events = collect_events(&registry(), today(), &strict);
    let hose = events.iter().find(|e| e.category == Category::PressureTest).unwrap();
    assert_eq!(hose.date, NaiveDate::from_ymd_opt(2024, 2, 20).unwrap());
    assert_eq!(hose.state, ExpirationState::Overdue);
  }

  #[test]
  fn undatable_deadlines_are_skipped_not_fatal() {
    let mut r = registry();
    r.worklifts_mut()
      .insert(worklift("wl-bad", Some("soon")))
      .unwrap();
    r.safety_instruments_mut()
      .insert(era("hse-bad", "2024-01-01", -30, None))
      .unwrap();
    let events = collect_events(&r, today(), &EventRules::default());
    assert!(events.iter().all(|e| e.record_id != "wl-bad"));
    // The bad calibration is dropped; the record emits no cylinder date either.
    assert!(events.iter().all(|e| e.record_id != "hse-bad"));
    assert_eq!(events.len(), 7);
  }

  // ─── Ordering ──────────────────────────────────────────────────────────

  #[test]
  fn sorted_ascending_with_stable_ties() {
    let events = collect_events(&registry(), today(), &EventRules::default());
    assert!(events.windows(2).all(|w| w[0].date <= w[1].date));

    // wl-1 and pk-2 share 2024-03-20; worklifts come before vehicles.
    let ties: Vec<_> = events
      .iter()
      .filter(|e| e.date == NaiveDate::from_ymd_opt(2024, 3, 20).unwrap())
      .map(|e| e.record_id.as_str())
      .collect();
    assert_eq!(ties, ["wl-1", "pk-2"]);
  }

  #[test]
  fn ties_within_a_category_keep_record_order() {
    let mut r = CategoryRegistry::new();
    for id in ["wl-c", "wl-a", "wl-b"] {
      r.worklifts_mut().insert(worklift(id, Some("2024-04-01"))).unwrap();
    }
    let events = collect_events(&r, today(), &EventRules::default());
    let ids: Vec<_> = events.iter().map(|e| e.record_id.as_str()).collect();
    assert_eq!(ids, ["wl-c", "wl-a", "wl-b"]);
  }

  #[test]
  fn repeated_collection_is_identical() {
    let r = registry();
    let a = collect_events(&r, today(), &EventRules::default());
    let b = collect_events(&r, today(), &EventRules::default());
    assert_eq!(a, b);
  }

  // ─── Per-record states ─────────────────────────────────────────────────

  #[test]
  fn statuses_include_missing_and_malformed_dates() {
    let mut r = registry();
    r.worklifts_mut()
      .insert(worklift("wl-bad", Some("soon")))
      .unwrap();
    let statuses = deadline_statuses(&r, today(), &EventRules::default());
    // 7 dated deadlines, wl-2 without a date, wl-bad, pk-2 without a permit.
    assert_eq!(statuses.len(), 10);

    let missing = statuses.iter().find(|s| s.record_id == "wl-2").unwrap();
    assert_eq!(missing.state, ExpirationState::NotApplicable);
    assert!(missing.problem.is_none());

    let bad = statuses.iter().find(|s| s.record_id == "wl-bad").unwrap();
    assert_eq!(bad.state, ExpirationState::NotApplicable);
    assert!(bad.problem.as_deref().unwrap().contains("soon"));

    // Encounter order, not date order.
    assert_eq!(statuses[0].record_id, "wl-1");
    assert_eq!(statuses[1].record_id, "wl-2");
  }

  // ─── Filtering ─────────────────────────────────────────────────────────

  #[test]
  fn text_filter_matches_title_or_label() {
    let events = collect_events(&registry(), today(), &EventRules::default());
    let by_title = EventFilter {
      text: Some("aapk-1".into()),
      ..Default::default()
    };
    assert_eq!(by_title.apply(&events).count(), 2);

    let by_label = EventFilter {
      text: Some("flota".into()),
      ..Default::default()
    };
    assert_eq!(by_label.apply(&events).count(), 3);
  }

  #[test]
  fn state_filter_is_exact_and_order_preserving() {
    let events = collect_events(&registry(), today(), &EventRules::default());
    let filter = EventFilter {
      state: Some(ExpirationState::DueSoon),
      ..Default::default()
    };
    let ids: Vec<_> = filter.apply(&events).map(|e| e.record_id.as_str()).collect();
    assert_eq!(ids, ["wl-1", "pk-2"]);
  }

  #[test]
  fn month_window_is_inclusive() {
    let events = collect_events(&registry(), today(), &EventRules::default());
    let march = EventFilter::month(2024, 3).unwrap();
    assert_eq!(march.until, NaiveDate::from_ymd_opt(2024, 3, 31));
    let ids: Vec<_> = march.apply(&events).map(|e| e.record_id.as_str()).collect();
    assert_eq!(ids, ["pk-1", "wl-1", "pk-2"]);

    let december = EventFilter::month(2024, 12).unwrap();
    assert_eq!(december.until, NaiveDate::from_ymd_opt(2024, 12, 31));
    assert!(EventFilter::month(2024, 13).is_none());
  }

  #[test]
  fn empty_filter_keeps_everything() {
    let events = collect_events(&registry(), today(), &EventRules::default());
    assert_eq!(EventFilter::default().apply(&events).count(), events.len());
  }

  #[test]
  fn summary_over_events() {
    let events = collect_events(&registry(), today(), &EventRules::default());
    let summary = summarize(&events);
    assert_eq!(summary.overdue, 1);
    assert_eq!(summary.critical, 1);
    assert_eq!(summary.due_soon, 2);
    assert_eq!(summary.current, 3);
    assert_eq!(summary.requires_attention(), 2);
  }

  #[test]
  fn dashboard_counts_undated_fields() {
    let summary = dashboard_summary(&registry(), today(), &EventRules::default());
    // wl-2 has no inspection and pk-2 no provisional permit.
    assert_eq!(summary.not_applicable, 2);
    assert_eq!(summary.overdue, 1);
    assert_eq!(summary.current, 3);
    assert_eq!(summary.total(), 9);

    let events = collect_events(&registry(), today(), &EventRules::default());
    assert_eq!(summarize(&events).not_applicable, 0);
  }
}
