//! Plain-text rendering of core outputs.

use std::fmt::Write as _;

use vigil_core::{
  events::{DeadlineStatus, DueEvent},
  master::MasterLineItem,
  status::StatusSummary,
};

pub fn statuses(rows: &[DeadlineStatus]) -> String {
  let mut out = String::new();
  for row in rows {
    let due = row
      .due
      .map(|d| d.to_string())
      .unwrap_or_else(|| "-".to_string());
    let _ = write!(
      out,
      "{:<18} {:<12} {:<10} {:<10} {}",
      row.category.as_ref(),
      row.record_id,
      due,
      row.state,
      row.title,
    );
    if let Some(problem) = &row.problem {
      let _ = write!(out, "  ({problem})");
    }
    out.push('\n');
  }
  out
}

pub fn master(items: &[MasterLineItem]) -> String {
  let mut out = String::new();
  for item in items {
    let _ = writeln!(
      out,
      "{:<40} {:>6}  {}",
      item.name, item.quantity, item.provenance
    );
  }
  out
}

pub fn events(events: &[&DueEvent]) -> String {
  let mut out = String::new();
  for event in events {
    let _ = writeln!(
      out,
      "{}  {:<10} {:<24} {}  [{}]",
      event.date,
      event.state,
      event.label,
      event.title,
      event.owner.as_deref().unwrap_or("-"),
    );
  }
  out
}

pub fn summary(summary: &StatusSummary) -> String {
  format!(
    "Vencidos / Críticos: {}\n\
     Por vencer (30d):    {}\n\
     Vigentes:            {}\n\
     Sin fecha:           {}\n\
     Total:               {}\n",
    summary.requires_attention(),
    summary.due_soon,
    summary.current,
    summary.not_applicable,
    summary.total(),
  )
}
