//! Core types and computations for the Vigil compliance tracker.
//!
//! This crate is deliberately free of I/O. It classifies deadlines, derives
//! calibration due dates, and aggregates the category collections into the
//! master list and the due-event timeline. Every operation that depends on the
//! current date takes it as a parameter.

pub mod category;
pub mod error;
pub mod events;
pub mod master;
pub mod patch;
pub mod record;
pub mod registry;
pub mod schedule;
pub mod status;

pub use category::Category;
pub use error::{Error, Result};
pub use status::ExpirationState;
