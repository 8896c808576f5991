//! # MedShare Core
//!
//! Domain types shared by the MedShare services, the error taxonomy, and the
//! provider availability calculator.
//!
//! The calculator in [`availability`] is a pure function: every input,
//! including the reference "now", is passed in explicitly, so it can be
//! called from any number of request tasks without synchronization.

pub mod availability;
pub mod errors;
pub mod models;

pub use availability::{booking_window, compute_available_slots};
pub use errors::{ShareError, ShareResult};
