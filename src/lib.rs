//! tablecast: offline reservation-likelihood estimation for restaurants.
//!
//! Given a population of restaurant records and a booking scenario (day, time
//! window, party size), the engine produces a deterministic likelihood judgment
//! per record: a tier label, a bounded score, a short reason, and an optional
//! suggestion. No booking platform is queried at request time; everything is
//! derived from static metadata plus the caller's scenario.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod scenario;
pub mod state;
