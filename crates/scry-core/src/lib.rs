//! Core types, scheduling algorithm, and review workflow for Scry.
//!
//! This crate has no HTTP or database dependencies. Storage
//! backends implement the traits in [`store`]; the [`review`] workflow drives
//! them.

mod algorithm;

pub mod card;
pub mod error;
pub mod outcome;
pub mod params;
pub mod review;
pub mod scheduler;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
