//! Core types and pure domain logic for the cohort tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! fine calculator and the calendar classifier are plain functions over
//! in-memory submission histories; storage backends implement
//! [`store::CohortStore`].

pub mod calendar;
pub mod community;
pub mod error;
pub mod fine;
pub mod participant;
pub mod session;
pub mod store;
pub mod submission;

pub use error::{Error, Result};
