//! CLINIQ Core — domain models, tenant-scope types, and repository
//! traits shared by every other crate.
//!
//! This crate is pure data and contracts: no I/O, no crypto, no HTTP.

pub mod error;
pub mod models;
pub mod repository;
pub mod scope;

pub use error::{CliniqError, CliniqResult};
