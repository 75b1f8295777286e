//! Domain models for CLINIQ.
//!
//! These are the core types shared across all crates. Models are data;
//! behavior lives in the service crates.

pub mod clinic;
pub mod otp;
pub mod post;
pub mod principal;
pub mod role;
pub mod staff;
