#![forbid(unsafe_code)]

//! Core domain model and business logic for the neonatal infusion guardrail
//! calculator.
//!
//! This crate provides:
//! - Domain types (drug profiles, weight bands, dose units, reports)
//! - The guardrail catalog
//! - Unit normalization, dose range checks and infusion math
//! - The calculation engine tying them together
//! - Configuration, logging and CSV batch runs

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod units;
pub mod validator;
pub mod dose;
pub mod infusion;
pub mod engine;
pub mod batch;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use engine::calculate;
pub use batch::run_batch;
