//! balancebar-types - Shared data types for balancebar
//!
//! This crate contains pure data structures without heavy dependencies.
//! No tokio, no HTTP client - just serde-serializable types.
//!
//! Used by:
//! - balancebar-core (pacing engine, credential set, formatter)
//! - balancebar (command-line front end)

pub mod models;

pub use models::{
    Balance, CredentialRecord, Money, PaceThresholds, PacingReport, PacingStatus, Period,
    PeriodPace,
};
