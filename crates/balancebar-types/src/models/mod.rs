//! Data models for balancebar

pub mod balance;
pub mod credential;
pub mod pacing;

pub use balance::{Balance, Money};
pub use credential::CredentialRecord;
pub use pacing::{PaceThresholds, PacingReport, PacingStatus, Period, PeriodPace};
