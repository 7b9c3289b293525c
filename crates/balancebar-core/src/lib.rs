//! balancebar-core - Core library for balancebar
//!
//! Pacing engine, credential set, display formatter and OpenRouter balance
//! client for the menu-bar balance checker.

pub mod calendar;
pub mod client;
pub mod credentials;
pub mod error;
pub mod format;
pub mod pace;
pub mod settings;
pub mod state;

pub use balancebar_types as types;

pub use calendar::{CalendarContext, Clock, FixedClock, SystemClock};
pub use client::{verify_key, BalanceSource, OpenRouterClient};
pub use credentials::{validate_key_format, CredentialSet};
pub use error::{CoreError, KeyFormatIssue, Result};
pub use format::{
    format_currency, format_delta_percent, format_percent, pace_bar_fill_ratio,
    pace_bar_notch_ratio, BalanceView,
};
pub use pace::{classify_pace, compute_pacing};
pub use settings::Settings;
pub use state::AppState;
