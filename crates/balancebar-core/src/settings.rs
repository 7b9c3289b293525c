//! Application settings model
//!
//! Mirrors the menu-bar app's `settings.json`. Reading and writing the file
//! belongs to the caller; this module only defines the shape, defaults and
//! normalization. UI toggles pass through untouched.

use crate::credentials::CredentialSet;
use balancebar_types::PaceThresholds;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MIN_REFRESH_INTERVAL_MINUTES: u32 = 1;
pub const MAX_REFRESH_INTERVAL_MINUTES: u32 = 60;
pub const MAX_DECIMAL_PLACES: u8 = 2;

/// Menu-bar app settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Configured API keys and the active selection
    #[serde(flatten)]
    pub credentials: CredentialSet,

    /// Pace warning/over thresholds (`pace_warn_threshold`, `pace_over_threshold`)
    #[serde(flatten)]
    pub pace: PaceThresholds,

    /// Polling interval, 1-60 minutes
    pub refresh_interval_minutes: u32,

    /// true = show %, false = show $
    pub show_percentage: bool,

    /// true = show remaining, false = show used
    pub show_remaining: bool,

    /// Display the % or $ unit in the menu bar
    pub show_unit: bool,

    pub auto_refresh_enabled: bool,

    /// Decimals of the exact percentage, 0-2
    pub decimal_places: u8,

    // Pass-through UI toggles
    pub show_window_on_start: bool,
    pub launch_at_login: bool,
    pub always_on_top: bool,
    pub unfocused_overlay: bool,
    pub menubar_monochrome: bool,
    pub global_shortcut: String,
    pub global_shortcut_enabled: bool,
    pub debug_logging_enabled: bool,
    pub debugging_enabled: bool,

    /// Single-key layout of early releases, migrated by `normalize`
    #[serde(skip_serializing)]
    api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials: CredentialSet::default(),
            pace: PaceThresholds::default(),
            refresh_interval_minutes: 5,
            show_percentage: true,
            show_remaining: true,
            show_unit: true,
            auto_refresh_enabled: true,
            decimal_places: 1,
            show_window_on_start: true,
            launch_at_login: false,
            always_on_top: false,
            unfocused_overlay: false,
            menubar_monochrome: false,
            global_shortcut: "F19".to_string(),
            global_shortcut_enabled: false,
            debug_logging_enabled: false,
            debugging_enabled: false,
            api_key: None,
        }
    }
}

impl Settings {
    /// Parse settings JSON and normalize it
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.normalize();
        Ok(settings)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Clamp ranged fields and migrate a legacy single `api_key` into the
    /// credential set when no keys are configured.
    pub fn normalize(&mut self) {
        self.set_refresh_interval(self.refresh_interval_minutes);
        self.set_decimal_places(self.decimal_places);
        if self.global_shortcut.trim().is_empty() {
            self.global_shortcut = "F19".to_string();
        }

        if let Some(legacy) = self.api_key.take() {
            if self.credentials.is_empty() {
                match self.credentials.add(&legacy, "Key 1") {
                    Ok(_) => debug!("Migrated legacy api_key into credential set"),
                    Err(e) => debug!(error = %e, "Dropped malformed legacy api_key"),
                }
            }
        }
    }

    pub fn set_refresh_interval(&mut self, minutes: u32) {
        self.refresh_interval_minutes =
            minutes.clamp(MIN_REFRESH_INTERVAL_MINUTES, MAX_REFRESH_INTERVAL_MINUTES);
    }

    pub fn set_decimal_places(&mut self, decimals: u8) {
        self.decimal_places = decimals.min(MAX_DECIMAL_PLACES);
    }

    /// Update both thresholds at once; `over <= warn` is coerced to `warn + 1`
    pub fn set_pace_thresholds(&mut self, warn: f64, over: f64) {
        self.pace = PaceThresholds::new(warn, over);
    }
}
