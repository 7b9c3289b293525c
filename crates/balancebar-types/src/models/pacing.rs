//! Pacing thresholds, statuses and per-period reports

use super::balance::Money;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pacing classification of one period.
///
/// The labels are kept literally as the menu-bar UI shows them: `Behind`
/// means mildly over pace, `Ahead` means spending significantly faster than
/// expected (alarm color).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingStatus {
    /// Delta at or below the warning threshold (including any under-pace)
    OnTrack,
    /// Delta above the warning threshold, at or below the over threshold
    Behind,
    /// Delta above the over threshold
    Ahead,
    /// Delta unknown (UI only)
    #[default]
    Neutral,
}

impl PacingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::Behind => "behind",
            Self::Ahead => "ahead",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for PacingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warning and over-pace thresholds, in delta percent.
///
/// Both values live in `[0, 100]` and `over >= warn + 1` holds after every
/// construction and mutation, deserialization included. The only way out of
/// `[0, 100]` is `warn = 100`, which forces `over = 101`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPaceThresholds")]
pub struct PaceThresholds {
    #[serde(rename = "pace_warn_threshold")]
    warn: f64,
    #[serde(rename = "pace_over_threshold")]
    over: f64,
}

impl PaceThresholds {
    pub const DEFAULT_WARN: f64 = 15.0;
    pub const DEFAULT_OVER: f64 = 25.0;

    /// Clamp both values to `[0, 100]` and coerce `over` up to `warn + 1`.
    /// Non-finite input falls back to the defaults.
    pub fn new(warn: f64, over: f64) -> Self {
        let warn = sanitize(warn, Self::DEFAULT_WARN);
        let over = sanitize(over, Self::DEFAULT_OVER).max(warn + 1.0);
        Self { warn, over }
    }

    pub fn warn(&self) -> f64 {
        self.warn
    }

    pub fn over(&self) -> f64 {
        self.over
    }

    /// Raising `warn` past `over` drags `over` along.
    pub fn set_warn(&mut self, warn: f64) {
        *self = Self::new(warn, self.over);
    }

    /// Lowering `over` below `warn + 1` is coerced back to `warn + 1`.
    pub fn set_over(&mut self, over: f64) {
        *self = Self::new(self.warn, over);
    }
}

impl Default for PaceThresholds {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WARN, Self::DEFAULT_OVER)
    }
}

fn sanitize(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        fallback
    }
}

/// Unvalidated wire form, normalized through `PaceThresholds::new`
#[derive(Deserialize)]
struct RawPaceThresholds {
    #[serde(rename = "pace_warn_threshold", alias = "warn", default = "default_warn")]
    warn: f64,
    #[serde(rename = "pace_over_threshold", alias = "over", default = "default_over")]
    over: f64,
}

fn default_warn() -> f64 {
    PaceThresholds::DEFAULT_WARN
}

fn default_over() -> f64 {
    PaceThresholds::DEFAULT_OVER
}

impl From<RawPaceThresholds> for PaceThresholds {
    fn from(raw: RawPaceThresholds) -> Self {
        Self::new(raw.warn, raw.over)
    }
}

/// Pacing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Month, Period::Week, Period::Day];

    pub fn label(self) -> &'static str {
        match self {
            Self::Day => "Today",
            Self::Week => "This week",
            Self::Month => "This month",
        }
    }
}

/// Pace of one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodPace {
    /// Usage expected by now if spending were uniform
    pub target: Option<Money>,
    /// Signed deviation of usage from target, positive = overspending
    pub delta_percent: Option<f64>,
    pub status: PacingStatus,
    /// Actual usage compared against the target
    pub usage: Option<Money>,
    /// Full budget of the period (month = limit, week = 7 daily budgets)
    pub budget: Option<Money>,
}

/// Pacing report for day, week and month
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PacingReport {
    /// `limit / days_in_month`, None without a usable limit
    pub daily_budget: Option<Money>,
    pub month: PeriodPace,
    pub week: PeriodPace,
    pub day: PeriodPace,
}

impl PacingReport {
    /// Report with every period unknown
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Badge status: the month period drives the overall color
    pub fn overall_status(&self) -> PacingStatus {
        self.month.status
    }

    pub fn period(&self, period: Period) -> &PeriodPace {
        match period {
            Period::Day => &self.day,
            Period::Week => &self.week,
            Period::Month => &self.month,
        }
    }

    /// Periods in display order (month, week, day)
    pub fn periods(&self) -> impl Iterator<Item = (Period, &PeriodPace)> {
        Period::ALL.into_iter().map(move |p| (p, self.period(p)))
    }
}
