//! Display formatting
//!
//! Turns balances and pacing reports into display-ready strings and ratios.
//! Every `Option` is resolved here: unknown values render as `"-"`, never as
//! a silent zero.

use crate::settings::Settings;
use balancebar_types::{Balance, Money, PacingReport, PacingStatus, Period, PeriodPace};
use serde::Serialize;

/// Placeholder for unknown values
pub const EMPTY: &str = "-";

pub const CURRENCY_SYMBOL: &str = "$";

/// Remaining balance below this renders as low
pub const LOW_BALANCE_THRESHOLD: Money = 5.0;

/// `"$12.30"`, `"$-3.50"` for negative amounts, `"-"` when unknown
pub fn format_currency(value: Option<Money>) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return EMPTY.to_string();
    };

    format!("{}{:.2}", CURRENCY_SYMBOL, round_to(value, 2))
}

/// `"42.5%"` with `decimals` clamped to [0, 2], `"-"` when unknown
pub fn format_percent(value: Option<f64>, decimals: i32) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return EMPTY.to_string();
    };

    let decimals = decimals.clamp(0, 2) as usize;
    format!("{:.*}%", decimals, round_to(value, decimals))
}

/// Signed whole-percent delta: `"+16%"`, `"-20%"`, `"0%"`, `"-"` when unknown
pub fn format_delta_percent(delta: Option<f64>) -> String {
    let Some(delta) = delta.filter(|d| d.is_finite()) else {
        return EMPTY.to_string();
    };

    // Half-up rounding, so -2.5 becomes -2
    let rounded = (delta + 0.5).floor() as i64;
    if rounded > 0 {
        format!("+{}%", rounded)
    } else {
        format!("{}%", rounded)
    }
}

/// Width of the usage fill in a pace bar, in [0, 1]
pub fn pace_bar_fill_ratio(actual: Option<Money>, budget: Option<Money>) -> f64 {
    match (actual, budget) {
        (Some(actual), Some(budget)) if budget > 0.0 => (actual / budget).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Position of the target notch in a pace bar, None hides the notch
pub fn pace_bar_notch_ratio(target: Option<Money>, budget: Option<Money>) -> Option<f64> {
    match (target, budget) {
        (Some(target), Some(budget)) if budget > 0.0 => Some((target / budget).clamp(0.0, 1.0)),
        _ => None,
    }
}

/// Color band of the remaining balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainingLevel {
    /// Overspent
    Negative,
    /// Under $5 left
    Low,
    Healthy,
}

pub fn remaining_level(remaining: Option<Money>) -> Option<RemainingLevel> {
    remaining.map(|r| {
        if r < 0.0 {
            RemainingLevel::Negative
        } else if r < LOW_BALANCE_THRESHOLD {
            RemainingLevel::Low
        } else {
            RemainingLevel::Healthy
        }
    })
}

/// Unit drawn next to the menu-bar value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MenubarUnit {
    Percent,
    Dollar,
}

impl MenubarUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Percent => "%",
            Self::Dollar => "$",
        }
    }
}

/// What the tray collaborator draws: a floored whole number and its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MenubarReading {
    /// None when there is no balance data (logo only)
    pub value: Option<i64>,
    pub unit: MenubarUnit,
    pub show_unit: bool,
}

/// Menu-bar value for `balance` under the display settings.
///
/// Percentage mode always shows the remaining share of the limit; dollar
/// mode follows `show_remaining`.
pub fn menubar_reading(balance: Option<&Balance>, settings: &Settings) -> MenubarReading {
    let unit = if settings.show_percentage {
        MenubarUnit::Percent
    } else {
        MenubarUnit::Dollar
    };

    let value = balance.and_then(|balance| {
        let remaining = balance.monthly_remaining()?;
        let raw = if settings.show_percentage {
            match balance.limit {
                Some(limit) if limit > 0.0 => remaining / limit * 100.0,
                _ => 0.0,
            }
        } else if settings.show_remaining {
            remaining
        } else {
            balance.usage_monthly.unwrap_or(0.0)
        };
        Some(raw.floor() as i64)
    });

    MenubarReading {
        value,
        unit,
        show_unit: settings.show_unit,
    }
}

/// One pace bar row (month, week or day)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaceBarView {
    pub period: Period,
    pub usage: String,
    pub delta: String,
    pub status: PacingStatus,
    pub target: String,
    pub fill_ratio: f64,
    pub notch_ratio: Option<f64>,
}

impl PaceBarView {
    fn build(period: Period, pace: &PeriodPace) -> Self {
        Self {
            period,
            usage: format_currency(pace.usage),
            delta: format_delta_percent(pace.delta_percent),
            status: pace.status,
            target: format_currency(pace.target),
            fill_ratio: pace_bar_fill_ratio(pace.usage, pace.budget),
            notch_ratio: pace_bar_notch_ratio(pace.target, pace.budget),
        }
    }
}

/// Display snapshot of one refresh generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceView {
    pub has_data: bool,
    pub active_label: String,
    pub limit: String,
    pub used: String,
    pub remaining: String,
    pub remaining_level: Option<RemainingLevel>,
    /// Exact percentage honoring `show_remaining` and `decimal_places`
    pub percent: String,
    /// "remaining" or "used"
    pub percent_caption: &'static str,
    pub status: PacingStatus,
    pub pace_bars: Vec<PaceBarView>,
    pub menubar: MenubarReading,
}

impl BalanceView {
    pub fn build(balance: Option<&Balance>, report: &PacingReport, settings: &Settings) -> Self {
        let sample = balance.filter(|b| b.is_valid_sample());
        let has_data = sample.is_some();

        let remaining = sample.and_then(Balance::monthly_remaining);
        let percent = sample.map(|b| {
            if settings.show_remaining {
                b.remaining_percent()
            } else {
                b.used_percent()
            }
        });

        let active_label = settings
            .credentials
            .active()
            .map(|record| record.label.clone())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| EMPTY.to_string());

        Self {
            has_data,
            active_label,
            limit: format_currency(sample.and_then(|b| b.limit)),
            used: format_currency(sample.and_then(|b| b.usage_monthly)),
            remaining: format_currency(remaining),
            remaining_level: remaining_level(remaining),
            percent: format_percent(percent, settings.decimal_places as i32),
            percent_caption: if settings.show_remaining {
                "remaining"
            } else {
                "used"
            },
            status: report.overall_status(),
            pace_bars: report
                .periods()
                .map(|(period, pace)| PaceBarView::build(period, pace))
                .collect(),
            menubar: menubar_reading(balance, settings),
        }
    }
}

fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // Avoid rendering "-0.00"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
