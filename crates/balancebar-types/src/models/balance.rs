use serde::{Deserialize, Serialize};

/// Currency amount in the provider's unit (USD, 2 decimal places)
pub type Money = f64;

/// Point-in-time usage snapshot for one API key.
///
/// Every figure is optional: the provider omits what it cannot compute
/// (keys without a spending limit have no `limit`, older payloads have no
/// weekly or daily breakdown). A balance is never cached beyond the display
/// generation it was fetched for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    /// Spending limit of the key
    pub limit: Option<Money>,

    /// Usage in the current month (older payloads call this `usage`)
    #[serde(alias = "usage")]
    pub usage_monthly: Option<Money>,

    /// Usage in the current week
    pub usage_weekly: Option<Money>,

    /// Usage today
    pub usage_daily: Option<Money>,

    /// Remaining budget for the month (older payloads call this `remaining`)
    #[serde(alias = "remaining")]
    pub remaining_monthly: Option<Money>,

    /// Provider-supplied pace ratio, passed through untouched
    pub pace_ratio: Option<f64>,

    /// Authoritative month target from the provider, if any
    pub pace_month_target: Option<Money>,
    pub pace_week_target: Option<Money>,
    pub pace_day_target: Option<Money>,

    /// Authoritative deltas from the provider, if any
    pub pace_month_delta_percent: Option<f64>,
    pub pace_week_delta_percent: Option<f64>,
    pub pace_day_delta_percent: Option<f64>,

    /// Key label as reported by the provider
    pub label: Option<String>,
}

impl Balance {
    /// Build a balance from the two figures every provider reports.
    ///
    /// `remaining_monthly` is derived as `limit - usage` when both are known.
    pub fn from_limit_and_usage(
        limit: Option<Money>,
        usage: Option<Money>,
        label: Option<String>,
    ) -> Self {
        let remaining_monthly = match (limit, usage) {
            (Some(limit), Some(usage)) => Some(limit - usage),
            _ => None,
        };

        Self {
            limit,
            usage_monthly: usage,
            remaining_monthly,
            label,
            ..Default::default()
        }
    }

    /// A sample is displayable only with a limit and at least one of
    /// remaining/usage for the month.
    pub fn is_valid_sample(&self) -> bool {
        self.limit.is_some() && (self.remaining_monthly.is_some() || self.usage_monthly.is_some())
    }

    /// Remaining monthly budget, derived from limit and usage when the
    /// provider did not send it. May be negative.
    pub fn monthly_remaining(&self) -> Option<Money> {
        self.remaining_monthly.or(match (self.limit, self.usage_monthly) {
            (Some(limit), Some(usage)) => Some(limit - usage),
            _ => None,
        })
    }

    /// Monthly usage as a percentage of the limit (0 when unknown)
    pub fn used_percent(&self) -> f64 {
        self.ratio_to_limit(self.usage_monthly)
    }

    /// Remaining budget as a percentage of the limit (0 when unknown)
    pub fn remaining_percent(&self) -> f64 {
        self.ratio_to_limit(self.monthly_remaining())
    }

    fn ratio_to_limit(&self, value: Option<Money>) -> f64 {
        match (self.is_valid_sample(), self.limit, value) {
            (true, Some(limit), Some(value)) if limit > 0.0 => value / limit * 100.0,
            _ => 0.0,
        }
    }
}
