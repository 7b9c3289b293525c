//! Pace engine
//!
//! Compares actual usage against a time-proportional budget for the month,
//! week and day:
//! 1. daily budget = limit / days in month
//! 2. target = daily budget * elapsed days of the period, unless the provider
//!    supplied an authoritative target
//! 3. delta = (usage - target) / target * 100, unless supplied upstream
//! 4. status from delta and thresholds
//!
//! Upstream values always win over derived ones.

use crate::calendar::CalendarContext;
use balancebar_types::{Balance, Money, PaceThresholds, PacingReport, PacingStatus, PeriodPace};
use chrono::NaiveDateTime;
use tracing::debug;

/// Compute the pacing report of `balance` at local time `now`
pub fn compute_pacing(
    balance: &Balance,
    thresholds: &PaceThresholds,
    now: &NaiveDateTime,
) -> PacingReport {
    compute_pacing_in(balance, thresholds, &CalendarContext::at(now))
}

/// Compute the pacing report against an explicit calendar context
pub fn compute_pacing_in(
    balance: &Balance,
    thresholds: &PaceThresholds,
    calendar: &CalendarContext,
) -> PacingReport {
    let Some(limit) = balance.limit.filter(|limit| *limit > 0.0) else {
        return PacingReport::neutral();
    };

    let daily_budget = if calendar.days_in_month > 0 {
        limit / calendar.days_in_month as f64
    } else {
        0.0
    };

    let month = period_pace(
        PeriodInput {
            upstream_target: balance.pace_month_target,
            derived_target: daily_budget * calendar.elapsed_days,
            upstream_delta: balance.pace_month_delta_percent,
            usage: balance.usage_monthly,
            budget: limit,
        },
        thresholds,
    );
    let week = period_pace(
        PeriodInput {
            upstream_target: balance.pace_week_target,
            derived_target: daily_budget * calendar.week_elapsed_days,
            upstream_delta: balance.pace_week_delta_percent,
            usage: balance.usage_weekly,
            budget: daily_budget * 7.0,
        },
        thresholds,
    );
    let day = period_pace(
        PeriodInput {
            upstream_target: balance.pace_day_target,
            derived_target: daily_budget * calendar.day_fraction,
            upstream_delta: balance.pace_day_delta_percent,
            usage: balance.usage_daily,
            budget: daily_budget,
        },
        thresholds,
    );

    debug!(
        daily_budget,
        month = %month.status,
        week = %week.status,
        day = %day.status,
        "Computed pacing report"
    );

    PacingReport {
        daily_budget: Some(daily_budget),
        month,
        week,
        day,
    }
}

struct PeriodInput {
    upstream_target: Option<Money>,
    derived_target: Money,
    upstream_delta: Option<f64>,
    usage: Option<Money>,
    budget: Money,
}

fn period_pace(input: PeriodInput, thresholds: &PaceThresholds) -> PeriodPace {
    let target = input.upstream_target.unwrap_or(input.derived_target);
    let delta_percent = input
        .upstream_delta
        .or_else(|| input.usage.and_then(|usage| delta_percent(usage, target)));

    PeriodPace {
        target: Some(target),
        delta_percent,
        status: classify_pace(delta_percent, thresholds),
        usage: input.usage,
        budget: Some(input.budget),
    }
}

/// Signed deviation of `usage` from `target` in percent; None when the
/// target is not positive.
pub fn delta_percent(usage: Money, target: Money) -> Option<f64> {
    if target > 0.0 {
        Some((usage - target) / target * 100.0)
    } else {
        None
    }
}

/// Classify a delta against the thresholds.
///
/// Comparisons are strict: a delta exactly at `over` is `Behind`, exactly at
/// `warn` is `OnTrack`.
pub fn classify_pace(delta_percent: Option<f64>, thresholds: &PaceThresholds) -> PacingStatus {
    match delta_percent {
        None => PacingStatus::Neutral,
        Some(delta) if delta > thresholds.over() => PacingStatus::Ahead,
        Some(delta) if delta > thresholds.warn() => PacingStatus::Behind,
        Some(_) => PacingStatus::OnTrack,
    }
}
