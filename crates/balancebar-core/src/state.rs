//! Application state owned by the UI layer
//!
//! One explicit struct replaces scattered mutable globals: settings, the
//! current balance generation and its pacing report. The UI owns the single
//! instance and mutates it serially from its event handlers.

use crate::calendar::Clock;
use crate::client::{verify_key, BalanceSource};
use crate::error::{CoreError, Result};
use crate::format::BalanceView;
use crate::pace::compute_pacing;
use crate::settings::Settings;
use balancebar_types::{Balance, PacingReport};
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub settings: Settings,
    balance: Option<Balance>,
    report: PacingReport,
    last_error: Option<String>,
    refreshing: bool,
    generation: u64,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Balance of the current display generation
    pub fn balance(&self) -> Option<&Balance> {
        self.balance.as_ref()
    }

    pub fn report(&self) -> &PacingReport {
        &self.report
    }

    /// Message of the most recent failed refresh, cleared on success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of successful refreshes applied
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn active_key(&self) -> Option<&str> {
        self.settings
            .credentials
            .active()
            .map(|record| record.key.as_str())
    }

    /// Mark a refresh as started. Returns false while one is outstanding,
    /// in which case the caller drops the new trigger.
    pub fn begin_refresh(&mut self) -> bool {
        if self.refreshing {
            debug!("Refresh already in flight, coalescing");
            return false;
        }
        self.refreshing = true;
        true
    }

    /// Apply the outcome of a fetch started with `begin_refresh`.
    ///
    /// On failure the previous balance and report stay on display; only the
    /// error message is recorded.
    pub fn finish_refresh(&mut self, outcome: Result<Balance>, now: &NaiveDateTime) {
        self.refreshing = false;
        match outcome {
            Ok(balance) => self.apply_balance(balance, now),
            Err(e) => {
                warn!(error = %e, "Balance refresh failed");
                self.last_error = Some(e.to_string());
            }
        }
    }

    /// Replace the displayed balance and recompute pacing
    pub fn apply_balance(&mut self, balance: Balance, now: &NaiveDateTime) {
        self.report = compute_pacing(&balance, &self.settings.pace, now);
        self.balance = Some(balance);
        self.last_error = None;
        self.generation += 1;
        debug!(
            generation = self.generation,
            status = %self.report.overall_status(),
            "Balance applied"
        );
    }

    /// Recompute pacing for the current balance, e.g. after a threshold
    /// change or on a timer tick without a new fetch.
    pub fn recompute(&mut self, now: &NaiveDateTime) {
        self.report = match &self.balance {
            Some(balance) => compute_pacing(balance, &self.settings.pace, now),
            None => PacingReport::neutral(),
        };
    }

    pub fn set_pace_thresholds(&mut self, warn: f64, over: f64, now: &NaiveDateTime) {
        self.settings.set_pace_thresholds(warn, over);
        self.recompute(now);
    }

    /// Fetch the active key's balance through `source` and apply it.
    ///
    /// Returns Ok(false) when coalesced into a refresh already in flight.
    /// Dropping the future before it completes (a UI timeout) clears the
    /// in-flight flag and leaves the display untouched.
    pub async fn refresh<S, C>(&mut self, source: &S, clock: &C) -> Result<bool>
    where
        S: BalanceSource,
        C: Clock,
    {
        let Some(key) = self.active_key().map(str::to_string) else {
            warn!("No active API key found");
            return Err(CoreError::NoActiveCredential);
        };

        if !self.begin_refresh() {
            return Ok(false);
        }

        if let Some(active) = self.settings.credentials.active() {
            info!(label = %active.label, "Fetching balance");
        }
        let guard = InFlight { state: self };
        let outcome = source.fetch_balance(&key).await;
        let result = outcome.as_ref().map(|_| true).map_err(|e| e.clone());
        guard.state.finish_refresh(outcome, &clock.now());
        result
    }

    /// Verify a new key against the provider, then add it and make it active.
    ///
    /// A blank `label` falls back to the provider's label, then "Key N".
    /// Nothing changes when validation or the liveness check fails.
    pub async fn add_credential<S, C>(
        &mut self,
        source: &S,
        clock: &C,
        key: &str,
        label: &str,
    ) -> Result<usize>
    where
        S: BalanceSource,
        C: Clock,
    {
        let balance = verify_key(source, key).await?;

        let label = match label.trim() {
            "" => balance.label.clone().unwrap_or_default(),
            label => label.to_string(),
        };
        let index = self.settings.credentials.add(key, &label)?;
        self.apply_balance(balance, &clock.now());
        Ok(index)
    }

    pub fn select_next(&mut self) {
        let before = self.settings.credentials.active_index();
        self.settings.credentials.next();
        self.on_selection_changed(before);
    }

    pub fn select_previous(&mut self) {
        let before = self.settings.credentials.active_index();
        self.settings.credentials.previous();
        self.on_selection_changed(before);
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        let before = self.settings.credentials.active_index();
        self.settings.credentials.set_active(index)?;
        self.on_selection_changed(before);
        Ok(())
    }

    pub fn remove_credential(&mut self, index: usize) -> Result<()> {
        let before = self.settings.credentials.active().cloned();
        self.settings.credentials.remove(index)?;
        if self.settings.credentials.active() != before.as_ref() {
            self.clear_balance();
        }
        Ok(())
    }

    /// Display snapshot of the current generation
    pub fn view(&self) -> BalanceView {
        BalanceView::build(self.balance.as_ref(), &self.report, &self.settings)
    }

    // A different key is active: the old balance must not be redisplayed.
    fn on_selection_changed(&mut self, before: usize) {
        if self.settings.credentials.active_index() != before {
            self.clear_balance();
        }
    }

    fn clear_balance(&mut self) {
        self.balance = None;
        self.report = PacingReport::neutral();
        self.last_error = None;
    }
}

/// Clears `refreshing` when a refresh future is dropped mid-fetch
struct InFlight<'a> {
    state: &'a mut AppState,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.state.refreshing {
            debug!("Refresh abandoned before completion");
            self.state.refreshing = false;
        }
    }
}
