//! CLI helpers: settings loading, time parsing and terminal rendering
//!
//! Everything here is synchronous and side-effect free apart from reading
//! the settings file, so `main.rs` only wires commands together.

use anyhow::{Context, Result};
use balancebar_core::format::{MenubarReading, MenubarUnit, RemainingLevel};
use balancebar_core::types::PacingStatus;
use balancebar_core::{BalanceView, Settings};
use chrono::{NaiveDate, NaiveDateTime};
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cells in a rendered pace bar
pub const PACE_BAR_WIDTH: usize = 20;

// ============================================================================
// Settings
// ============================================================================

/// `~/.config/bpesc-balance/settings.json`, shared with the menu-bar app
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".config")
            .join("bpesc-balance")
            .join("settings.json")
    })
}

/// Load settings from `path` (or the default location).
///
/// A missing file yields defaults; an unreadable or malformed one is an
/// error. The file is never written.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_settings_path() {
            Some(path) => path,
            None => {
                debug!("No home directory, using default settings");
                return Ok(Settings::default());
            }
        },
    };

    if !path.exists() {
        debug!(path = %path.display(), "Settings file not found, using defaults");
        return Ok(Settings::default());
    }

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let settings = Settings::from_json(&json)
        .with_context(|| format!("Invalid settings file {}", path.display()))?;

    debug!(
        path = %path.display(),
        keys = settings.credentials.len(),
        "Settings loaded"
    );
    Ok(settings)
}

/// Make `key` the active credential, adding it in memory when unknown
pub fn apply_api_key(settings: &mut Settings, key: &str) -> Result<()> {
    if settings.credentials.activate_key(key).is_some() {
        return Ok(());
    }
    settings
        .credentials
        .add(key, "")
        .context("Rejected API key from command line")?;
    Ok(())
}

// ============================================================================
// Time
// ============================================================================

/// Parse a local wall-clock time: "YYYY-MM-DD HH:MM[:SS]", the same with a
/// `T` separator, or a bare date meaning midnight.
pub fn parse_at(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(t);
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .context("Invalid time (expected: YYYY-MM-DD [HH:MM[:SS]])")?;
    date.and_hms_opt(0, 0, 0).context("Invalid time")
}

// ============================================================================
// Formatters
// ============================================================================

pub fn status_color(status: PacingStatus) -> Color {
    match status {
        PacingStatus::OnTrack => Color::Green,
        PacingStatus::Behind => Color::Yellow,
        PacingStatus::Ahead => Color::Red,
        PacingStatus::Neutral => Color::DarkGrey,
    }
}

fn remaining_color(level: Option<RemainingLevel>) -> Color {
    match level {
        Some(RemainingLevel::Negative) => Color::Red,
        Some(RemainingLevel::Low) => Color::Yellow,
        Some(RemainingLevel::Healthy) => Color::Green,
        None => Color::DarkGrey,
    }
}

/// Text bar: `#` for usage, `|` at the target notch, `-` for the rest
pub fn render_bar(fill_ratio: f64, notch_ratio: Option<f64>, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let filled = (fill_ratio.clamp(0.0, 1.0) * width as f64).round() as usize;
    let notch = notch_ratio.map(|r| {
        let cell = (r.clamp(0.0, 1.0) * width as f64).round() as usize;
        cell.min(width - 1)
    });

    (0..width)
        .map(|i| {
            if notch == Some(i) {
                '|'
            } else if i < filled {
                '#'
            } else {
                '-'
            }
        })
        .collect()
}

/// What the tray would draw, e.g. "67%" or "$12"
pub fn menubar_text(reading: &MenubarReading) -> String {
    let Some(value) = reading.value else {
        return "-".to_string();
    };
    match (reading.show_unit, reading.unit) {
        (false, _) => value.to_string(),
        (true, MenubarUnit::Percent) => format!("{}{}", value, MenubarUnit::Percent.symbol()),
        (true, MenubarUnit::Dollar) => format!("{}{}", MenubarUnit::Dollar.symbol(), value),
    }
}

fn colored(text: &str, color: Color, no_color: bool) -> Cell {
    if no_color {
        Cell::new(text)
    } else {
        Cell::new(text).fg(color)
    }
}

fn header(titles: &[&str], no_color: bool) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| colored(title, Color::Cyan, no_color))
        .collect()
}

/// Balance summary plus one pace bar row per period (human or JSON)
pub fn format_balance_view(view: &BalanceView, json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(view).unwrap_or_else(|_| "{}".to_string());
    }

    let mut summary = Table::new();
    summary.set_content_arrangement(ContentArrangement::Dynamic);
    summary.set_header(header(&["Key", "Limit", "Used", "Remaining", "Percent", "Pace"], no_color));
    summary.add_row(Row::from(vec![
        Cell::new(&view.active_label),
        Cell::new(&view.limit),
        Cell::new(&view.used),
        colored(&view.remaining, remaining_color(view.remaining_level), no_color),
        Cell::new(format!("{} {}", view.percent, view.percent_caption)),
        colored(view.status.as_str(), status_color(view.status), no_color),
    ]));

    let mut pace = Table::new();
    pace.set_content_arrangement(ContentArrangement::Dynamic);
    pace.set_header(header(&["Period", "Used", "Target", "Delta", "Status", "Bar"], no_color));
    for bar in &view.pace_bars {
        pace.add_row(Row::from(vec![
            Cell::new(bar.period.label()),
            Cell::new(&bar.usage),
            Cell::new(&bar.target),
            Cell::new(&bar.delta),
            colored(bar.status.as_str(), status_color(bar.status), no_color),
            Cell::new(render_bar(bar.fill_ratio, bar.notch_ratio, PACE_BAR_WIDTH)),
        ]));
    }

    let mut out = format!("{}\n{}", summary, pace);
    if !view.has_data {
        out.push_str("\nNo balance data.");
    }
    out.push_str(&format!("\nMenu bar: {}", menubar_text(&view.menubar)));
    out
}

/// Configured keys, masked, with the active one marked (human or JSON)
pub fn format_keys(settings: &Settings, json: bool, no_color: bool) -> String {
    let credentials = &settings.credentials;

    if json {
        let keys: Vec<serde_json::Value> = credentials
            .iter()
            .enumerate()
            .map(|(index, record)| {
                serde_json::json!({
                    "index": index,
                    "label": record.label,
                    "key": record.masked_key(),
                    "active": index == credentials.active_index(),
                })
            })
            .collect();
        return serde_json::to_string_pretty(&keys).unwrap_or_else(|_| "[]".to_string());
    }

    if credentials.is_empty() {
        return "No API keys configured.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["#", "Label", "Key", "Active"], no_color));
    for (index, record) in credentials.iter().enumerate() {
        let active = if index == credentials.active_index() {
            "*"
        } else {
            ""
        };
        table.add_row(Row::from(vec![
            Cell::new(index + 1),
            Cell::new(&record.label),
            Cell::new(record.masked_key()),
            colored(active, Color::Green, no_color),
        ]));
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use balancebar_core::compute_pacing;
    use balancebar_core::types::Balance;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const KEY_A: &str = "sk-or-v1-aaaaaaaaaaaa1111";
    const KEY_B: &str = "sk-or-v1-bbbbbbbbbbbb2222";

    #[test]
    fn test_load_settings_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(Some(&dir.path().join("settings.json"))).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_settings_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "api_keys": [
                    {{"key": "{}", "label": "Work"}},
                    {{"key": "{}", "label": "Home"}}
                ],
                "active_api_key_index": 1,
                "refresh_interval_minutes": 500,
                "pace_warn_threshold": 10
            }}"#,
            KEY_A, KEY_B
        )
        .unwrap();

        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.credentials.len(), 2);
        assert_eq!(settings.credentials.active().unwrap().label, "Home");
        assert_eq!(settings.refresh_interval_minutes, 60);
        assert_eq!(settings.pace.warn(), 10.0);
        assert_eq!(settings.pace.over(), 25.0);
    }

    #[test]
    fn test_load_settings_malformed_file_errors() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = load_settings(Some(file.path())).unwrap_err();
        assert!(err.to_string().starts_with("Invalid settings file"));
    }

    #[test]
    fn test_apply_api_key() {
        let mut settings = Settings::default();
        settings.credentials.add(KEY_A, "Work").unwrap();
        settings.credentials.add(KEY_B, "Home").unwrap();

        apply_api_key(&mut settings, KEY_A).unwrap();
        assert_eq!(settings.credentials.len(), 2);
        assert_eq!(settings.credentials.active_index(), 0);

        apply_api_key(&mut settings, "sk-or-v1-cccccccccccc3333").unwrap();
        assert_eq!(settings.credentials.len(), 3);
        assert_eq!(settings.credentials.active().unwrap().label, "Key 3");

        assert!(apply_api_key(&mut settings, "pk-short").is_err());
        assert_eq!(settings.credentials.len(), 3);
    }

    #[test]
    fn test_parse_at() {
        let expected = NaiveDate::from_ymd_opt(2024, 4, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();

        assert_eq!(parse_at("2024-04-16 09:30:00").unwrap(), expected);
        assert_eq!(parse_at("2024-04-16T09:30:00").unwrap(), expected);
        assert_eq!(parse_at(" 2024-04-16 09:30 ").unwrap(), expected);
        assert_eq!(
            parse_at("2024-04-16").unwrap(),
            expected.date().and_hms_opt(0, 0, 0).unwrap()
        );
        assert!(parse_at("16/04/2024").is_err());
    }

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(0.5, Some(0.25), 8), "##|#----");
        assert_eq!(render_bar(1.0, None, 4), "####");
        assert_eq!(render_bar(0.0, Some(1.0), 4), "---|");
        assert_eq!(render_bar(0.5, None, 0), "");
    }

    #[test]
    fn test_menubar_text() {
        let mut reading = MenubarReading {
            value: Some(67),
            unit: MenubarUnit::Percent,
            show_unit: true,
        };
        assert_eq!(menubar_text(&reading), "67%");

        reading.unit = MenubarUnit::Dollar;
        assert_eq!(menubar_text(&reading), "$67");

        reading.show_unit = false;
        assert_eq!(menubar_text(&reading), "67");

        reading.value = None;
        assert_eq!(menubar_text(&reading), "-");
    }

    #[test]
    fn test_format_balance_view_plain() {
        let mut settings = Settings::default();
        settings.credentials.add(KEY_A, "Work").unwrap();
        let balance = Balance::from_limit_and_usage(Some(100.0), Some(40.0), None);
        let now = parse_at("2024-04-16 00:00:00").unwrap();
        let report = compute_pacing(&balance, &settings.pace, &now);
        let view = BalanceView::build(Some(&balance), &report, &settings);

        let out = format_balance_view(&view, false, true);
        assert!(out.contains("Work"));
        assert!(out.contains("$100.00"));
        assert!(out.contains("$60.00"));
        assert!(out.contains("-20%"));
        assert!(out.contains("on_track"));
        assert!(!out.contains("No balance data."));

        let json: serde_json::Value =
            serde_json::from_str(&format_balance_view(&view, true, true)).unwrap();
        assert_eq!(json["remaining"], "$60.00");
        assert_eq!(json["status"], "on_track");
    }

    #[test]
    fn test_format_keys_masks_secrets() {
        let mut settings = Settings::default();
        assert_eq!(format_keys(&settings, false, true), "No API keys configured.");

        settings.credentials.add(KEY_A, "Work").unwrap();
        settings.credentials.add(KEY_B, "Home").unwrap();

        let out = format_keys(&settings, false, true);
        assert!(out.contains("Work"));
        assert!(out.contains("••••2222"));
        assert!(!out.contains(KEY_A));

        let json: serde_json::Value =
            serde_json::from_str(&format_keys(&settings, true, true)).unwrap();
        assert_eq!(json[1]["active"], true);
        assert_eq!(json[0]["key"], "••••1111");
    }
}
