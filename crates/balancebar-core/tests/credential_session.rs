//! Integration tests for credential management across a settings round trip
//!
//! Simulates what the settings window does: load, mutate, save after every
//! change, reload.

use balancebar_core::{CoreError, Settings};

const WORK: &str = "sk-or-v1-work0000000000001";
const HOME: &str = "sk-or-v1-home0000000000002";
const LAB: &str = "sk-or-v1-lab00000000000003";

fn persist(settings: &Settings) -> Settings {
    Settings::from_json(&settings.to_json_pretty().unwrap()).unwrap()
}

#[test]
fn test_edit_session_survives_reload() {
    let mut settings = Settings::default();

    settings.credentials.add(WORK, "Work").unwrap();
    settings.credentials.add(HOME, "Home").unwrap();
    settings.credentials.add(LAB, "").unwrap();
    settings = persist(&settings);
    assert_eq!(settings.credentials.active().unwrap().label, "Key 3");

    // Drag "Key 3" (active) to the top
    settings.credentials.reorder(2, 0).unwrap();
    settings = persist(&settings);
    assert_eq!(settings.credentials.active_index(), 0);
    assert_eq!(settings.credentials.active().unwrap().key, LAB);

    settings.credentials.rename(0, "Lab").unwrap();
    settings.credentials.next();
    settings = persist(&settings);
    assert_eq!(settings.credentials.active().unwrap().label, "Work");

    // Deleting the first row keeps the active index, so the next key in
    // order becomes active
    settings.credentials.remove(0).unwrap();
    settings = persist(&settings);
    assert_eq!(settings.credentials.active_index(), 1);
    assert_eq!(settings.credentials.active().unwrap().label, "Home");

    let labels: Vec<&str> = settings
        .credentials
        .iter()
        .map(|record| record.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Work", "Home"]);
}

#[test]
fn test_last_key_cannot_be_deleted_after_reload() {
    let mut settings = Settings::default();
    settings.credentials.add(WORK, "Work").unwrap();
    let mut settings = persist(&settings);

    let before = settings.clone();
    let err = settings.credentials.remove(0).unwrap_err();

    assert!(matches!(err, CoreError::InvariantViolation { .. }));
    assert_eq!(err.to_string(), "Cannot delete the last API key.");
    assert_eq!(settings, before);
}

#[test]
fn test_importing_known_key_switches_active() {
    let mut settings = Settings::default();
    settings.credentials.add(WORK, "Work").unwrap();
    settings.credentials.add(HOME, "Home").unwrap();

    assert_eq!(settings.credentials.activate_key(WORK), Some(0));
    assert_eq!(settings.credentials.activate_key(LAB), None);
    assert_eq!(settings.credentials.active().unwrap().key, WORK);
}
