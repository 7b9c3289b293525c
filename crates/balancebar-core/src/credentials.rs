//! Credential set: ordered API keys plus the active selection
//!
//! Invariants, re-established after every mutation:
//! - `active_index < records.len()` whenever the set is non-empty
//! - `remove` never empties the set (last record is protected)
//! - a failed operation leaves the set untouched

use crate::error::{CoreError, KeyFormatIssue, Result};
use balancebar_types::CredentialRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prefix every OpenRouter key carries
pub const KEY_PREFIX: &str = "sk-";

/// Shortest key accepted by format validation
pub const MIN_KEY_LEN: usize = 20;

/// Check the key format. Liveness is checked by fetching a balance.
pub fn validate_key_format(key: &str) -> Result<()> {
    let key = key.trim();

    let issue = if key.is_empty() {
        Some(KeyFormatIssue::Empty)
    } else if !key.starts_with(KEY_PREFIX) {
        Some(KeyFormatIssue::MissingPrefix)
    } else if key.chars().count() < MIN_KEY_LEN {
        Some(KeyFormatIssue::TooShort)
    } else {
        None
    };

    match issue {
        Some(reason) => Err(CoreError::Validation { reason }),
        None => Ok(()),
    }
}

/// Ordered API keys with an active selection.
///
/// Serialized with the settings-file field names `api_keys` and
/// `active_api_key_index`. Duplicate keys are allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawCredentialSet")]
pub struct CredentialSet {
    #[serde(rename = "api_keys")]
    records: Vec<CredentialRecord>,
    #[serde(rename = "active_api_key_index")]
    active_index: usize,
}

#[derive(Deserialize)]
struct RawCredentialSet {
    #[serde(default)]
    api_keys: Vec<CredentialRecord>,
    #[serde(default)]
    active_api_key_index: usize,
}

impl From<RawCredentialSet> for CredentialSet {
    fn from(raw: RawCredentialSet) -> Self {
        let mut set = Self {
            records: raw.api_keys,
            active_index: raw.active_api_key_index,
        };
        set.clamp_active();
        set
    }
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &CredentialRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&CredentialRecord> {
        self.records.get(index)
    }

    /// Record used for balance fetches, None when no key is configured
    pub fn active(&self) -> Option<&CredentialRecord> {
        self.records.get(self.active_index)
    }

    /// Append a key and make it active. Returns its index.
    ///
    /// The key is trimmed and format-checked; an empty label becomes
    /// "Key N". Liveness must be verified by the caller beforehand.
    pub fn add(&mut self, key: &str, label: &str) -> Result<usize> {
        let key = key.trim();
        validate_key_format(key)?;

        let label = match label.trim() {
            "" => format!("Key {}", self.records.len() + 1),
            label => label.to_string(),
        };

        self.records.push(CredentialRecord::new(key, label));
        self.active_index = self.records.len() - 1;

        debug!(
            index = self.active_index,
            key = %self.records[self.active_index].masked_key(),
            "Credential added"
        );
        Ok(self.active_index)
    }

    /// Remove the record at `index` and return it.
    ///
    /// The active index is left as is and only clamped to the new last
    /// record, so removing an earlier record shifts the selection to the
    /// next key in order.
    pub fn remove(&mut self, index: usize) -> Result<CredentialRecord> {
        if self.records.len() == 1 {
            return Err(CoreError::InvariantViolation {
                message: "Cannot delete the last API key.".to_string(),
            });
        }
        self.check_index(index)?;

        let removed = self.records.remove(index);
        self.clamp_active();

        debug!(index, active = self.active_index, "Credential removed");
        Ok(removed)
    }

    pub fn set_active(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.active_index = index;
        Ok(())
    }

    /// Replace the label; a blank label is ignored.
    pub fn rename(&mut self, index: usize, new_label: &str) -> Result<()> {
        self.check_index(index)?;

        let new_label = new_label.trim();
        if new_label.is_empty() {
            return Ok(());
        }

        self.records[index].label = new_label.to_string();
        Ok(())
    }

    /// Move the record at `from` to position `to`.
    ///
    /// The active selection follows record identity, not position.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }

        let record = self.records.remove(from);
        self.records.insert(to, record);

        let active = self.active_index;
        self.active_index = if active == from {
            to
        } else if from < active && active <= to {
            active - 1
        } else if to <= active && active < from {
            active + 1
        } else {
            active
        };

        debug!(from, to, active = self.active_index, "Credentials reordered");
        Ok(())
    }

    /// Select the next record, wrapping around. No-op with one record or none.
    pub fn next(&mut self) {
        if self.records.len() > 1 {
            self.active_index = (self.active_index + 1) % self.records.len();
        }
    }

    /// Select the previous record, wrapping around. No-op with one record or none.
    pub fn previous(&mut self) {
        let len = self.records.len();
        if len > 1 {
            self.active_index = (self.active_index + len - 1) % len;
        }
    }

    /// Index of the first record holding `key`
    pub fn find_by_key(&self, key: &str) -> Option<usize> {
        let key = key.trim();
        self.records.iter().position(|record| record.key == key)
    }

    /// Switch to an already-configured key. Returns its index, or None when
    /// the key is not in the set (nothing changes then).
    pub fn activate_key(&mut self, key: &str) -> Option<usize> {
        let index = self.find_by_key(key)?;
        self.active_index = index;
        Some(index)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(CoreError::OutOfRange {
                index,
                len: self.records.len(),
            })
        }
    }

    fn clamp_active(&mut self) {
        if self.active_index >= self.records.len() {
            self.active_index = self.records.len().saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: usize) -> String {
        format!("sk-or-v1-{:012}", n)
    }

    fn set_of(n: usize) -> CredentialSet {
        let mut set = CredentialSet::new();
        for i in 0..n {
            set.add(&key(i), &format!("label-{}", i)).unwrap();
        }
        set
    }

    #[test]
    fn test_validate_key_format() {
        assert_eq!(
            validate_key_format("   "),
            Err(CoreError::Validation {
                reason: KeyFormatIssue::Empty
            })
        );
        assert_eq!(
            validate_key_format("pk-1234567890123456789"),
            Err(CoreError::Validation {
                reason: KeyFormatIssue::MissingPrefix
            })
        );
        assert_eq!(
            validate_key_format("sk-123"),
            Err(CoreError::Validation {
                reason: KeyFormatIssue::TooShort
            })
        );
        assert!(validate_key_format("sk-12345678901234567").is_ok());
        assert!(validate_key_format("  sk-12345678901234567  ").is_ok());
    }

    #[test]
    fn test_add_21_char_key_to_set_of_two() {
        let mut set = set_of(2);
        set.set_active(0).unwrap();

        let new_key = "sk-abcdefghijklmnopqr";
        assert_eq!(new_key.len(), 21);

        let index = set.add(new_key, "third").unwrap();
        assert_eq!(index, 2);
        assert_eq!(set.len(), 3);
        assert_eq!(set.active_index(), 2);
        assert_eq!(set.active().unwrap().label, "third");
    }

    #[test]
    fn test_add_defaults_label_and_trims_key() {
        let mut set = set_of(1);
        set.add(&format!("  {}  ", key(7)), "  ").unwrap();

        assert_eq!(set.get(1).unwrap().label, "Key 2");
        assert_eq!(set.get(1).unwrap().key, key(7));
    }

    #[test]
    fn test_add_invalid_key_leaves_set_unchanged() {
        let mut set = set_of(2);
        set.set_active(0).unwrap();
        let before = set.clone();

        assert!(set.add("not-a-key", "x").is_err());
        assert_eq!(set, before);
    }

    #[test]
    fn test_remove_last_record_is_protected() {
        let mut set = set_of(1);
        let before = set.clone();

        for index in [0, 1, 99] {
            let err = set.remove(index).unwrap_err();
            assert!(matches!(err, CoreError::InvariantViolation { .. }));
            assert_eq!(set, before);
        }
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut set = set_of(3);
        let before = set.clone();

        assert_eq!(
            set.remove(3).unwrap_err(),
            CoreError::OutOfRange { index: 3, len: 3 }
        );
        assert_eq!(set, before);
    }

    #[test]
    fn test_remove_earlier_record_keeps_active_index() {
        let mut set = set_of(4);
        set.set_active(2).unwrap();

        let removed = set.remove(0).unwrap();
        assert_eq!(removed.label, "label-0");
        assert_eq!(set.active_index(), 2);
        assert_eq!(set.active().unwrap().label, "label-3");
    }

    #[test]
    fn test_remove_active_clamps() {
        let mut set = set_of(3);
        // add() left the last record active
        set.remove(2).unwrap();
        assert_eq!(set.active_index(), 1);
        assert_eq!(set.active().unwrap().label, "label-1");

        let mut set = set_of(3);
        set.set_active(1).unwrap();
        set.remove(1).unwrap();
        assert_eq!(set.active_index(), 1);
        assert_eq!(set.active().unwrap().label, "label-2");
    }

    #[test]
    fn test_set_active_out_of_range() {
        let mut set = set_of(2);
        assert_eq!(
            set.set_active(2).unwrap_err(),
            CoreError::OutOfRange { index: 2, len: 2 }
        );
        assert_eq!(set.active_index(), 1);
    }

    #[test]
    fn test_rename() {
        let mut set = set_of(2);
        set.rename(0, "  personal ").unwrap();
        assert_eq!(set.get(0).unwrap().label, "personal");

        set.rename(0, "   ").unwrap();
        assert_eq!(set.get(0).unwrap().label, "personal");

        assert!(set.rename(5, "x").is_err());
    }

    #[test]
    fn test_reorder_preserves_active_identity() {
        let len = 5;
        for active in 0..len {
            for from in 0..len {
                for to in 0..len {
                    let mut set = set_of(len);
                    set.set_active(active).unwrap();
                    let active_label = set.active().unwrap().label.clone();
                    let moved_label = set.get(from).unwrap().label.clone();

                    set.reorder(from, to).unwrap();

                    assert_eq!(
                        set.active().unwrap().label,
                        active_label,
                        "active={} from={} to={}",
                        active,
                        from,
                        to
                    );
                    assert_eq!(set.get(to).unwrap().label, moved_label);
                    assert_eq!(set.len(), len);
                }
            }
        }
    }

    #[test]
    fn test_reorder_out_of_range_is_untouched() {
        let mut set = set_of(3);
        let before = set.clone();

        assert!(set.reorder(0, 3).is_err());
        assert!(set.reorder(7, 0).is_err());
        assert_eq!(set, before);
    }

    #[test]
    fn test_next_previous_cycle() {
        let mut set = set_of(3);
        set.set_active(2).unwrap();

        set.next();
        assert_eq!(set.active_index(), 0);
        set.previous();
        assert_eq!(set.active_index(), 2);
        set.previous();
        assert_eq!(set.active_index(), 1);
    }

    #[test]
    fn test_next_previous_noop_for_single_or_empty() {
        let mut single = set_of(1);
        single.next();
        single.previous();
        assert_eq!(single.active_index(), 0);

        let mut empty = CredentialSet::new();
        empty.next();
        empty.previous();
        assert_eq!(empty.active_index(), 0);
        assert!(empty.active().is_none());
    }

    #[test]
    fn test_activate_key() {
        let mut set = set_of(3);
        assert_eq!(set.activate_key(&format!(" {} ", key(0))), Some(0));
        assert_eq!(set.active_index(), 0);

        assert_eq!(set.activate_key(&key(42)), None);
        assert_eq!(set.active_index(), 0);
    }

    #[test]
    fn test_duplicates_permitted() {
        let mut set = set_of(1);
        set.add(&key(0), "again").unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.find_by_key(&key(0)), Some(0));
    }

    #[test]
    fn test_serde_field_names_and_clamp() {
        let json = format!(
            r#"{{"api_keys": [{{"key": "{}", "label": "a"}}], "active_api_key_index": 4}}"#,
            key(1)
        );
        let set: CredentialSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.active_index(), 0);

        let value = serde_json::to_value(&set).unwrap();
        assert!(value.get("api_keys").is_some());
        assert_eq!(value["active_api_key_index"], 0);
    }
}
