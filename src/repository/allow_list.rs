//! Allow-list of Telegram users permitted to use the bot.
//!
//! Persisted as a pretty-printed JSON object mapping user id to label:
//!
//! ```json
//! {
//!   "123456789": "admin",
//!   "987654321": "user_987654321"
//! }
//! ```
//!
//! Every mutation is written back immediately. The administrator is always on
//! the list and cannot be removed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

/// Label given to the administrator entry when the file has none.
pub const ADMIN_LABEL: &str = "admin";

/// Errors from allow-list operations.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("User {0} is already allowed")]
    AlreadyAllowed(u64),

    #[error("Allow-list is full ({0} users)")]
    LimitReached(usize),

    #[error("The administrator cannot be removed")]
    CannotRemoveAdmin,

    #[error("User {0} is not on the allow-list")]
    NotFound(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed set of allowed user ids.
#[derive(Debug)]
pub struct AllowList {
    path: PathBuf,
    admin_id: u64,
    max_entries: Option<usize>,
    entries: BTreeMap<u64, String>,
}

impl AllowList {
    /// Load the allow-list from `path`.
    ///
    /// A missing file is created holding only the administrator. An unreadable
    /// or malformed file is left alone and the list starts with only the
    /// administrator. With `max_entries`, surplus entries are dropped keeping
    /// the administrator and then the lowest ids.
    pub fn load(path: impl Into<PathBuf>, admin_id: u64, max_entries: Option<usize>) -> Self {
        let path = path.into();
        let mut list = Self {
            path,
            admin_id,
            max_entries,
            entries: BTreeMap::new(),
        };

        let existed = list.path.exists();
        if existed {
            match read_entries(&list.path) {
                Ok(entries) => list.entries = entries,
                Err(e) => warn!(
                    "Could not read allow-list {}: {}; starting with the administrator only",
                    list.path.display(),
                    e
                ),
            }
        }

        list.entries
            .entry(admin_id)
            .or_insert_with(|| ADMIN_LABEL.to_string());
        list.enforce_cap();

        if !existed {
            match list.save() {
                Ok(()) => info!("Created allow-list at {}", list.path.display()),
                Err(e) => warn!("Could not create allow-list {}: {}", list.path.display(), e),
            }
        }

        info!("Allow-list loaded with {} users", list.entries.len());
        list
    }

    pub fn admin_id(&self) -> u64 {
        self.admin_id
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        user_id == self.admin_id
    }

    pub fn is_allowed(&self, user_id: u64) -> bool {
        self.entries.contains_key(&user_id)
    }

    /// Add a user and persist the list.
    pub fn grant(&mut self, user_id: u64, label: impl Into<String>) -> Result<(), AccessError> {
        if self.entries.contains_key(&user_id) {
            return Err(AccessError::AlreadyAllowed(user_id));
        }
        if let Some(max) = self.max_entries {
            if self.entries.len() >= max {
                return Err(AccessError::LimitReached(max));
            }
        }

        self.entries.insert(user_id, label.into());
        if let Err(e) = self.save() {
            self.entries.remove(&user_id);
            return Err(e);
        }
        Ok(())
    }

    /// Remove a user and persist the list. Returns the removed label.
    pub fn revoke(&mut self, user_id: u64) -> Result<String, AccessError> {
        if self.is_admin(user_id) {
            return Err(AccessError::CannotRemoveAdmin);
        }
        let label = self
            .entries
            .remove(&user_id)
            .ok_or(AccessError::NotFound(user_id))?;

        if let Err(e) = self.save() {
            self.entries.insert(user_id, label);
            return Err(e);
        }
        Ok(label)
    }

    /// Entries in ascending id order.
    pub fn entries(&self) -> impl Iterator<Item = (u64, &str)> {
        self.entries.iter().map(|(id, label)| (*id, label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn enforce_cap(&mut self) {
        let Some(max) = self.max_entries else {
            return;
        };
        if self.entries.len() <= max {
            return;
        }

        let keep_others = max.saturating_sub(1);
        let dropped: Vec<u64> = self
            .entries
            .keys()
            .copied()
            .filter(|id| *id != self.admin_id)
            .skip(keep_others)
            .collect();
        for id in &dropped {
            self.entries.remove(id);
        }
        warn!(
            "Allow-list exceeded {} users, dropped {} entries",
            max,
            dropped.len()
        );
    }

    fn save(&self) -> Result<(), AccessError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<u64, String>, AccessError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ADMIN: u64 = 1000;

    fn stored(path: &Path) -> BTreeMap<u64, String> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_missing_file_is_created_with_admin() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("allowed_users.json");

        let list = AllowList::load(&path, ADMIN, None);

        assert!(list.is_allowed(ADMIN));
        assert_eq!(list.len(), 1);
        assert_eq!(stored(&path).get(&ADMIN).map(String::as_str), Some(ADMIN_LABEL));
    }

    #[test]
    fn test_existing_file_gets_admin_inserted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"{"42": "alice"}"#).unwrap();

        let list = AllowList::load(&path, ADMIN, None);

        assert!(list.is_allowed(42));
        assert!(list.is_allowed(ADMIN));
        let entries: Vec<_> = list.entries().collect();
        assert_eq!(entries, vec![(42, "alice"), (ADMIN, ADMIN_LABEL)]);
    }

    #[test]
    fn test_corrupt_file_starts_with_admin_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "{not json").unwrap();

        let list = AllowList::load(&path, ADMIN, None);

        assert_eq!(list.len(), 1);
        assert!(list.is_allowed(ADMIN));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{not json");
    }

    #[test]
    fn test_grant_and_revoke_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        let mut list = AllowList::load(&path, ADMIN, None);

        list.grant(7, "user_7").unwrap();
        assert!(stored(&path).contains_key(&7));

        let reloaded = AllowList::load(&path, ADMIN, None);
        assert!(reloaded.is_allowed(7));

        assert_eq!(list.revoke(7).unwrap(), "user_7");
        assert!(!list.is_allowed(7));
        assert!(!stored(&path).contains_key(&7));
    }

    #[test]
    fn test_grant_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let mut list = AllowList::load(dir.path().join("users.json"), ADMIN, None);

        list.grant(7, "user_7").unwrap();
        assert!(matches!(list.grant(7, "again"), Err(AccessError::AlreadyAllowed(7))));
        assert!(matches!(list.grant(ADMIN, "x"), Err(AccessError::AlreadyAllowed(ADMIN))));
    }

    #[test]
    fn test_grant_respects_cap() {
        let dir = tempdir().unwrap();
        let mut list = AllowList::load(dir.path().join("users.json"), ADMIN, Some(2));

        list.grant(7, "user_7").unwrap();
        assert!(matches!(list.grant(8, "user_8"), Err(AccessError::LimitReached(2))));
        assert!(!list.is_allowed(8));
    }

    #[test]
    fn test_load_trims_to_cap_keeping_admin_and_lowest_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"{"5": "e", "3": "c", "9": "i", "1": "a"}"#).unwrap();

        let list = AllowList::load(&path, ADMIN, Some(3));

        let ids: Vec<u64> = list.entries().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 3, ADMIN]);
    }

    #[test]
    fn test_revoke_errors() {
        let dir = tempdir().unwrap();
        let mut list = AllowList::load(dir.path().join("users.json"), ADMIN, None);

        assert!(matches!(list.revoke(ADMIN), Err(AccessError::CannotRemoveAdmin)));
        assert!(matches!(list.revoke(55), Err(AccessError::NotFound(55))));
        assert!(list.is_allowed(ADMIN));
    }

    #[test]
    fn test_save_failure_rolls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        let mut list = AllowList::load(&path, ADMIN, None);

        // A directory in place of the file makes every write fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(list.grant(7, "user_7"), Err(AccessError::Io(_))));
        assert!(!list.is_allowed(7));
    }
}
