//! File-backed store: each `save` serializes the snapshot to a temp file and renames it over the
//! slot's canonical path, so a crash mid-write never corrupts the last durable snapshot (§5
//! write-ahead semantics — the rename is the commit point).

use super::{EngineSnapshot, PersistenceError, PersistenceStore};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, slot: &str) -> PathBuf {
        self.root.join(format!("{slot}.json"))
    }

    fn tmp_path_for(&self, slot: &str) -> PathBuf {
        self.root.join(format!("{slot}.json.tmp"))
    }
}

impl PersistenceStore for FileStore {
    fn save(&mut self, slot: &str, snapshot: &EngineSnapshot) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.root)?;
        let tmp = self.tmp_path_for(slot);
        let body = serde_json::to_vec_pretty(snapshot)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, self.path_for(slot))?;
        Ok(())
    }

    fn load(&self, slot: &str) -> Result<EngineSnapshot, PersistenceError> {
        let path = self.path_for(slot);
        if !path.exists() {
            return Err(PersistenceError::NotFound(slot.to_string()));
        }
        let body = fs::read(&path)?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn exists(&self, slot: &str) -> bool {
        Path::new(&self.path_for(slot)).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::availability::ShareAvailabilityBook;
    use crate::engine::state::EngineState;
    use crate::money::Money;
    use crate::time::instant;
    use crate::trade::PendingOrders;

    fn snapshot() -> EngineSnapshot {
        EngineSnapshot {
            engine_state: EngineState::new(instant(2020, 1, 1, 0, 0, 0)),
            account: Account::new(Money::cents(5_000_00)),
            availability: ShareAvailabilityBook::new(),
            pending_orders: PendingOrders::new(),
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("chronovest-test-{}", uuid::Uuid::new_v4()));
        let mut store = FileStore::new(&dir);
        store.save("slot1", &snapshot()).unwrap();
        let loaded = store.load("slot1").unwrap();
        assert_eq!(loaded.account.cash, Money::cents(5_000_00));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_slot_errors() {
        let dir = std::env::temp_dir().join(format!("chronovest-test-{}", uuid::Uuid::new_v4()));
        let store = FileStore::new(&dir);
        assert!(matches!(store.load("nope"), Err(PersistenceError::NotFound(_))));
    }
}
