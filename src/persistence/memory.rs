//! In-memory store: no actual durability, used for tests and ephemeral sessions.

use super::{EngineSnapshot, PersistenceError, PersistenceStore};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: HashMap<String, EngineSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceStore for MemoryStore {
    fn save(&mut self, slot: &str, snapshot: &EngineSnapshot) -> Result<(), PersistenceError> {
        self.slots.insert(slot.to_string(), snapshot.clone());
        Ok(())
    }

    fn load(&self, slot: &str) -> Result<EngineSnapshot, PersistenceError> {
        self.slots.get(slot).cloned().ok_or_else(|| PersistenceError::NotFound(slot.to_string()))
    }

    fn exists(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
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
            account: Account::new(Money::cents(1_000_00)),
            availability: ShareAvailabilityBook::new(),
            pending_orders: PendingOrders::new(),
        }
    }

    #[test]
    fn round_trips_a_saved_snapshot() {
        let mut store = MemoryStore::new();
        assert!(!store.exists("slot1"));
        store.save("slot1", &snapshot()).unwrap();
        assert!(store.exists("slot1"));
        let loaded = store.load("slot1").unwrap();
        assert_eq!(loaded.account.cash, Money::cents(1_000_00));
    }

    #[test]
    fn loading_unknown_slot_errors() {
        let store = MemoryStore::new();
        assert!(matches!(store.load("missing"), Err(PersistenceError::NotFound(_))));
    }
}
