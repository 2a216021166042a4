//! Durable projection of engine state, account, holdings, and pending orders, with idempotent
//! replay on restart (§5 "write-ahead semantics: each mutation batch durable before
//! acknowledgement"). [`memory::MemoryStore`] and [`file::FileStore`] both implement
//! [`PersistenceStore`]; the engine depends only on the trait.

pub mod error;
pub mod file;
pub mod memory;

use crate::account::Account;
use crate::availability::ShareAvailabilityBook;
use crate::engine::state::EngineState;
use crate::trade::PendingOrders;
use error::PersistenceError;
use serde::{Deserialize, Serialize};

/// Everything the engine needs to resume exactly where it left off. One row per savegame in the
/// logical schema described in §6 ("Persisted state layout").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub engine_state: EngineState,
    pub account: Account,
    pub availability: ShareAvailabilityBook,
    pub pending_orders: PendingOrders,
}

/// A durable store for one [`EngineSnapshot`] per save slot. Implementations must make `save`
/// durable before returning `Ok` (§5 write-ahead semantics) — the engine treats a successful
/// `save` as a commit point and will not retry that batch.
pub trait PersistenceStore {
    fn save(&mut self, slot: &str, snapshot: &EngineSnapshot) -> Result<(), PersistenceError>;
    fn load(&self, slot: &str) -> Result<EngineSnapshot, PersistenceError>;
    fn exists(&self, slot: &str) -> bool;
}
