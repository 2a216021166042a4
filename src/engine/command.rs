//! The in-process command surface a request handler issues against a running [`super::Engine`],
//! mirroring the HTTP surface named in §6 one level down the stack (HTTP itself is out of scope).

use crate::trade::{Order, TradeOutcome};
use crate::trade::error::TradeError;
use crate::persistence::error::PersistenceError;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum Command {
    SubmitOrder(Order),
    CancelOrder(Uuid),
    Pause,
    Resume,
    SetSpeed { requested_seconds_per_wall_second: i64 },
    TriggerCrash { scenario_id: String },
    DeactivateCrash { scenario_id: String },
    PruneNow,
    Save { slot: String },
}

/// Result of dispatching a single [`Command`] against the engine.
#[derive(Debug)]
pub enum CommandOutcome {
    Trade(Result<TradeOutcome, TradeError>),
    Cancelled(bool),
    Ack,
    CrashTriggered(bool),
    CrashDeactivated(bool),
    Saved(Result<(), PersistenceError>),
}

/// A command plus the channel its result should be delivered on, the unit the background loop
/// actually drains from its `mpsc::Receiver` (§5 "handlers serialize through a single mutation
/// lock", here modeled as one consumer task rather than lock contention across many tasks).
#[derive(Debug)]
pub struct Envelope {
    pub command: Command,
    pub respond_to: tokio::sync::oneshot::Sender<CommandOutcome>,
}
