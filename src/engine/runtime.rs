//! Background task shape (§5): one tick loop advancing simulated time on a fixed wall-clock
//! cadence, and one command channel serializing every mutating request through the same
//! [`super::Engine`] handle — mirroring `barter`'s run-loop split between a scheduled step and an
//! inbound command stream, minus any networking (the HTTP surface named in §6 is out of scope).

use crate::engine::command::{CommandOutcome, Envelope};
use crate::engine::Engine;
use crate::shutdown::Shutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Handle a caller uses to submit commands to the running engine and to request shutdown.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Envelope>,
    shutdown: watch::Sender<Option<Shutdown>>,
}

impl EngineHandle {
    /// Submits `command` and waits for its outcome. Fails only if the tick loop has already
    /// stopped.
    pub async fn dispatch(&self, command: crate::engine::command::Command) -> Option<CommandOutcome> {
        let (respond_to, receiver) = tokio::sync::oneshot::channel();
        self.commands.send(Envelope { command, respond_to }).await.ok()?;
        receiver.await.ok()
    }

    /// Signals the tick loop to stop after finishing its current iteration.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(Some(Shutdown));
    }
}

/// Spawns the background tick loop: every `tick_period` of wall time it calls
/// [`Engine::tick`](super::Engine::tick), and in between it drains [`Envelope`]s off the command
/// channel as they arrive. Returns a handle for submitting commands and a join handle for the
/// loop itself.
pub fn spawn(engine: Arc<Engine>, tick_period: Duration, command_buffer: usize) -> (EngineHandle, tokio::task::JoinHandle<()>) {
    let (command_tx, mut command_rx) = mpsc::channel::<Envelope>(command_buffer);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(None);

    let join = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(?tick_period, "engine tick loop started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    engine.tick(tick_period);
                }
                maybe_envelope = command_rx.recv() => {
                    match maybe_envelope {
                        Some(Envelope { command, respond_to }) => {
                            let outcome = engine.dispatch(command);
                            if respond_to.send(outcome).is_err() {
                                warn!("command caller dropped its response channel");
                            }
                        }
                        None => break,
                    }
                }
                _ = shutdown_rx.changed() => {
                    if shutdown_rx.borrow().is_some() {
                        info!("engine tick loop received shutdown signal");
                        break;
                    }
                }
            }
        }
        info!("engine tick loop stopped");
    });

    (EngineHandle { commands: command_tx, shutdown: shutdown_tx }, join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::command::Command;
    use crate::money::Money;
    use crate::persistence::memory::MemoryStore;
    use crate::reference::ReferenceData;
    use crate::time::instant;

    #[tokio::test]
    async fn dispatch_round_trips_through_the_channel() {
        let reference = Arc::new(ReferenceData::load());
        let engine = Arc::new(Engine::new(
            reference,
            EngineConfig::default(),
            Box::new(MemoryStore::new()),
            Money::cents(1_000_000_00),
            instant(2014, 6, 9, 14, 30, 0),
        ));
        let (handle, join) = spawn(engine, Duration::from_millis(20), 8);

        let outcome = handle.dispatch(Command::Pause).await;
        assert!(matches!(outcome, Some(CommandOutcome::Ack)));

        handle.shutdown();
        let _ = join.await;
    }
}
