use serde::{Deserialize, Serialize};

/// Marker event that terminates the engine's background tick loop: the terminal variant of
/// [`crate::engine::command::Command`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize)]
pub struct Shutdown;
