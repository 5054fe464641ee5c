//! Line protocol parsing, framing and command dispatch.
//!
//! This module provides the wire format shared by the session handler and
//! the repository streaming path.

pub mod router;
pub mod types;
pub mod wire;

pub use router::{route_command, Flow};
pub use types::{Command, Reply};
pub use wire::{read_line, send_best_effort, write_reply, Incoming};
