//! Client bookkeeping shared by every session.
//!
//! This module holds the two pieces of shared mutable state: the name
//! counter and the client registry. Each guards itself.

pub mod client;
pub mod names;
pub mod registry;

pub use client::ClientRecord;
pub use names::NameAssigner;
pub use registry::{render_status, ClientRegistry, NO_CLIENTS_LINE};
