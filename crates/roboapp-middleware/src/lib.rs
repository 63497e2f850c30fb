//! `roboapp-middleware` – gets inbound samples into the stores.
//!
//! # Modules
//!
//! - [`keys`] – the key expression table and the configurable prefix.
//! - [`router`] – decodes a sample and sets the matching store(s).
//! - [`bus`] – broadcast sample bus between transports and the store
//!   thread, plus the [`pump`] that drains it into a [`Router`].

pub mod bus;
pub mod keys;
pub mod router;

pub use bus::{PumpStats, SampleBus, SampleSubscriber, pump};
pub use keys::{KeyTable, Signal};
pub use router::Router;
