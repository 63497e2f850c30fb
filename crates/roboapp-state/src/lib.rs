//! `roboapp-state` – reactive state for the dashboard.
//!
//! # Modules
//!
//! - [`store`] – [`Store`], a single-threaded value cell that notifies its
//!   subscribers synchronously on every `set`.
//! - [`context`] – [`AppContext`], which owns one store per live signal
//!   (camera selection, LiDAR force vector, disks, flap, damage panel).

pub mod context;
pub mod store;

pub use context::AppContext;
pub use store::{Store, Subscription};
