//! Node Registry Module
//!
//! Live registry of mesh nodes with synchronous change notification.

pub mod events;
pub mod node_registry;
pub mod observers;
pub mod shared;

pub use events::*;
pub use node_registry::*;
pub use observers::*;
pub use shared::*;
