//! Domain layer - node records and their validation
//!
//! Identity and position are explicit structs so that "never received"
//! (`None`) and "received but empty" (`Some(Default)`) stay distinct.

pub mod node;
pub mod validation;

pub use node::*;
pub use validation::*;
