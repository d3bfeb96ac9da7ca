//! Shared types for the ccweb message pipeline.

mod display;
mod frames;
mod protocol;
pub mod timestamp;

pub use display::*;
pub use frames::*;
pub use protocol::*;
