//! Support code for the `ccweb` command-line converter.

pub mod logging;
pub mod observer;
pub mod output;
