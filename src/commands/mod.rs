// src/commands/mod.rs
//! Command handlers for the flowport CLI

mod analyze;
mod convert;
mod publish;

pub use analyze::cmd_analyze;
pub use convert::cmd_convert;
pub use publish::cmd_publish;
