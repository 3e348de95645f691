//! Tresor RPC - API/CLI orchestrator
//!
//! This crate wires the file-backed collaborators to the workflow and
//! provides the `tresor` CLI commands.

pub mod commands;
pub mod context;

pub use context::AppContext;
