//! twin: editor assistant backed by a chat-completions endpoint
//!
//! This library provides:
//! - A bounded tool-calling chat agent with read-only workspace tools
//! - JSON-file chat history
//! - LSP server exposing "explain" and "explain as comment" commands
//! - HTTP server for the chat panel

pub mod agent;
pub mod commands;
pub mod config;
pub mod llm;
pub mod lsp;
pub mod panel;
pub mod storage;
pub mod tools;
pub mod transport;

pub use agent::ChatAgent;
pub use config::Config;
