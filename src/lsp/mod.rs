//! LSP server implementation

mod code_action;
mod document;
mod server;

pub use code_action::ExplainArgs;
pub use document::{Document, DocumentStore};
pub use server::{plan_explain, run_lsp_server, ExplainAction, TwinLspBackend};
