//! Transport layer: the local HTTP server behind the chat panel

pub mod http;

pub use http::{router, run_http_server, serve};
