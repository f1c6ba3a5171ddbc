//! HTTP server for the chat panel
//!
//! `GET /` serves the page, `GET /api/history` answers with `loadHistory`,
//! and `POST /api/message` takes a panel message and answers with
//! `groqResponse` (or 204 when there is nothing to say).

use crate::panel::{render_panel_html, PanelController, PanelMessage};
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Build the panel router
pub fn router(controller: PanelController) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/history", get(load_history))
        .route("/api/message", post(post_message))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(controller)
}

/// Serve on an already-bound listener
pub async fn serve(listener: TcpListener, controller: PanelController) -> Result<()> {
    axum::serve(listener, router(controller)).await?;
    Ok(())
}

pub async fn run_http_server(host: &str, port: u16, controller: PanelController) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Chat panel at http://{}", listener.local_addr()?);
    serve(listener, controller).await
}

async fn index() -> Html<&'static str> {
    Html(render_panel_html())
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn load_history(State(controller): State<PanelController>) -> Json<PanelMessage> {
    Json(controller.on_connect().await)
}

async fn post_message(
    State(controller): State<PanelController>,
    Json(message): Json<PanelMessage>,
) -> Response {
    match controller.handle(message).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
