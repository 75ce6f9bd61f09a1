//! `convene serve` -- HTTP JSON API over the convention engine.
//!
//! Backed by the in-memory store, optionally seeded from a JSON file.
//! Endpoints:
//!
//! - GET  /health                              - Server status
//! - GET  /conventions/{id}                    - Fetch a convention
//! - POST /conventions/{id}/sign               - Record a signature
//! - POST /conventions/{id}/status             - Agency/back-office decision
//! - POST /conventions/{id}/edit               - Pre-signature content edit
//! - POST /conventions/{id}/transfer           - Move to another agency
//! - POST /conventions/{id}/signature-links    - Send signature links
//! - POST /conventions/{id}/reminders          - Send signature reminders
//! - POST /auth/verify                         - Token to credential exchange
//! - GET  /to/{short_id}                       - Short-link redirect
//!
//! All responses use Content-Type: application/json; domain errors map
//! to 4xx status codes with an `{"error": ...}` body.

mod handlers;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use convene_core::{EventTopicTable, SystemClock, TransitionPolicy};
use convene_engine::Engine;
use convene_links::CapabilityTokenIssuer;
use convene_storage::InMemoryStore;

use self::handlers::{
    handle_edit, handle_get_convention, handle_health, handle_not_found, handle_reminders,
    handle_short_link, handle_sign, handle_signature_links, handle_transfer,
    handle_update_status, handle_verify_token,
};
use self::state::{AppState, SeedData};

/// Start the HTTP server on the given port.
///
/// When TLS cert/key paths are provided (behind the `tls` feature), the
/// server listens over HTTPS via `axum-server`; otherwise plain HTTP.
pub async fn start_server(
    port: u16,
    tokens: CapabilityTokenIssuer,
    seed_path: Option<PathBuf>,
    tls_cert: Option<PathBuf>,
    tls_key: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(InMemoryStore::new());

    if let Some(path) = &seed_path {
        let seed = SeedData::load(path)?;
        seed.apply(&store).await?;
        tracing::info!(
            conventions = seed.conventions.len(),
            agencies = seed.agencies.len(),
            users = seed.users.len(),
            "seed data loaded"
        );
    }

    let engine = Engine::new(
        Arc::clone(&store),
        Arc::new(SystemClock),
        tokens,
        TransitionPolicy::default(),
        EventTopicTable::default(),
    );
    let state = Arc::new(AppState { engine });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/conventions/{id}", get(handle_get_convention))
        .route("/conventions/{id}/sign", post(handle_sign))
        .route("/conventions/{id}/status", post(handle_update_status))
        .route("/conventions/{id}/edit", post(handle_edit))
        .route("/conventions/{id}/transfer", post(handle_transfer))
        .route(
            "/conventions/{id}/signature-links",
            post(handle_signature_links),
        )
        .route("/conventions/{id}/reminders", post(handle_reminders))
        .route("/auth/verify", post(handle_verify_token))
        .route("/to/{short_id}", get(handle_short_link))
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "convene API listening");

    #[cfg(feature = "tls")]
    if let (Some(cert), Some(key)) = (&tls_cert, &tls_key) {
        let tls_config =
            axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key).await?;
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
        return Ok(());
    }

    #[cfg(not(feature = "tls"))]
    if tls_cert.is_some() || tls_key.is_some() {
        return Err("TLS requested but this binary was built without the 'tls' feature".into());
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
