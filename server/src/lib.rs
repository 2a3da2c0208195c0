//! Backend for a student-marketplace waitlist site.
//!
//! The frontend is a thin static page; all durable waitlist data lives in a
//! hosted form service reached over plain HTTPS GET. This server sits in
//! between:
//!
//! - `/leaderboard` fetches the full submission set from the form service,
//!   rebuilds the referral leaderboard from scratch, and returns it. An
//!   optional `q` parameter filters the ranked view.
//! - `/signup` runs the duplicate-email guard, mints a referral code, and
//!   stashes the summary the confirmation view renders.
//! - `/sessions/{id}/...` carries the small per-visitor state (referral
//!   attribution, post-signup summary) that the original site kept in
//!   browser storage.
//!
//! # Notes
//!
//! ## Why no cache
//!
//! The submission set is tiny (a waitlist, not a firehose) and the form
//! service returns everything in one response, so each leaderboard request
//! just refetches. Rapid refreshes are allowed to race; sequence-numbered
//! snapshots keep a slow stale response from clobbering a fresher one.
//!
//! ## Credentials
//!
//! `PROFORMS_API_KEY` and `PROFORMS_ACCESS_TOKEN` are read from the
//! environment, falling back to `/run/secrets/`.

use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod error;
pub mod guard;
pub mod proforms;
pub mod routes;
pub mod state;

use routes::{
    attribution_handler, clear_attribution_handler, leaderboard_handler, signup_handler,
    summary_handler,
};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new();

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/leaderboard", get(leaderboard_handler))
        .route("/signup", post(signup_handler))
        .route(
            "/sessions/{id}/attribution",
            get(attribution_handler).delete(clear_attribution_handler),
        )
        .route("/sessions/{id}/summary", get(summary_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
