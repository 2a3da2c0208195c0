use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use referral::{
    aggregate::{aggregate, filter_entries},
    codegen::generate_referral_code,
    models::LeaderboardEntry,
    session::referral_link,
};

use crate::{
    error::AppError,
    guard::check_duplicate,
    proforms::fetch_submissions,
    state::AppState,
};

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    q: Option<String>,
}

/// Fetches the full submission set and rebuilds the board. Every call is a
/// fresh cycle; a failed fetch returns an error with no partial board.
pub async fn leaderboard_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let seq = state.board.begin_fetch();

    let submissions = fetch_submissions(&state.http, &state.config).await?;
    let entries = aggregate(&submissions);

    if !state.board.apply(seq, entries) {
        info!("Discarded stale leaderboard fetch {seq}");
    }

    let board = state.board.current();
    let board = match query.q {
        Some(q) => filter_entries(&board, &q),
        None => board,
    };

    Ok(Json(board))
}

#[derive(Deserialize)]
pub struct SignupRequest {
    pub session_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupReceipt {
    pub referral_code: String,
    pub referral_link: String,
    pub referred_by: Option<String>,
}

/// The pre-submit step: duplicate guard, code generation, and stashing the
/// summary for the confirmation view. The actual form post to the hosted
/// service is the browser's job and happens after this returns.
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<SignupReceipt>, AppError> {
    if check_duplicate(state.clone(), &request.email)
        .await
        .blocks_signup()
    {
        return Err(AppError::DuplicateEmail);
    }

    let code = generate_referral_code(&request.email);

    let referred_by = state.with_session(&request.session_id, |session| {
        session.stash_signup(&request.name, &request.email, &code);
        session.attribution().map(str::to_string)
    });

    info!("Signup prepared for session {}", request.session_id);

    Ok(Json(SignupReceipt {
        referral_link: referral_link(&state.config.site_origin, &code),
        referral_code: code,
        referred_by,
    }))
}

#[derive(Deserialize)]
pub struct AttributionQuery {
    #[serde(rename = "ref")]
    ref_code: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionView {
    pub referred_by: Option<String>,
}

/// Entry-URL rule: a `ref` parameter overwrites and persists the session's
/// attribution; without one the stored value, if any, is returned and no
/// session is created.
pub async fn attribution_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(query): Query<AttributionQuery>,
) -> Json<AttributionView> {
    let referred_by = state.observe_attribution(&session_id, query.ref_code.as_deref());

    Json(AttributionView { referred_by })
}

pub async fn clear_attribution_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    state.clear_attribution(&session_id);

    StatusCode::NO_CONTENT
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub name: String,
    pub email: String,
    pub referral_code: String,
    pub referral_link: String,
}

/// Personalized post-signup summary for the confirmation view.
pub async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SummaryView>, AppError> {
    let summary = state
        .session(&session_id)
        .and_then(|session| session.summary().cloned())
        .ok_or(AppError::UnknownSession)?;

    Ok(Json(SummaryView {
        referral_link: referral_link(&state.config.site_origin, &summary.referral_code),
        name: summary.name,
        email: summary.email,
        referral_code: summary.referral_code,
    }))
}
