//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{Query, State}, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument, warn};

use crate::domain::DiagnosticCategory;
use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_leaderboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let roster = state.roster.read().await;
  let students = roster.leaderboard();
  Json(RosterOut { total: students.len(), students })
}

#[instrument(level = "info", skip(state, body), fields(name = %body.name))]
pub async fn http_post_student(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AddStudentIn>,
) -> impl IntoResponse {
  let mut roster = state.roster.write().await;
  let added = state.with_rng(|rng| roster.add_student(&body.name, rng).cloned());
  match added {
    Some(student) => Json(student).into_response(),
    // Blank names are ignored; tell the HTTP caller why nothing happened.
    None => (StatusCode::UNPROCESSABLE_ENTITY, "El nombre no puede estar vacío.").into_response(),
  }
}

#[instrument(level = "info", skip(state, body), fields(ids = body.student_ids.len(), points = body.points))]
pub async fn http_post_points(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AdjustScoreIn>,
) -> impl IntoResponse {
  if body.points == 0 {
    warn!(target: "roster", "Zero-point adjustment ignored");
    return (StatusCode::UNPROCESSABLE_ENTITY, "Los puntos deben ser un entero distinto de cero.").into_response();
  }
  let mut roster = state.roster.write().await;
  roster.adjust_score(&body.student_ids, body.points);
  let students = roster.leaderboard();
  Json(RosterOut { total: students.len(), students }).into_response()
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  match export_session(&state).await {
    Ok(doc) => (StatusCode::OK, [("content-type", "application/json")], doc).into_response(),
    Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e).into_response(),
  }
}

#[instrument(level = "info", skip(state, body), fields(bytes = body.data.len()))]
pub async fn http_post_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ImportSessionIn>,
) -> impl IntoResponse {
  match import_session(&state, &body.data).await {
    Ok(count) => {
      info!(target: "roster", count, "HTTP session import accepted");
      Json(ImportSessionOut { count }).into_response()
    }
    Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
  }
}

/// One-shot question (no session, no scoring). Useful for previews and for
/// exercising the theory fallback without a WebSocket.
#[instrument(level = "info", skip(state), fields(category = ?q.category))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestionQuery>,
) -> impl IntoResponse {
  let category = q.category.unwrap_or(DiagnosticCategory::Integers);
  let question = next_question(&state, category).await;
  info!(target: "quiz", id = %question.id, ?category, "HTTP question served");
  Json(question)
}
