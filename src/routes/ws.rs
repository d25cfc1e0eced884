//! WebSocket upgrade + message loop.
//!
//! Each connection owns its quiz session state machine (`None` = IDLE), a
//! pending auto-advance deadline, and a subscription to the noise monitor.
//! Client messages are parsed as JSON and dispatched; noise status changes
//! and expired feedback windows are pushed from the same select loop, so no
//! two branches ever race on the session.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::logic::{export_session, import_session, next_question};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::QuizSession;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!(target: "mathmaster_backend", "WebSocket upgrade requested");
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Send one JSON message; false means the socket is gone.
async fn send_msg(socket: &mut WebSocket, msg: &ServerWsMessage) -> bool {
    let out = serde_json::to_string(msg).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });
    if let Err(e) = socket.send(Message::Text(out)).await {
        error!(target: "mathmaster_backend", error = %e, "WS send error");
        return false;
    }
    true
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    info!(target: "mathmaster_backend", "WebSocket connected");

    let mut session: Option<QuizSession> = None;
    // Deadline of the feedback window plus the question generation it belongs to.
    let mut advance: Option<(Instant, u64)> = None;
    let mut noise_rx = state.noise.subscribe();

    // Initial snapshots so a new screen can render immediately.
    let students = state.roster.read().await.leaderboard();
    if !send_msg(&mut socket, &ServerWsMessage::Roster { students }).await {
        return;
    }
    let status = *noise_rx.borrow_and_update();
    if !send_msg(&mut socket, &ServerWsMessage::NoiseStatus { status }).await {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let Some(Ok(msg)) = incoming else { break };
                match msg {
                    Message::Text(txt) => {
                        match serde_json::from_str::<ClientWsMessage>(&txt) {
                            Ok(incoming) => {
                                debug!(target: "mathmaster_backend", "WS received: {:?}", &incoming);
                                if !dispatch(&mut socket, &state, &mut session, &mut advance, incoming).await {
                                    break;
                                }
                            }
                            Err(e) => {
                                let reply = ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) };
                                if !send_msg(&mut socket, &reply).await { break; }
                            }
                        }
                    }
                    Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            // Feedback window elapsed: advance to the next question unless the
            // session ended or moved on (stale generation).
            _ = async { tokio::time::sleep_until(advance.map(|(at, _)| at).unwrap_or_else(Instant::now)).await },
                if advance.is_some() =>
            {
                let (_, generation) = advance.take().unwrap_or((Instant::now(), 0));
                match session.as_mut() {
                    Some(s) if s.advance_is_current(generation) => {
                        s.begin_loading();
                        let q = next_question(&state, s.category()).await;
                        s.install_question(q.clone());
                        if !send_msg(&mut socket, &ServerWsMessage::Question { question: q }).await {
                            break;
                        }
                    }
                    _ => {
                        debug!(target: "quiz", generation, "Stale auto-advance timer ignored");
                    }
                }
            }

            changed = noise_rx.changed() => {
                if changed.is_ok() {
                    let status = *noise_rx.borrow_and_update();
                    if !send_msg(&mut socket, &ServerWsMessage::NoiseStatus { status }).await {
                        break;
                    }
                }
            }
        }
    }

    info!(target: "mathmaster_backend", "WebSocket disconnected");
}

/// Handle one client message. Returns false when the socket died mid-reply.
async fn dispatch(
    socket: &mut WebSocket,
    state: &Arc<AppState>,
    session: &mut Option<QuizSession>,
    advance: &mut Option<(Instant, u64)>,
    msg: ClientWsMessage,
) -> bool {
    match msg {
        ClientWsMessage::Ping => send_msg(socket, &ServerWsMessage::Pong).await,

        ClientWsMessage::AddStudent { name } => {
            let mut roster = state.roster.write().await;
            let added = state.with_rng(|rng| roster.add_student(&name, rng).is_some());
            if !added {
                debug!(target: "roster", "WS add_student with blank name ignored");
                return true;
            }
            let students = roster.leaderboard();
            drop(roster);
            send_msg(socket, &ServerWsMessage::Roster { students }).await
        }

        ClientWsMessage::AdjustScore { student_ids, points } => {
            if points == 0 {
                warn!(target: "roster", "WS zero-point adjustment ignored");
                return true;
            }
            let mut roster = state.roster.write().await;
            roster.adjust_score(&student_ids, points);
            let students = roster.leaderboard();
            drop(roster);
            send_msg(socket, &ServerWsMessage::Roster { students }).await
        }

        ClientWsMessage::StartQuiz { category, student_id } => {
            let known = state.roster.read().await.get(&student_id).is_some();
            if !known {
                let reply = ServerWsMessage::Error { message: format!("Estudiante desconocido: {}", student_id) };
                return send_msg(socket, &reply).await;
            }
            *advance = None;
            let mut s = QuizSession::new(category, student_id);
            let q = next_question(state, category).await;
            s.install_question(q.clone());
            *session = Some(s);
            send_msg(socket, &ServerWsMessage::Question { question: q }).await
        }

        ClientWsMessage::SubmitAnswer { option_index } => {
            let Some(s) = session.as_mut() else {
                debug!(target: "quiz", "submit_answer outside a session ignored");
                return true;
            };
            let Some(outcome) = s.submit_answer(option_index, &state.quiz) else {
                // Loading, or already answered: no-op per the double-scoring rule.
                return true;
            };

            let student_id = s.student_id().to_string();
            let mut roster = state.roster.write().await;
            roster.adjust_score(&[student_id.clone()], outcome.delta);
            let new_score = roster.get(&student_id).map(|st| st.score).unwrap_or_default();
            drop(roster);

            *advance = Some((
                Instant::now() + Duration::from_millis(state.quiz.advance_ms),
                s.generation(),
            ));

            let reply = ServerWsMessage::AnswerResult {
                feedback: outcome.feedback,
                correct_index: outcome.correct_index,
                delta: outcome.delta,
                new_score,
            };
            send_msg(socket, &reply).await
        }

        ClientWsMessage::ExitQuiz => {
            // Any pending timer becomes a no-op: session is gone and the
            // deadline is dropped with it.
            *session = None;
            *advance = None;
            info!(target: "quiz", "Quiz session exited");
            let students = state.roster.read().await.leaderboard();
            send_msg(socket, &ServerWsMessage::Roster { students }).await
        }

        ClientWsMessage::ExportSession => match export_session(state).await {
            Ok(data) => send_msg(socket, &ServerWsMessage::SessionData { data }).await,
            Err(e) => send_msg(socket, &ServerWsMessage::Error { message: e }).await,
        },

        ClientWsMessage::ImportSession { data } => match import_session(state, &data).await {
            Ok(count) => {
                if !send_msg(socket, &ServerWsMessage::SessionLoaded { count }).await {
                    return false;
                }
                let students = state.roster.read().await.leaderboard();
                send_msg(socket, &ServerWsMessage::Roster { students }).await
            }
            Err(e) => send_msg(socket, &ServerWsMessage::Error { message: e.to_string() }).await,
        },

        ClientWsMessage::SetSensitivity { value } => {
            state.noise.set_sensitivity(value);
            true
        }

        ClientWsMessage::NoiseSample { average } => {
            state.noise.ingest_sample(average);
            true
        }

        ClientWsMessage::NoiseStop => {
            state.noise.stop();
            true
        }

        ClientWsMessage::NoiseError { message } => {
            // Capture failed in the browser (permission denied, no device).
            // The feature stays off; nothing here may crash.
            warn!(target: "noise", %message, "Client reported capture error");
            state.noise.stop();
            send_msg(socket, &ServerWsMessage::Error { message }).await
        }
    }
}
