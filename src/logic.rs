//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Producing the next question for a category (local generators, with the
//!     remote provider + integer fallback for theory)
//!   - Session export/import against the shared roster

use tracing::{error, info, instrument, warn};

use crate::domain::{DiagnosticCategory, Question};
use crate::generator::{fraction_question, integer_question};
use crate::state::AppState;
use crate::store::{load_roster, save_roster, StoreError};

/// Produce a question for the category.
///
/// Local generators cannot fail. The theory path delegates to OpenAI and, on
/// any failure or when the client is absent, substitutes a local integer
/// question so the learner is never stuck in LOADING.
#[instrument(level = "info", skip(state))]
pub async fn next_question(state: &AppState, category: DiagnosticCategory) -> Question {
  match category {
    DiagnosticCategory::Integers => state.with_rng(integer_question),
    DiagnosticCategory::Fractions => state.with_rng(fraction_question),
    DiagnosticCategory::Theory => {
      if let Some(oa) = &state.openai {
        match oa.generate_theory_question(&state.prompts).await {
          Ok(q) => {
            info!(target: "quiz", id = %q.id, "Theory question served from OpenAI");
            return q;
          }
          Err(e) => {
            error!(target: "quiz", error = %e, "Theory generation failed; falling back to integer question");
          }
        }
      } else {
        warn!(target: "quiz", "No OpenAI client; theory request served with integer fallback");
      }
      state.with_rng(integer_question)
    }
  }
}

/// Serialize the current roster for download.
#[instrument(level = "info", skip(state))]
pub async fn export_session(state: &AppState) -> Result<String, String> {
  let roster = state.roster.read().await;
  let doc = save_roster(&roster)?;
  info!(target: "roster", students = roster.len(), bytes = doc.len(), "Session exported");
  Ok(doc)
}

/// Parse and install an uploaded session document.
/// On any error the existing roster is left untouched.
#[instrument(level = "info", skip(state, document), fields(bytes = document.len()))]
pub async fn import_session(state: &AppState, document: &str) -> Result<usize, StoreError> {
  let students = load_roster(document)?;
  let count = students.len();
  let mut roster = state.roster.write().await;
  roster.replace(students);
  info!(target: "roster", count, "Session imported; roster replaced");
  Ok(count)
}
