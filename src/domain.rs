//! Domain models shared by the backend: students, questions, diagnostic categories.

use serde::{Deserialize, Serialize};

/// The three diagnostic topics offered to seventh graders.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCategory {
  Integers,
  Fractions,
  Theory,
}

impl DiagnosticCategory {
  /// Display label as shown on the classroom screen (Spanish).
  pub fn label(&self) -> &'static str {
    match self {
      DiagnosticCategory::Integers => "Enteros",
      DiagnosticCategory::Fractions => "Fracciones",
      DiagnosticCategory::Theory => "Teoría y Conceptos",
    }
  }
}

/// Where a question came from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
  Local,  // deterministic generators
  Remote, // OpenAI theory generation
}

/// Numerator/denominator pair rendered as a pie chart by the client.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FractionPart {
  pub numerator: u32,
  pub denominator: u32,
}

/// A multiple-choice question. Created fresh per quiz turn, discarded after
/// the feedback window elapses; never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub text: String,
  /// Exactly 4 answer options; `correct_index` always points into this list.
  pub options: Vec<String>,
  #[serde(rename = "correctIndex")]
  pub correct_index: usize,
  pub category: DiagnosticCategory,
  /// Present only for graphical fraction questions.
  #[serde(rename = "fractionData", default, skip_serializing_if = "Option::is_none")]
  pub fraction_data: Option<Vec<FractionPart>>,
  pub source: QuestionSource,
}

/// A registered student. Mutated only through score adjustments; replaced
/// wholesale on session import.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Student {
  pub id: String,
  pub name: String,
  /// Palette class used by the client to render a stable avatar color.
  #[serde(rename = "avatarSeed")]
  pub avatar_seed: String,
  pub score: i64,
  #[serde(default)]
  pub badges: Vec<String>,
}

/// Outcome of the last answered question within a quiz session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
  Correct,
  Wrong,
}
