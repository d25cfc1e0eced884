//! Quiz session state machine.
//!
//! One `QuizSession` exists per active diagnostic: it tracks the category,
//! the student being evaluated, the current question, and the feedback for
//! the last answer. The WebSocket handler owns the session (`None` = IDLE)
//! and drives transitions:
//!
//!   IDLE -> LOADING (start) -> ready -> ANSWERED (submit) -> LOADING ...
//!
//! Auto-advance after the feedback window is scheduled by the handler; each
//! installed question bumps a generation counter, and a timer carrying a
//! stale generation (or firing after exit) is a no-op. That guarantees a
//! pending timer can never mutate a session that already ended.

use tracing::{debug, info, instrument};

use crate::config::QuizTuning;
use crate::domain::{DiagnosticCategory, Feedback, Question};

/// What a submitted answer produced. The caller applies `delta` to the
/// ledger; the session itself never touches the roster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerOutcome {
  pub feedback: Feedback,
  pub correct_index: usize,
  pub delta: i64,
}

#[derive(Debug)]
pub struct QuizSession {
  category: DiagnosticCategory,
  student_id: String,
  question: Option<Question>,
  feedback: Option<Feedback>,
  generation: u64,
}

impl QuizSession {
  /// Start a session in LOADING: no question yet, no feedback.
  pub fn new(category: DiagnosticCategory, student_id: String) -> Self {
    info!(target: "quiz", category = category.label(), student = %student_id, "Quiz session started");
    Self { category, student_id, question: None, feedback: None, generation: 0 }
  }

  pub fn category(&self) -> DiagnosticCategory {
    self.category
  }

  pub fn student_id(&self) -> &str {
    &self.student_id
  }

  pub fn question(&self) -> Option<&Question> {
    self.question.as_ref()
  }

  /// True while a question is requested but not yet shown.
  pub fn is_loading(&self) -> bool {
    self.question.is_none()
  }

  /// Generation of the current question; advance timers carry this value.
  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Install the next question: clears feedback, unlocks input, bumps the
  /// generation so any previously scheduled advance becomes stale.
  #[instrument(level = "debug", skip(self, question), fields(id = %question.id))]
  pub fn install_question(&mut self, question: Question) {
    debug_assert!(question.correct_index < question.options.len());
    self.question = Some(question);
    self.feedback = None;
    self.generation += 1;
  }

  /// Return to LOADING while the next question is being produced.
  pub fn begin_loading(&mut self) {
    self.question = None;
    self.feedback = None;
  }

  /// Submit an answer. Returns None (a no-op) when no question is loaded or
  /// feedback is already set, which prevents double-scoring the same turn.
  #[instrument(level = "debug", skip(self, tuning))]
  pub fn submit_answer(&mut self, option_index: usize, tuning: &QuizTuning) -> Option<AnswerOutcome> {
    let question = self.question.as_ref()?;
    if self.feedback.is_some() {
      debug!(target: "quiz", "Duplicate submission ignored");
      return None;
    }

    let correct = option_index == question.correct_index;
    let (feedback, delta) = if correct {
      (Feedback::Correct, tuning.correct_points)
    } else {
      (Feedback::Wrong, tuning.wrong_points)
    };
    self.feedback = Some(feedback);
    info!(target: "quiz", question = %question.id, student = %self.student_id, correct, delta, "Answer evaluated");

    Some(AnswerOutcome { feedback, correct_index: question.correct_index, delta })
  }

  /// Whether an auto-advance timer created for `generation` is still the
  /// active one. False means the timer is stale and must do nothing.
  pub fn advance_is_current(&self, generation: u64) -> bool {
    self.generation == generation && self.feedback.is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuestionSource;
  use crate::roster::Roster;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn tuning() -> QuizTuning {
    QuizTuning::default()
  }

  fn fixed_question(correct_index: usize) -> Question {
    Question {
      id: "q1".into(),
      text: "Resuelve: 2 + (2)".into(),
      options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
      correct_index,
      category: DiagnosticCategory::Integers,
      fraction_data: None,
      source: QuestionSource::Local,
    }
  }

  fn ana() -> (Roster, String) {
    let mut roster = Roster::new();
    let mut rng = StdRng::seed_from_u64(1);
    let id = roster.add_student("Ana", &mut rng).unwrap().id.clone();
    (roster, id)
  }

  #[test]
  fn correct_then_wrong_scores_ten_then_minus_two() {
    let (mut roster, ana) = ana();
    let mut session = QuizSession::new(DiagnosticCategory::Integers, ana.clone());

    session.install_question(fixed_question(1));
    let outcome = session.submit_answer(1, &tuning()).unwrap();
    assert_eq!(outcome.feedback, Feedback::Correct);
    roster.adjust_score(&[ana.clone()], outcome.delta);
    assert_eq!(roster.get(&ana).unwrap().score, 10);

    session.install_question(fixed_question(2));
    let outcome = session.submit_answer(0, &tuning()).unwrap();
    assert_eq!(outcome.feedback, Feedback::Wrong);
    roster.adjust_score(&[ana.clone()], outcome.delta);
    assert_eq!(roster.get(&ana).unwrap().score, 8);
  }

  #[test]
  fn second_submission_is_a_no_op() {
    let (_, ana) = ana();
    let mut session = QuizSession::new(DiagnosticCategory::Integers, ana);
    session.install_question(fixed_question(0));
    assert!(session.submit_answer(0, &tuning()).is_some());
    assert!(session.submit_answer(0, &tuning()).is_none());
    assert!(session.submit_answer(3, &tuning()).is_none());
  }

  #[test]
  fn submission_while_loading_is_a_no_op() {
    let (_, ana) = ana();
    let mut session = QuizSession::new(DiagnosticCategory::Fractions, ana);
    assert!(session.is_loading());
    assert!(session.submit_answer(0, &tuning()).is_none());
  }

  #[test]
  fn stale_advance_generations_are_rejected() {
    let (_, ana) = ana();
    let mut session = QuizSession::new(DiagnosticCategory::Integers, ana);
    session.install_question(fixed_question(0));
    session.submit_answer(0, &tuning());
    let gen = session.generation();
    assert!(session.advance_is_current(gen));

    // Next question installed before the timer fires: old timer is stale.
    session.install_question(fixed_question(1));
    assert!(!session.advance_is_current(gen));
  }

  #[test]
  fn advance_requires_an_answered_question() {
    let (_, ana) = ana();
    let mut session = QuizSession::new(DiagnosticCategory::Integers, ana);
    session.install_question(fixed_question(0));
    // No answer submitted yet: nothing to advance from.
    assert!(!session.advance_is_current(session.generation()));
  }

  #[test]
  fn outcome_reveals_the_correct_option() {
    let (_, ana) = ana();
    let mut session = QuizSession::new(DiagnosticCategory::Integers, ana);
    session.install_question(fixed_question(2));
    let outcome = session.submit_answer(0, &tuning()).unwrap();
    assert_eq!(outcome.correct_index, 2);
  }

  #[test]
  fn install_clears_previous_feedback() {
    let (_, ana) = ana();
    let mut session = QuizSession::new(DiagnosticCategory::Integers, ana);
    session.install_question(fixed_question(0));
    session.submit_answer(0, &tuning());
    session.install_question(fixed_question(1));
    // Input unlocked again for the new question.
    assert!(session.submit_answer(1, &tuning()).is_some());
  }
}
