//! The scoring ledger: roster of students and point-adjustment operations.
//!
//! A `Roster` owns the full student list. A student's score is only ever the
//! sum of the adjustments applied to it; nothing recomputes scores from
//! elsewhere. The whole roster is replaced on session import.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::Student;

/// Fixed avatar palette; a color is chosen at creation and stable thereafter.
pub const AVATAR_COLORS: [&str; 17] = [
  "bg-red-400", "bg-orange-400", "bg-amber-400", "bg-yellow-400",
  "bg-lime-400", "bg-green-400", "bg-emerald-400", "bg-teal-400",
  "bg-cyan-400", "bg-sky-400", "bg-blue-400", "bg-indigo-400",
  "bg-violet-400", "bg-purple-400", "bg-fuchsia-400", "bg-pink-400", "bg-rose-400",
];

#[derive(Clone, Debug, Default)]
pub struct Roster {
  students: Vec<Student>,
}

impl Roster {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a new student with score 0 and a random palette color.
  /// Blank or whitespace-only names are a no-op and return None.
  #[instrument(level = "debug", skip(self, rng))]
  pub fn add_student<R: Rng>(&mut self, name: &str, rng: &mut R) -> Option<&Student> {
    let name = name.trim();
    if name.is_empty() {
      debug!(target: "roster", "Ignoring blank student name");
      return None;
    }
    let avatar_seed = AVATAR_COLORS.choose(rng).copied().unwrap_or("bg-indigo-400");
    let student = Student {
      id: Uuid::new_v4().to_string(),
      name: name.to_string(),
      avatar_seed: avatar_seed.to_string(),
      score: 0,
      badges: Vec::new(),
    };
    info!(target: "roster", id = %student.id, name = %student.name, "Student registered");
    self.students.push(student);
    self.students.last()
  }

  /// Add `delta` to the score of every student whose id is listed.
  /// Ids not present in the roster are silently ignored; no lower bound.
  #[instrument(level = "debug", skip(self), fields(ids = ids.len(), delta))]
  pub fn adjust_score(&mut self, ids: &[String], delta: i64) {
    let mut touched = 0usize;
    for s in &mut self.students {
      if ids.iter().any(|id| id == &s.id) {
        s.score += delta;
        touched += 1;
      }
    }
    if touched < ids.len() {
      warn!(target: "roster", requested = ids.len(), touched, "Some adjusted ids were not in the roster");
    }
    info!(target: "roster", touched, delta, "Score adjustment applied");
  }

  /// Replace the entire roster (session import).
  #[instrument(level = "info", skip(self, students), fields(count = students.len()))]
  pub fn replace(&mut self, students: Vec<Student>) {
    self.students = students;
  }

  pub fn students(&self) -> &[Student] {
    &self.students
  }

  pub fn get(&self, id: &str) -> Option<&Student> {
    self.students.iter().find(|s| s.id == id)
  }

  pub fn len(&self) -> usize {
    self.students.len()
  }

  pub fn is_empty(&self) -> bool {
    self.students.is_empty()
  }

  /// Leaderboard view: score descending, ties stable by insertion order.
  pub fn leaderboard(&self) -> Vec<Student> {
    let mut sorted = self.students.clone();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));
    sorted
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
  }

  #[test]
  fn blank_names_are_ignored() {
    let mut roster = Roster::new();
    let mut rng = rng();
    assert!(roster.add_student("", &mut rng).is_none());
    assert!(roster.add_student("   ", &mut rng).is_none());
    assert!(roster.is_empty());
  }

  #[test]
  fn new_students_start_at_zero_with_palette_color() {
    let mut roster = Roster::new();
    let mut rng = rng();
    let id = roster.add_student("Ana", &mut rng).unwrap().id.clone();
    let ana = roster.get(&id).unwrap();
    assert_eq!(ana.score, 0);
    assert!(ana.badges.is_empty());
    assert!(AVATAR_COLORS.contains(&ana.avatar_seed.as_str()));
  }

  #[test]
  fn adjustments_are_additive_and_commutative() {
    let mut rng = rng();
    let mut a = Roster::new();
    let id = a.add_student("Ana", &mut rng).unwrap().id.clone();
    a.adjust_score(&[id.clone()], 10);
    a.adjust_score(&[id.clone()], -2);

    let mut b = Roster::new();
    let id_b = b.add_student("Ana", &mut rng).unwrap().id.clone();
    b.adjust_score(&[id_b.clone()], -2);
    b.adjust_score(&[id_b.clone()], 10);

    assert_eq!(a.get(&id).unwrap().score, 8);
    assert_eq!(b.get(&id_b).unwrap().score, 8);
  }

  #[test]
  fn unknown_ids_leave_scores_unchanged() {
    let mut roster = Roster::new();
    let mut rng = rng();
    let id = roster.add_student("Ana", &mut rng).unwrap().id.clone();
    roster.adjust_score(&["nope".to_string()], 50);
    assert_eq!(roster.get(&id).unwrap().score, 0);
  }

  #[test]
  fn batch_adjustment_hits_every_listed_student() {
    let mut roster = Roster::new();
    let mut rng = rng();
    let a = roster.add_student("A", &mut rng).unwrap().id.clone();
    let b = roster.add_student("B", &mut rng).unwrap().id.clone();
    roster.adjust_score(&[b.clone()], 3);
    roster.adjust_score(&[a.clone(), b.clone()], 5);
    assert_eq!(roster.get(&a).unwrap().score, 5);
    assert_eq!(roster.get(&b).unwrap().score, 8);
  }

  #[test]
  fn scores_may_go_negative() {
    let mut roster = Roster::new();
    let mut rng = rng();
    let id = roster.add_student("Ana", &mut rng).unwrap().id.clone();
    roster.adjust_score(&[id.clone()], -2);
    roster.adjust_score(&[id.clone()], -2);
    assert_eq!(roster.get(&id).unwrap().score, -4);
  }

  #[test]
  fn leaderboard_sorts_descending_with_stable_ties() {
    let mut roster = Roster::new();
    let mut rng = rng();
    let a = roster.add_student("A", &mut rng).unwrap().id.clone();
    let b = roster.add_student("B", &mut rng).unwrap().id.clone();
    let c = roster.add_student("C", &mut rng).unwrap().id.clone();
    roster.adjust_score(&[b.clone()], 7);
    // A and C tie at 0: insertion order preserved.
    let board = roster.leaderboard();
    assert_eq!(board[0].id, b);
    assert_eq!(board[1].id, a);
    assert_eq!(board[2].id, c);
  }
}
