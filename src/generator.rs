//! Local question generators for the integer and fraction diagnostics.
//!
//! Both generators are pure over an injected `rand::Rng`, so tests can drive
//! them with a seeded `StdRng` and check the invariants that matter:
//! exactly one option equals the true answer, all 4 options are distinct,
//! and `correct_index` locates the answer after shuffling.

use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::domain::{DiagnosticCategory, FractionPart, Question, QuestionSource};

/// Bound on distractor retries. The offset space around the answer always has
/// more than 3 distinct values, so the loop terminates long before this.
const MAX_DISTRACTOR_TRIES: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operator {
  Add,
  Sub,
  Mul,
  Div,
}

const OPERATORS: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

impl Operator {
  fn symbol(&self) -> &'static str {
    match self {
      Operator::Add => "+",
      Operator::Sub => "-",
      Operator::Mul => "×",
      Operator::Div => "÷",
    }
  }
}

/// Pick operands for the given operator. Division regenerates the pair so the
/// quotient is an exact integer: nonzero divisor, dividend = divisor * k with
/// k in [-5, 4].
fn pick_operands<R: Rng>(rng: &mut R, op: Operator) -> (i64, i64) {
  let a = rng.gen_range(-10..=10);
  let b = rng.gen_range(-10..=10);
  if op == Operator::Div {
    let divisor = if b == 0 { 1 } else { b };
    let dividend = divisor * rng.gen_range(-5..5);
    (dividend, divisor)
  } else {
    (a, b)
  }
}

fn apply(op: Operator, a: i64, b: i64) -> i64 {
  match op {
    Operator::Add => a + b,
    Operator::Sub => a - b,
    Operator::Mul => a * b,
    Operator::Div => a / b,
  }
}

/// Build 4 distinct numeric options around `answer` (offsets in [-5, 5]),
/// shuffled. Returns the options and the answer's index.
fn numeric_options<R: Rng>(rng: &mut R, answer: i64) -> (Vec<i64>, usize) {
  let mut options = vec![answer];
  let mut tries = 0;
  while options.len() < 4 && tries < MAX_DISTRACTOR_TRIES {
    tries += 1;
    let candidate = answer + rng.gen_range(-5..=5);
    if !options.contains(&candidate) {
      options.push(candidate);
    }
  }
  // Unreachable in practice; keeps the loop provably bounded.
  let mut fill = answer + 6;
  while options.len() < 4 {
    if !options.contains(&fill) {
      options.push(fill);
    }
    fill += 1;
  }
  options.shuffle(rng);
  let correct_index = options.iter().position(|&o| o == answer).unwrap_or(0);
  (options, correct_index)
}

/// Generate an integer-arithmetic question ("Resuelve: a op (b)").
pub fn integer_question<R: Rng>(rng: &mut R) -> Question {
  let op = *OPERATORS.choose(rng).unwrap_or(&Operator::Add);
  let (a, b) = pick_operands(rng, op);
  let answer = apply(op, a, b);
  let (options, correct_index) = numeric_options(rng, answer);

  Question {
    id: Uuid::new_v4().to_string(),
    text: format!("Resuelve: {} {} ({})", a, op.symbol(), b),
    options: options.iter().map(|o| o.to_string()).collect(),
    correct_index,
    category: DiagnosticCategory::Integers,
    fraction_data: None,
    source: QuestionSource::Local,
  }
}

fn frac(num: u32, den: u32) -> String {
  format!("{}/{}", num, den)
}

/// Dedupe candidate fraction strings against the correct one, keeping the
/// first 3 distinct distractors, then shuffle everything. Candidate lists are
/// long enough that 3 distinct distractors always exist.
fn fraction_options<R: Rng>(rng: &mut R, correct: &str, candidates: &[String]) -> (Vec<String>, usize) {
  let mut options = vec![correct.to_string()];
  for c in candidates {
    if options.len() >= 4 {
      break;
    }
    if !options.contains(c) {
      options.push(c.clone());
    }
  }
  options.shuffle(rng);
  let correct_index = options.iter().position(|o| o == correct).unwrap_or(0);
  (options, correct_index)
}

/// Generate a fraction question: 50/50 graphical identification or
/// same-denominator addition. The numerator-1 distractor is floored at 1 so
/// we never present degenerate zero/negative fractions.
pub fn fraction_question<R: Rng>(rng: &mut R) -> Question {
  let graphical = rng.gen_bool(0.5);

  if graphical {
    let num = rng.gen_range(1..=5u32);
    let den = num + rng.gen_range(1..=4u32);
    let correct = frac(num, den);
    let candidates = [
      frac(den, num),
      frac(num, den + 1),
      frac(num.saturating_sub(1).max(1), den),
      frac(num + 1, den),
      frac(num, den + 2),
    ];
    let (options, correct_index) = fraction_options(rng, &correct, &candidates);

    Question {
      id: Uuid::new_v4().to_string(),
      text: "¿Qué fracción representa la siguiente gráfica?".into(),
      options,
      correct_index,
      category: DiagnosticCategory::Fractions,
      fraction_data: Some(vec![FractionPart { numerator: num, denominator: den }]),
      source: QuestionSource::Local,
    }
  } else {
    // Same-denominator addition; numerators sum below the denominator.
    let den = rng.gen_range(2..=6u32);
    let n1 = rng.gen_range(0..den);
    let n2 = rng.gen_range(0..(den - n1));
    let sum = n1 + n2;
    let correct = frac(sum, den);
    let candidates = [
      frac(sum + 1, den),
      frac(sum.saturating_sub(1).max(1), den),
      frac(sum, den + 1),
      frac(sum + 2, den),
      frac(sum, den + 2),
    ];
    let (options, correct_index) = fraction_options(rng, &correct, &candidates);

    Question {
      id: Uuid::new_v4().to_string(),
      text: format!("Resuelve: {}/{} + {}/{}", n1, den, n2, den),
      options,
      correct_index,
      category: DiagnosticCategory::Fractions,
      fraction_data: None,
      source: QuestionSource::Local,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;
  use std::collections::HashSet;

  fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
  }

  /// Parse "Resuelve: a op (b)" back into its parts.
  fn parse_integer_text(text: &str) -> (i64, char, i64) {
    let rest = text.strip_prefix("Resuelve: ").unwrap();
    let open = rest.find('(').unwrap();
    let b: i64 = rest[open + 1..rest.len() - 1].parse().unwrap();
    let head = rest[..open].trim();
    let op = head.chars().last().unwrap();
    let a: i64 = head[..head.len() - op.len_utf8()].trim().parse().unwrap();
    (a, op, b)
  }

  #[test]
  fn integer_question_invariants_hold_across_runs() {
    let mut rng = seeded(7);
    for _ in 0..500 {
      let q = integer_question(&mut rng);
      assert_eq!(q.options.len(), 4);
      assert!(q.correct_index < 4);

      let distinct: HashSet<&String> = q.options.iter().collect();
      assert_eq!(distinct.len(), 4, "options must be pairwise distinct: {:?}", q.options);

      let (a, op, b) = parse_integer_text(&q.text);
      let answer = match op {
        '+' => a + b,
        '-' => a - b,
        '×' => a * b,
        '÷' => a / b,
        other => panic!("unexpected operator {other}"),
      };
      assert_eq!(q.options[q.correct_index], answer.to_string());
      let matching = q.options.iter().filter(|o| **o == answer.to_string()).count();
      assert_eq!(matching, 1, "exactly one option equals the answer");
    }
  }

  #[test]
  fn division_is_always_exact() {
    let mut rng = seeded(11);
    for _ in 0..2000 {
      let q = integer_question(&mut rng);
      let (a, op, b) = parse_integer_text(&q.text);
      if op == '÷' {
        assert_ne!(b, 0);
        assert_eq!(a % b, 0, "division must have no remainder: {} ÷ {}", a, b);
      }
    }
  }

  #[test]
  fn operands_stay_in_range() {
    let mut rng = seeded(3);
    for _ in 0..1000 {
      let q = integer_question(&mut rng);
      let (a, op, b) = parse_integer_text(&q.text);
      if op == '÷' {
        assert!((-10..=10).contains(&b));
        assert!((-50..=50).contains(&a));
      } else {
        assert!((-10..=10).contains(&a));
        assert!((-10..=10).contains(&b));
      }
    }
  }

  #[test]
  fn fraction_question_invariants_hold_across_runs() {
    let mut rng = seeded(21);
    for _ in 0..500 {
      let q = fraction_question(&mut rng);
      assert_eq!(q.options.len(), 4);
      assert!(q.correct_index < 4);

      let distinct: HashSet<&String> = q.options.iter().collect();
      assert_eq!(distinct.len(), 4, "options must be pairwise distinct: {:?}", q.options);

      let correct = &q.options[q.correct_index];
      let matching = q.options.iter().filter(|o| o == &correct).count();
      assert_eq!(matching, 1);

      if let Some(parts) = &q.fraction_data {
        // Graphical variant: the drawn fraction is the correct option.
        assert_eq!(parts.len(), 1);
        let p = &parts[0];
        assert!(p.numerator >= 1 && p.numerator <= 5);
        assert!(p.denominator > p.numerator);
        assert_eq!(*correct, format!("{}/{}", p.numerator, p.denominator));
      } else {
        // Addition variant: recompute the sum from the text.
        let rest = q.text.strip_prefix("Resuelve: ").unwrap();
        let mut parts = rest.split(" + ");
        let (n1, den) = {
          let mut it = parts.next().unwrap().split('/');
          (it.next().unwrap().parse::<u32>().unwrap(), it.next().unwrap().parse::<u32>().unwrap())
        };
        let n2 = parts.next().unwrap().split('/').next().unwrap().parse::<u32>().unwrap();
        assert!(n1 + n2 < den, "numerators must sum below the denominator");
        assert_eq!(*correct, format!("{}/{}", n1 + n2, den));
      }
    }
  }

  #[test]
  fn fraction_distractors_never_degenerate() {
    let mut rng = seeded(99);
    for _ in 0..1000 {
      let q = fraction_question(&mut rng);
      for (i, opt) in q.options.iter().enumerate() {
        if i == q.correct_index {
          continue;
        }
        let mut it = opt.split('/');
        let num: i64 = it.next().unwrap().parse().unwrap();
        let den: i64 = it.next().unwrap().parse().unwrap();
        assert!(num >= 1 || q.fraction_data.is_none(), "graphical distractors stay positive");
        assert!(den >= 1);
      }
    }
  }
}
