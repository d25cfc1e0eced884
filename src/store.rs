//! Session store: manual JSON export/import of the roster.
//!
//! The session file is a JSON array of student records
//! `{id, name, avatarSeed, score, badges}`. Import only succeeds when the
//! top-level value is an array and every record deserializes; on any error
//! the caller keeps its existing roster.

use std::fmt;

use serde_json::Value;

use crate::domain::Student;
use crate::roster::Roster;

#[derive(Debug, PartialEq, Eq)]
pub enum StoreError {
  /// The document is not parseable JSON at all.
  Parse(String),
  /// Parsed fine, but the top-level value is not an array.
  NotAList,
  /// The array contains a record missing required fields.
  BadRecord(String),
}

impl fmt::Display for StoreError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StoreError::Parse(e) => write!(f, "El archivo no es JSON válido: {}", e),
      StoreError::NotAList => write!(f, "El archivo no tiene el formato correcto."),
      StoreError::BadRecord(e) => write!(f, "Registro de estudiante inválido: {}", e),
    }
  }
}

/// Serialize the roster to a pretty JSON document for download.
pub fn save_roster(roster: &Roster) -> Result<String, String> {
  serde_json::to_string_pretty(roster.students()).map_err(|e| e.to_string())
}

/// Parse a session document back into a student list.
/// Field-by-field validation: `id`, `name`, `avatarSeed`, `score` are
/// required; `badges` defaults to empty.
pub fn load_roster(document: &str) -> Result<Vec<Student>, StoreError> {
  let value: Value = serde_json::from_str(document).map_err(|e| StoreError::Parse(e.to_string()))?;
  if !value.is_array() {
    return Err(StoreError::NotAList);
  }
  serde_json::from_value::<Vec<Student>>(value).map_err(|e| StoreError::BadRecord(e.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn sample_roster() -> Roster {
    let mut roster = Roster::new();
    let mut rng = StdRng::seed_from_u64(5);
    let ana = roster.add_student("Ana", &mut rng).unwrap().id.clone();
    roster.add_student("Luis", &mut rng);
    roster.adjust_score(&[ana], 12);
    roster
  }

  #[test]
  fn roundtrip_preserves_every_field() {
    let roster = sample_roster();
    let doc = save_roster(&roster).unwrap();
    let loaded = load_roster(&doc).unwrap();
    assert_eq!(loaded, roster.students());
  }

  #[test]
  fn import_accepts_the_documented_record_shape() {
    let doc = r#"[{"id":"x","name":"Bob","avatarSeed":"bg-red-400","score":7,"badges":[]}]"#;
    let students = load_roster(doc).unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].name, "Bob");
    assert_eq!(students[0].score, 7);
  }

  #[test]
  fn missing_badges_default_to_empty() {
    let doc = r#"[{"id":"x","name":"Bob","avatarSeed":"bg-red-400","score":7}]"#;
    let students = load_roster(doc).unwrap();
    assert!(students[0].badges.is_empty());
  }

  #[test]
  fn non_array_documents_are_rejected() {
    assert_eq!(load_roster(r#"{"name":"Bob"}"#), Err(StoreError::NotAList));
    assert_eq!(load_roster("42"), Err(StoreError::NotAList));
  }

  #[test]
  fn malformed_text_is_rejected() {
    assert!(matches!(load_roster("not json at all"), Err(StoreError::Parse(_))));
  }

  #[test]
  fn records_missing_required_fields_are_rejected() {
    let doc = r#"[{"id":"x","score":7}]"#;
    assert!(matches!(load_roster(doc), Err(StoreError::BadRecord(_))));
  }
}
