//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{DiagnosticCategory, Feedback, Question, Student};
use crate::noise::NoiseStatus;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    AddStudent {
        name: String,
    },
    AdjustScore {
        #[serde(rename = "studentIds")]
        student_ids: Vec<String>,
        points: i64,
    },
    StartQuiz {
        category: DiagnosticCategory,
        #[serde(rename = "studentId")]
        student_id: String,
    },
    SubmitAnswer {
        #[serde(rename = "optionIndex")]
        option_index: usize,
    },
    ExitQuiz,
    ExportSession,
    ImportSession {
        data: String,
    },
    SetSensitivity {
        value: u8,
    },
    NoiseSample {
        /// Raw analyser average in 0..255 as sampled by the browser.
        average: f32,
    },
    NoiseStop,
    /// Client-side capture failure (permission denied, no device).
    NoiseError {
        message: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    /// Leaderboard snapshot, score descending.
    Roster {
        students: Vec<Student>,
    },
    Question {
        question: Question,
    },
    AnswerResult {
        feedback: Feedback,
        #[serde(rename = "correctIndex")]
        correct_index: usize,
        delta: i64,
        #[serde(rename = "newScore")]
        new_score: i64,
    },
    SessionData {
        data: String,
    },
    SessionLoaded {
        count: usize,
    },
    NoiseStatus {
        status: NoiseStatus,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct QuestionQuery {
    pub category: Option<DiagnosticCategory>,
}

#[derive(Debug, Deserialize)]
pub struct AddStudentIn {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjustScoreIn {
    #[serde(rename = "studentIds")]
    pub student_ids: Vec<String>,
    pub points: i64,
}

#[derive(Serialize)]
pub struct RosterOut {
    pub students: Vec<Student>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct ImportSessionIn {
    pub data: String,
}

#[derive(Serialize)]
pub struct ImportSessionOut {
    pub count: usize,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
