use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::types::QuestionType;

/// One question as served to the taker: options already in display order,
/// correct answers stripped.
#[derive(Debug, Serialize)]
pub(crate) struct AttemptQuestionView {
    pub(crate) id: String,
    pub(crate) position: i32,
    pub(crate) content: String,
    pub(crate) question_type: QuestionType,
    pub(crate) options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) attempt_id: String,
    pub(crate) exam_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: String,
    pub(crate) deadline: String,
    pub(crate) time_limit_minutes: i32,
    pub(crate) questions: Vec<AttemptQuestionView>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    /// question id -> selected labels in display order ("A", "B", ...).
    pub(crate) answers: HashMap<String, Vec<String>>,
    /// Identity fields claimed by anonymous takers; ignored when the request
    /// is authenticated.
    #[serde(default)]
    #[serde(alias = "studentId")]
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "studentName")]
    pub(crate) student_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    pub(crate) score: f64,
    pub(crate) correct_answers: i32,
    pub(crate) total_questions: i32,
    pub(crate) attempt_number: i32,
}
