use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{AttemptStatus, OverrideType, QuestionType, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) question_count: i32,
    pub(crate) time_limit_minutes: i32,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) timezone: String,
    pub(crate) shuffle_questions: bool,
    pub(crate) shuffle_answers: bool,
    pub(crate) require_all_questions: bool,
    pub(crate) max_attempts: i32,
    pub(crate) is_active: bool,
    pub(crate) is_public: bool,
    pub(crate) category: Option<String>,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) content: String,
    pub(crate) question_type: QuestionType,
    pub(crate) options: Json<Vec<String>>,
    pub(crate) correct_options: Json<Vec<String>>,
    pub(crate) category: Option<String>,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamAssignment {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) user_id: String,
    pub(crate) max_attempts: Option<i32>,
    pub(crate) assigned_by: String,
    pub(crate) assigned_at: PrimitiveDateTime,
}

/// One taker's pass through an exam. Owns its question snapshot
/// (`attempt_questions`), so concurrent takers never share sampler output.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamAttempt {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: Option<String>,
    pub(crate) student_name: Option<String>,
    pub(crate) sample_seed: i64,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) deadline: PrimitiveDateTime,
    pub(crate) status: AttemptStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AttemptQuestion {
    pub(crate) attempt_id: String,
    pub(crate) question_id: String,
    pub(crate) position: i32,
    pub(crate) option_order: Json<Vec<i32>>,
}

/// The attempt ledger. `student_id` is free text: depending on how the
/// taker authenticated it holds a user id, a username, or nothing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamResult {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: Option<String>,
    pub(crate) student_name: Option<String>,
    pub(crate) score: f64,
    pub(crate) total_questions: i32,
    pub(crate) correct_answers: i32,
    pub(crate) time_spent_seconds: i32,
    pub(crate) attempt_number: i32,
    pub(crate) completed_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Permission {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct UserPermission {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) permission_code: String,
    pub(crate) override_type: OverrideType,
    pub(crate) reason: Option<String>,
    pub(crate) granted_by: String,
    pub(crate) created_at: PrimitiveDateTime,
}
