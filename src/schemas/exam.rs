use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Exam, ExamAssignment, ExamResult};

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_max_attempts() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "questionCount")]
    #[validate(range(min = 1, message = "question_count must be positive"))]
    pub(crate) question_count: i32,
    #[serde(alias = "timeLimitMinutes")]
    #[validate(range(min = 1, message = "time_limit_minutes must be positive"))]
    pub(crate) time_limit_minutes: i32,
    #[serde(alias = "startTime", with = "time::serde::rfc3339")]
    pub(crate) start_time: OffsetDateTime,
    #[serde(alias = "endTime", with = "time::serde::rfc3339")]
    pub(crate) end_time: OffsetDateTime,
    #[serde(default = "default_timezone")]
    pub(crate) timezone: String,
    #[serde(default = "default_true")]
    #[serde(alias = "shuffleQuestions")]
    pub(crate) shuffle_questions: bool,
    #[serde(default)]
    #[serde(alias = "shuffleAnswers")]
    pub(crate) shuffle_answers: bool,
    #[serde(default = "default_true")]
    #[serde(alias = "requireAllQuestions")]
    pub(crate) require_all_questions: bool,
    #[serde(default = "default_max_attempts")]
    #[serde(alias = "maxAttempts")]
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: i32,
    #[serde(default = "default_true")]
    #[serde(alias = "isActive")]
    pub(crate) is_active: bool,
    #[serde(default)]
    #[serde(alias = "isPublic")]
    pub(crate) is_public: bool,
    #[serde(default)]
    pub(crate) category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "questionCount")]
    #[validate(range(min = 1, message = "question_count must be positive"))]
    pub(crate) question_count: Option<i32>,
    #[serde(default)]
    #[serde(alias = "timeLimitMinutes")]
    #[validate(range(min = 1, message = "time_limit_minutes must be positive"))]
    pub(crate) time_limit_minutes: Option<i32>,
    #[serde(default)]
    #[serde(alias = "startTime", with = "time::serde::rfc3339::option")]
    pub(crate) start_time: Option<OffsetDateTime>,
    #[serde(default)]
    #[serde(alias = "endTime", with = "time::serde::rfc3339::option")]
    pub(crate) end_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub(crate) timezone: Option<String>,
    #[serde(default)]
    #[serde(alias = "shuffleQuestions")]
    pub(crate) shuffle_questions: Option<bool>,
    #[serde(default)]
    #[serde(alias = "shuffleAnswers")]
    pub(crate) shuffle_answers: Option<bool>,
    #[serde(default)]
    #[serde(alias = "requireAllQuestions")]
    pub(crate) require_all_questions: Option<bool>,
    #[serde(default)]
    #[serde(alias = "maxAttempts")]
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: Option<i32>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
    #[serde(default)]
    #[serde(alias = "isPublic")]
    pub(crate) is_public: Option<bool>,
    #[serde(default)]
    pub(crate) category: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) question_count: i32,
    pub(crate) time_limit_minutes: i32,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) timezone: String,
    pub(crate) shuffle_questions: bool,
    pub(crate) shuffle_answers: bool,
    pub(crate) require_all_questions: bool,
    pub(crate) max_attempts: i32,
    pub(crate) is_active: bool,
    pub(crate) is_public: bool,
    pub(crate) category: Option<String>,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            question_count: exam.question_count,
            time_limit_minutes: exam.time_limit_minutes,
            start_time: format_primitive(exam.start_time),
            end_time: format_primitive(exam.end_time),
            timezone: exam.timezone,
            shuffle_questions: exam.shuffle_questions,
            shuffle_answers: exam.shuffle_answers,
            require_all_questions: exam.require_all_questions,
            max_attempts: exam.max_attempts,
            is_active: exam.is_active,
            is_public: exam.is_public,
            category: exam.category,
            created_by: exam.created_by,
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamListResponse {
    pub(crate) items: Vec<ExamResponse>,
    pub(crate) total: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentCreate {
    #[serde(alias = "userId")]
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub(crate) user_id: String,
    #[serde(default)]
    #[serde(alias = "maxAttempts")]
    #[validate(range(min = 1, message = "max_attempts must be positive"))]
    pub(crate) max_attempts: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) user_id: String,
    pub(crate) max_attempts: Option<i32>,
    pub(crate) assigned_by: String,
    pub(crate) assigned_at: String,
}

impl AssignmentResponse {
    pub(crate) fn from_db(assignment: ExamAssignment) -> Self {
        Self {
            id: assignment.id,
            exam_id: assignment.exam_id,
            user_id: assignment.user_id,
            max_attempts: assignment.max_attempts,
            assigned_by: assignment.assigned_by,
            assigned_at: format_primitive(assignment.assigned_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: Option<String>,
    pub(crate) student_name: Option<String>,
    pub(crate) score: f64,
    pub(crate) total_questions: i32,
    pub(crate) correct_answers: i32,
    pub(crate) time_spent_seconds: i32,
    pub(crate) attempt_number: i32,
    pub(crate) completed_at: String,
}

impl ResultResponse {
    pub(crate) fn from_db(result: ExamResult) -> Self {
        Self {
            id: result.id,
            exam_id: result.exam_id,
            student_id: result.student_id,
            student_name: result.student_name,
            score: result.score,
            total_questions: result.total_questions,
            correct_answers: result.correct_answers,
            time_spent_seconds: result.time_spent_seconds,
            attempt_number: result.attempt_number,
            completed_at: format_primitive(result.completed_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultListResponse {
    pub(crate) items: Vec<ResultResponse>,
    pub(crate) total: i64,
}
