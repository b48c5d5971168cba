use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Question;
use crate::db::types::QuestionType;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
    #[serde(alias = "questionType")]
    pub(crate) question_type: QuestionType,
    #[validate(length(min = 2, message = "at least two options are required"))]
    pub(crate) options: Vec<String>,
    #[serde(alias = "correctOptions")]
    #[validate(length(min = 1, message = "at least one correct option is required"))]
    pub(crate) correct_options: Vec<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
}

/// Administrative view of a bank entry; takers never see this shape, their
/// attempt payload strips the correct options.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) content: String,
    pub(crate) question_type: QuestionType,
    pub(crate) options: Vec<String>,
    pub(crate) correct_options: Vec<String>,
    pub(crate) category: Option<String>,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            content: question.content,
            question_type: question.question_type,
            options: question.options.0,
            correct_options: question.correct_options.0,
            category: question.category,
            created_by: question.created_by,
            created_at: format_primitive(question.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionListResponse {
    pub(crate) items: Vec<QuestionResponse>,
}
