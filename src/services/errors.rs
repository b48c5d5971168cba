use thiserror::Error;
use time::PrimitiveDateTime;

use crate::core::time::format_in_zone;

/// Terminal outcomes of the attempt pipeline and the admin gates. Each kind
/// is stable and carries what the caller needs to render a precise message;
/// none of them is retryable. Store failures travel separately as
/// `sqlx::Error`.
#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum AttemptError {
    #[error("exam not found")]
    ExamNotFound,
    #[error("exam is disabled")]
    ExamDisabled,
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("exam is not assigned to this user")]
    NotAssigned,
    #[error("exam is not open yet")]
    NotYetOpen { now: PrimitiveDateTime, opens_at: PrimitiveDateTime, timezone: String },
    #[error("exam is closed")]
    Closed { now: PrimitiveDateTime, closed_at: PrimitiveDateTime, timezone: String },
    #[error("attempt limit reached")]
    AttemptLimitReached { count: i64, ceiling: i32 },
    #[error("question bank too small")]
    InsufficientBank { available: usize, required: usize },
    #[error("not authorized")]
    PermissionDenied,
}

impl AttemptError {
    pub(crate) fn code(&self) -> &'static str {
        match self {
            AttemptError::ExamNotFound => "exam_not_found",
            AttemptError::ExamDisabled => "exam_disabled",
            AttemptError::AuthenticationRequired => "authentication_required",
            AttemptError::NotAssigned => "not_assigned",
            AttemptError::NotYetOpen { .. } => "not_yet_open",
            AttemptError::Closed { .. } => "closed",
            AttemptError::AttemptLimitReached { .. } => "attempt_limit_reached",
            AttemptError::InsufficientBank { .. } => "insufficient_bank",
            AttemptError::PermissionDenied => "permission_denied",
        }
    }

    /// User-facing message. Window kinds render both the current time and
    /// the boundary in the exam's display timezone so takers can
    /// self-diagnose.
    pub(crate) fn detail(&self) -> String {
        match self {
            AttemptError::ExamNotFound => "Exam not found".to_string(),
            AttemptError::ExamDisabled => "Exam is currently disabled".to_string(),
            AttemptError::AuthenticationRequired => {
                "Authentication is required to take this exam".to_string()
            }
            AttemptError::NotAssigned => "This exam has not been assigned to you".to_string(),
            AttemptError::NotYetOpen { now, opens_at, timezone } => format!(
                "Exam is not open yet: it opens at {} (current time {})",
                format_in_zone(*opens_at, timezone),
                format_in_zone(*now, timezone)
            ),
            AttemptError::Closed { now, closed_at, timezone } => format!(
                "Exam closed at {} (current time {})",
                format_in_zone(*closed_at, timezone),
                format_in_zone(*now, timezone)
            ),
            AttemptError::AttemptLimitReached { count, ceiling } => {
                format!("Maximum attempts reached: {count} of {ceiling} used")
            }
            AttemptError::InsufficientBank { available, required } => format!(
                "Question bank has {available} questions but the exam draws {required}"
            ),
            AttemptError::PermissionDenied => "Not authorized".to_string(),
        }
    }
}
