use time::PrimitiveDateTime;

use crate::db::models::Exam;
use crate::services::errors::AttemptError;

/// Checks `now` against the exam's `[start_time, end_time]` window, both ends
/// inclusive. The comparison is a plain instant comparison; the exam's
/// display timezone only shapes the error message.
pub(crate) fn check_window(exam: &Exam, now: PrimitiveDateTime) -> Result<(), AttemptError> {
    if now < exam.start_time {
        return Err(AttemptError::NotYetOpen {
            now,
            opens_at: exam.start_time,
            timezone: exam.timezone.clone(),
        });
    }

    if now > exam.end_time {
        return Err(AttemptError::Closed {
            now,
            closed_at: exam.end_time,
            timezone: exam.timezone.clone(),
        });
    }

    Ok(())
}
