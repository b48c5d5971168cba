use crate::db::models::{Exam, ExamAssignment, User};
use crate::db::types::UserRole;
use crate::services::errors::AttemptError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExamAccess {
    pub(crate) effective_max_attempts: i32,
}

/// The visibility & assignment gate, evaluated strictly in order over rows
/// the caller already fetched:
///
/// 1. a disabled exam rejects everyone, admins included;
/// 2. admins bypass the assignment requirement (their assignment row, if one
///    exists, still supplies the attempt-ceiling override);
/// 3. public exams admit anyone, anonymous takers included;
/// 4. private exams require an authenticated identity holding an assignment.
///
/// A missing exam row is `ExamNotFound` at fetch time, before this gate.
pub(crate) fn authorize_taker(
    exam: &Exam,
    identity: Option<&User>,
    assignment: Option<&ExamAssignment>,
) -> Result<ExamAccess, AttemptError> {
    if !exam.is_active {
        return Err(AttemptError::ExamDisabled);
    }

    let effective_max_attempts =
        assignment.and_then(|row| row.max_attempts).unwrap_or(exam.max_attempts);
    let access = ExamAccess { effective_max_attempts };

    if let Some(user) = identity {
        if user.role == UserRole::Admin {
            return Ok(access);
        }
    }

    if exam.is_public {
        return Ok(access);
    }

    if identity.is_none() {
        return Err(AttemptError::AuthenticationRequired);
    }

    if assignment.is_none() {
        return Err(AttemptError::NotAssigned);
    }

    Ok(access)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::db::models::{Exam, ExamAssignment, User};
    use crate::db::types::UserRole;

    fn exam() -> Exam {
        Exam {
            id: "exam-1".to_string(),
            title: "Safety basics".to_string(),
            description: None,
            question_count: 10,
            time_limit_minutes: 30,
            start_time: datetime!(2025-01-01 08:00),
            end_time: datetime!(2025-01-31 20:00),
            timezone: "UTC".to_string(),
            shuffle_questions: true,
            shuffle_answers: false,
            require_all_questions: true,
            max_attempts: 1,
            is_active: true,
            is_public: false,
            category: None,
            created_by: "admin-1".to_string(),
            created_at: datetime!(2024-12-01 00:00),
            updated_at: datetime!(2024-12-01 00:00),
        }
    }

    fn user(role: UserRole) -> User {
        User {
            id: "user-1".to_string(),
            username: "jdoe".to_string(),
            hashed_password: "hash".to_string(),
            full_name: "Jane Doe".to_string(),
            role,
            is_active: true,
            created_at: datetime!(2024-12-01 00:00),
            updated_at: datetime!(2024-12-01 00:00),
        }
    }

    fn assignment(max_attempts: Option<i32>) -> ExamAssignment {
        ExamAssignment {
            id: "assign-1".to_string(),
            exam_id: "exam-1".to_string(),
            user_id: "user-1".to_string(),
            max_attempts,
            assigned_by: "admin-1".to_string(),
            assigned_at: datetime!(2024-12-02 00:00),
        }
    }

    #[test]
    fn disabled_exam_rejects_everyone() {
        let mut exam = exam();
        exam.is_active = false;

        let admin = user(UserRole::Admin);
        assert_eq!(
            authorize_taker(&exam, Some(&admin), None),
            Err(AttemptError::ExamDisabled)
        );
        assert_eq!(authorize_taker(&exam, None, None), Err(AttemptError::ExamDisabled));
    }

    #[test]
    fn admin_bypasses_assignment_on_private_exam() {
        let exam = exam();
        let admin = user(UserRole::Admin);

        let access = authorize_taker(&exam, Some(&admin), None).expect("admin access");
        assert_eq!(access.effective_max_attempts, 1);
    }

    #[test]
    fn admin_assignment_override_still_applies() {
        let exam = exam();
        let admin = user(UserRole::Admin);
        let row = assignment(Some(7));

        let access = authorize_taker(&exam, Some(&admin), Some(&row)).expect("admin access");
        assert_eq!(access.effective_max_attempts, 7);
    }

    #[test]
    fn public_exam_admits_anonymous_takers() {
        let mut exam = exam();
        exam.is_public = true;

        let access = authorize_taker(&exam, None, None).expect("anonymous access");
        assert_eq!(access.effective_max_attempts, 1);
    }

    #[test]
    fn public_exam_applies_assignment_override_when_present() {
        let mut exam = exam();
        exam.is_public = true;
        let student = user(UserRole::Student);
        let row = assignment(Some(3));

        let access = authorize_taker(&exam, Some(&student), Some(&row)).expect("access");
        assert_eq!(access.effective_max_attempts, 3);
    }

    #[test]
    fn private_exam_requires_identity() {
        let exam = exam();
        assert_eq!(authorize_taker(&exam, None, None), Err(AttemptError::AuthenticationRequired));
    }

    #[test]
    fn private_exam_requires_assignment() {
        let exam = exam();
        let student = user(UserRole::Student);
        assert_eq!(
            authorize_taker(&exam, Some(&student), None),
            Err(AttemptError::NotAssigned)
        );
    }

    #[test]
    fn assignment_override_replaces_exam_default() {
        let exam = exam();
        let student = user(UserRole::Student);
        let row = assignment(Some(5));

        let access = authorize_taker(&exam, Some(&student), Some(&row)).expect("access");
        assert_eq!(access.effective_max_attempts, 5);
    }

    #[test]
    fn assignment_without_override_keeps_exam_default() {
        let exam = exam();
        let student = user(UserRole::Student);
        let row = assignment(None);

        let access = authorize_taker(&exam, Some(&student), Some(&row)).expect("access");
        assert_eq!(access.effective_max_attempts, 1);
    }
}
