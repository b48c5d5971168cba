use sqlx::PgPool;

use crate::db::models::User;
use crate::repositories;
use crate::services::errors::AttemptError;

/// The weak keys an identity can be matched under in the attempt ledger.
/// Historic results were written under whichever key the taker presented at
/// the time (user id, username, or a free-text name), so ledger lookups OR
/// across all three. Replacing this scheme with a stronger identity only
/// requires touching this type and `repositories::results`.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct IdentityKeys {
    pub(crate) user_id: Option<String>,
    pub(crate) username: Option<String>,
    pub(crate) full_name: Option<String>,
}

impl IdentityKeys {
    pub(crate) fn from_user(user: &User) -> Self {
        Self {
            user_id: Some(user.id.clone()),
            username: Some(user.username.clone()),
            full_name: Some(user.full_name.clone()),
        }
    }

    /// Keys for an anonymous taker, built from whatever identity fields the
    /// submission claimed.
    pub(crate) fn from_claimed(
        student_id: Option<&str>,
        student_name: Option<&str>,
    ) -> Self {
        Self {
            user_id: student_id.map(str::to_string),
            username: None,
            full_name: student_name.map(str::to_string),
        }
    }

    pub(crate) fn is_anonymous(&self) -> bool {
        self.user_id.is_none() && self.username.is_none() && self.full_name.is_none()
    }
}

/// Completed-attempt count for the identity. Anonymous callers count zero by
/// definition; their real total only becomes knowable at submission time,
/// once they claim identity fields.
pub(crate) async fn count_attempts(
    pool: &PgPool,
    exam_id: &str,
    keys: &IdentityKeys,
) -> Result<i64, sqlx::Error> {
    if keys.is_anonymous() {
        return Ok(0);
    }

    repositories::results::count_matching_identity(
        pool,
        exam_id,
        keys.user_id.as_deref(),
        keys.username.as_deref(),
        keys.full_name.as_deref(),
    )
    .await
}

pub(crate) fn enforce_limit(count: i64, ceiling: i32) -> Result<(), AttemptError> {
    if count >= ceiling as i64 {
        return Err(AttemptError::AttemptLimitReached { count, ceiling });
    }
    Ok(())
}
