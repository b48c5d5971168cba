use std::collections::HashSet;

use crate::core::state::AppState;
use crate::db::models::User;
use crate::db::types::{OverrideType, UserRole};
use crate::repositories;

/// Effective allow/deny for one (identity, permission code) pair.
///
/// Precedence: admin bypass > unknown-code fail-closed > user deny > user
/// grant > role default. Role policy is read through the process cache; user
/// overrides are low-cardinality, high-stakes rows and are always read
/// fresh.
pub(crate) async fn resolve(
    state: &AppState,
    user: &User,
    code: &str,
) -> Result<bool, sqlx::Error> {
    if user.role == UserRole::Admin {
        return Ok(true);
    }

    let permission = repositories::permissions::find_by_code(state.db(), code).await?;
    if permission.is_none() {
        tracing::debug!(code, user_id = %user.id, "Unknown permission code; denying");
        return Ok(decide(user.role, false, None, false));
    }

    let override_row =
        repositories::permissions::find_user_override(state.db(), &user.id, code).await?;
    if let Some(override_row) = override_row {
        // An override settles the question; role policy is irrelevant.
        return Ok(decide(user.role, true, Some(override_row.override_type), false));
    }

    let granted = role_codes(state, user.role).await?.contains(code);
    Ok(decide(user.role, true, None, granted))
}

/// The pure precedence decision over the three lookups. Kept separate from
/// the I/O so the ordering is testable on its own.
pub(crate) fn decide(
    role: UserRole,
    code_known: bool,
    override_type: Option<OverrideType>,
    role_granted: bool,
) -> bool {
    if role == UserRole::Admin {
        return true;
    }
    if !code_known {
        return false;
    }
    match override_type {
        Some(OverrideType::Deny) => false,
        Some(OverrideType::Grant) => true,
        None => role_granted,
    }
}

async fn role_codes(state: &AppState, role: UserRole) -> Result<HashSet<String>, sqlx::Error> {
    if let Some(cached) = state.policy_cache().get(role).await {
        return Ok(cached);
    }

    let codes: HashSet<String> =
        repositories::permissions::list_role_codes(state.db(), role).await?.into_iter().collect();
    state.policy_cache().store(role, codes.clone()).await;
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::decide;
    use crate::db::types::{OverrideType, UserRole};

    #[test]
    fn admin_bypass_precedes_code_validity() {
        // Unknown codes fail closed for everyone else, but the admin check
        // runs first, so an admin passes even for a code that does not exist.
        assert!(decide(UserRole::Admin, false, None, false));
        assert!(decide(UserRole::Admin, true, Some(OverrideType::Deny), false));
    }

    #[test]
    fn unknown_code_fails_closed_for_non_admins() {
        assert!(!decide(UserRole::Manager, false, None, true));
        assert!(!decide(UserRole::Manager, false, Some(OverrideType::Grant), true));
        assert!(!decide(UserRole::Student, false, None, false));
    }

    #[test]
    fn deny_override_beats_role_grant() {
        assert!(!decide(UserRole::Manager, true, Some(OverrideType::Deny), true));
    }

    #[test]
    fn grant_override_beats_missing_role_grant() {
        assert!(decide(UserRole::Student, true, Some(OverrideType::Grant), false));
    }

    #[test]
    fn role_default_applies_without_override() {
        assert!(decide(UserRole::Manager, true, None, true));
        assert!(!decide(UserRole::Manager, true, None, false));
    }
}
