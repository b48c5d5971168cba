use anyhow::Context;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::{security, time::primitive_now_utc};
use crate::db::types::UserRole;
use crate::repositories;

/// (code, display name, category). The catalog is static; administrators
/// shape policy through role grants and per-user overrides, not new codes.
const PERMISSION_CATALOG: &[(&str, &str, &str)] = &[
    ("exam:create", "Create exams", "exams"),
    ("exam:edit", "Edit exams", "exams"),
    ("exam:delete", "Delete exams", "exams"),
    ("exam:assign", "Assign exams to users", "exams"),
    ("exam:results", "View exam results", "exams"),
    ("question:create", "Create bank questions", "questions"),
    ("question:delete", "Delete bank questions", "questions"),
    ("permission:manage", "Manage role grants and user overrides", "administration"),
];

const MANAGER_DEFAULT_GRANTS: &[&str] = &[
    "exam:create",
    "exam:edit",
    "exam:assign",
    "exam:results",
    "question:create",
    "question:delete",
];

pub(crate) async fn ensure_defaults(state: &AppState) -> anyhow::Result<()> {
    seed_permission_catalog(state).await?;
    ensure_first_admin(state).await?;
    Ok(())
}

async fn seed_permission_catalog(state: &AppState) -> anyhow::Result<()> {
    for (code, name, category) in PERMISSION_CATALOG {
        repositories::permissions::upsert_permission(
            state.db(),
            &Uuid::new_v4().to_string(),
            code,
            name,
            category,
        )
        .await
        .with_context(|| format!("Failed to seed permission {code}"))?;
    }

    for code in MANAGER_DEFAULT_GRANTS {
        repositories::permissions::ensure_role_grant(
            state.db(),
            &Uuid::new_v4().to_string(),
            UserRole::Manager,
            code,
        )
        .await
        .with_context(|| format!("Failed to seed manager grant {code}"))?;
    }

    Ok(())
}

async fn ensure_first_admin(state: &AppState) -> anyhow::Result<()> {
    let username = state.settings().admin().first_admin_username.clone();
    let password = state.settings().admin().first_admin_password.clone();

    if password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD is not set; skipping first admin bootstrap");
        return Ok(());
    }

    let existing = repositories::users::find_by_username(state.db(), &username)
        .await
        .context("Failed to look up first admin")?;
    if existing.is_some() {
        return Ok(());
    }

    let hashed_password =
        security::hash_password(&password).context("Failed to hash first admin password")?;
    let now = primitive_now_utc();

    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &username,
            hashed_password,
            full_name: "Administrator",
            role: UserRole::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .context("Failed to create first admin")?;

    tracing::info!(username = %username, "Created first admin account");
    Ok(())
}
