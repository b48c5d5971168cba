use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, policy_cache::PolicyCache};

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    policy_cache: PolicyCache,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool, policy_cache: PolicyCache) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, policy_cache }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn policy_cache(&self) -> &PolicyCache {
        &self.inner.policy_cache
    }
}
