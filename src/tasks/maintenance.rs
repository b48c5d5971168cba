use anyhow::{Context, Result};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

/// Attempts whose deadline passed without a submission are dead weight; flip
/// them to abandoned so they can no longer be submitted against.
pub(crate) async fn abandon_overdue_attempts(state: &AppState) -> Result<()> {
    let now = primitive_now_utc();

    let abandoned = repositories::attempts::abandon_overdue(state.db(), now)
        .await
        .context("Failed to abandon overdue attempts")?;

    if abandoned > 0 {
        tracing::info!(abandoned_attempts = abandoned, "Abandoned overdue attempts");
    }
    metrics::counter!("attempts_abandoned_total").increment(abandoned);

    Ok(())
}
