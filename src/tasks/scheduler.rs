use tokio::sync::watch;
use tokio::time::{interval, Duration};

use crate::core::state::AppState;
use crate::tasks::maintenance;

pub(crate) async fn run(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let period =
        Duration::from_secs(state.settings().engine().attempt_sweep_interval_seconds.max(1));
    let mut tick = interval(period);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = maintenance::abandon_overdue_attempts(&state).await {
                    tracing::error!(error = %err, "abandon_overdue_attempts failed");
                }
            }
        }
    }
}
