//! Periodic purge of expired refresh sessions and password reset tokens.

use std::sync::Arc;
use std::time::Duration;

use docflow_db::store::SessionStore;
use tokio_util::sync::CancellationToken;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the cleanup loop until `cancel` is triggered.
pub async fn run(sessions: Arc<dyn SessionStore>, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Token cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Token cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                run_once(sessions.as_ref()).await;
            }
        }
    }
}

/// One cleanup pass. Failures are logged and the next pass retries.
pub async fn run_once(sessions: &dyn SessionStore) {
    match sessions.cleanup_expired_sessions().await {
        Ok(0) => tracing::debug!("Token cleanup: no expired sessions"),
        Ok(deleted) => tracing::info!(deleted, "Token cleanup: purged expired sessions"),
        Err(e) => tracing::error!(error = %e, "Token cleanup: session purge failed"),
    }
    match sessions.cleanup_expired_reset_tokens().await {
        Ok(0) => tracing::debug!("Token cleanup: no expired reset tokens"),
        Ok(deleted) => tracing::info!(deleted, "Token cleanup: purged expired reset tokens"),
        Err(e) => tracing::error!(error = %e, "Token cleanup: reset token purge failed"),
    }
}

#[cfg(test)]
mod tests {
    use docflow_db::Stores;

    use super::*;

    #[tokio::test]
    async fn job_exits_on_cancel() {
        let stores = Stores::in_memory();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(stores.sessions.clone(), cancel.clone()));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("job stops promptly")
            .expect("job does not panic");
    }
}
