//! Periodic notification sweep.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::usecase::SweepNotificationsUseCase;

/// Runs the sweep every `period` until the returned handle is aborted.
///
/// The first sweep runs one period after startup. Runs concurrently with
/// request-triggered dispatch.
pub fn spawn_notification_sweep(
    usecase: Arc<SweepNotificationsUseCase>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;

        tracing::info!("Notification sweep running every {:?}", period);
        loop {
            interval.tick().await;
            let report = usecase.execute().await;
            if report.events > 0 {
                tracing::debug!("Sweep report: {:?}", report);
            }
        }
    })
}
