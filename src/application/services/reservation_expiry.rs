//! Background task that periodically expires overdue reservations.
//!
//! Runs in a tokio::spawn loop and calls `expire_reservations(now)` on the
//! service every `check_interval_secs`. Nothing else expires reservations.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::ParkingService;
use crate::shared::shutdown::ShutdownSignal;

pub fn start_reservation_expiry_task(
    service: Arc<dyn ParkingService>,
    shutdown: ShutdownSignal,
    check_interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(check_interval = check_interval_secs, "Reservation expiry task started");

        let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match service.expire_reservations(Utc::now()).await {
                        Ok(expired) if expired.is_empty() => debug!("No overdue reservations"),
                        Ok(expired) => info!(count = expired.len(), "Reservations expired"),
                        Err(e) => warn!(error = %e, "Reservation expiry check error"),
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("Reservation expiry task shutting down");
                    break;
                }
            }
        }

        info!("Reservation expiry task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::parking::AllocationCoordinator;
    use crate::application::services::ParkingServiceImpl;
    use crate::config::AllocationConfig;
    use crate::infrastructure::storage::InMemoryParkingStore;

    #[tokio::test]
    async fn stops_on_shutdown() {
        let store = Arc::new(InMemoryParkingStore::new());
        let coordinator = AllocationCoordinator::new(store, &AllocationConfig::default(), create_event_bus());
        let service: Arc<dyn ParkingService> = Arc::new(ParkingServiceImpl::new(Arc::new(coordinator)));
        let shutdown = ShutdownSignal::new();

        let handle = start_reservation_expiry_task(service, shutdown.clone(), 3600);
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("Timeout")
            .expect("Task panicked");
    }
}
