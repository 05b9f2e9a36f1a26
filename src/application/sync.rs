use crate::infrastructure::cached::CachedPaymentStore;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Handle on the background task started by [`spawn_periodic_sync`].
pub struct SyncHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Stops the ticker and waits for one last flush of dirty records.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "periodic sync task panicked");
        }
    }
}

/// Pushes dirty cached records to the remote store every `every`.
///
/// Best effort: failures are logged and retried on the next tick.
pub fn spawn_periodic_sync(store: CachedPaymentStore, every: Duration) -> SyncHandle {
    let (shutdown, mut stop) = oneshot::channel();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => run_once(&store).await,
                _ = &mut stop => break,
            }
        }
        run_once(&store).await;
    });

    SyncHandle { shutdown, task }
}

async fn run_once(store: &CachedPaymentStore) {
    match store.sync().await {
        Ok(report) if report.failed > 0 => {
            tracing::warn!(failed = report.failed, pushed = report.pushed, "sync incomplete")
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "sync failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentRecord;
    use crate::domain::ports::PaymentStore;
    use crate::domain::product::ProductType;
    use crate::infrastructure::testing::FlakyStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn record() -> PaymentRecord {
        let entry = ProductType::EnglishCourse.installment(4).unwrap();
        PaymentRecord::from_schedule("stu-1", entry, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    #[tokio::test]
    async fn test_periodic_sync_pushes_dirty_records() {
        let remote = FlakyStore::default();
        let store = CachedPaymentStore::new(Arc::new(remote.clone()));

        remote.set_offline(true);
        let id = store.create(record()).await.unwrap();
        assert_eq!(store.dirty_count().await, 1);

        let handle = spawn_periodic_sync(store.clone(), Duration::from_millis(20));
        remote.set_offline(false);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(store.dirty_count().await, 0);
        assert!(remote.inner.get(id).await.unwrap().is_some());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_flushes_once_more() {
        let remote = FlakyStore::default();
        let store = CachedPaymentStore::new(Arc::new(remote.clone()));
        let handle = spawn_periodic_sync(store.clone(), Duration::from_secs(3600));

        remote.set_offline(true);
        let id = store.create(record()).await.unwrap();
        remote.set_offline(false);

        handle.shutdown().await;
        assert_eq!(store.dirty_count().await, 0);
        assert!(remote.inner.get(id).await.unwrap().is_some());
    }
}
