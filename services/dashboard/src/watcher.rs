//! Live dashboard
//!
//! The watcher republishes the statistics on a cron schedule and whenever a
//! row of `visits` changes. Every trigger is a full refetch of today's cards.

use auth::Host;
use chrono::{DateTime, TimeZone, Utc};
use common::realtime::ChangeFeed;
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::error::DashboardResult;
use crate::stats::{DashboardStats, StatsService};
use crate::window::DayWindow;

const WATCHED_TABLE: &str = "visits";

/// Statistics as of one refresh
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub window: DayWindow,
    pub refreshed_at: DateTime<Utc>,
}

struct Refresher<Tz> {
    stats: Arc<StatsService>,
    viewer: Host,
    tz: Tz,
    sender: watch::Sender<Option<DashboardSnapshot>>,
}

impl<Tz: TimeZone> Refresher<Tz> {
    async fn refresh(&self) -> DashboardResult<DashboardSnapshot> {
        let window = DayWindow::today(&self.tz);
        let stats = self.stats.fetch(&self.viewer, &window).await?;
        let snapshot = DashboardSnapshot {
            stats,
            window,
            refreshed_at: Utc::now(),
        };
        self.sender.send_replace(Some(snapshot.clone()));
        Ok(snapshot)
    }
}

struct Running {
    scheduler: JobScheduler,
    stop: oneshot::Sender<()>,
    listener: JoinHandle<()>,
}

pub struct DashboardWatcher<Tz> {
    refresher: Arc<Refresher<Tz>>,
    feed: Arc<dyn ChangeFeed>,
    schedule: String,
    running: Mutex<Option<Running>>,
}

impl<Tz> DashboardWatcher<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    /// Watcher for `viewer`'s dashboard, with days counted in `tz`
    pub fn new(
        stats: Arc<StatsService>,
        feed: Arc<dyn ChangeFeed>,
        viewer: Host,
        tz: Tz,
        schedule: &str,
    ) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            refresher: Arc::new(Refresher {
                stats,
                viewer,
                tz,
                sender,
            }),
            feed,
            schedule: schedule.to_string(),
            running: Mutex::new(None),
        }
    }

    /// Receiver of every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Option<DashboardSnapshot>> {
        self.refresher.sender.subscribe()
    }

    /// Refetch and publish now
    pub async fn refresh(&self) -> DashboardResult<DashboardSnapshot> {
        self.refresher.refresh().await
    }

    /// Publish a first snapshot, then keep it current
    ///
    /// Calling `start` on a running watcher does nothing.
    pub async fn start(&self) -> DashboardResult<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            info!("Dashboard watcher already running");
            return Ok(());
        }

        self.refresher.refresh().await?;

        let mut subscription = self.feed.subscribe(WATCHED_TABLE).await?;
        let scheduler = match self.schedule_refresh().await {
            Ok(scheduler) => scheduler,
            Err(e) => {
                subscription.unsubscribe().await;
                return Err(e);
            }
        };

        let (stop, mut stopped) = oneshot::channel();
        let refresher = self.refresher.clone();
        let listener = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    event = subscription.recv() => match event {
                        Some(event) => {
                            info!("{:?} on {}, refreshing dashboard", event.kind, event.table);
                            if let Err(e) = refresher.refresh().await {
                                error!("Dashboard refresh after change failed: {}", e);
                            }
                        }
                        None => {
                            warn!("Realtime channel for {} closed", WATCHED_TABLE);
                            break;
                        }
                    }
                }
            }
            subscription.unsubscribe().await;
        });

        info!(
            "Dashboard watcher started with schedule: {}",
            self.schedule
        );
        *running = Some(Running {
            scheduler,
            stop,
            listener,
        });
        Ok(())
    }

    async fn schedule_refresh(&self) -> DashboardResult<JobScheduler> {
        let scheduler = JobScheduler::new().await?;
        let refresher = self.refresher.clone();
        let job = Job::new_async(self.schedule.as_str(), move |_, _| {
            let refresher = refresher.clone();
            Box::pin(async move {
                if let Err(e) = refresher.refresh().await {
                    error!("Scheduled dashboard refresh failed: {}", e);
                }
            })
        })?;
        scheduler.add(job).await?;
        scheduler.start().await?;
        Ok(scheduler)
    }

    /// Leave the realtime channel and shut the scheduler down
    pub async fn stop(&self) -> DashboardResult<()> {
        let Some(mut running) = self.running.lock().await.take() else {
            return Ok(());
        };

        let _ = running.stop.send(());
        if let Err(e) = running.listener.await {
            warn!("Dashboard listener ended abnormally: {}", e);
        }
        running.scheduler.shutdown().await?;
        info!("Dashboard watcher stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::Role;
    use auth::repositories::MockHostsRepository;
    use common::PlatformError;
    use common::realtime::{ChangeEvent, ChangeKind, MockChangeFeed, Subscription};
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;
    use visits::repositories::MockVisitsRepository;

    /// Yearly, so it never fires during a test
    const QUIET_SCHEDULE: &str = "0 0 0 1 1 *";

    fn guard() -> Host {
        Host {
            id: Uuid::new_v4(),
            auth_id: Uuid::new_v4(),
            name: "Gate".to_string(),
            email: "gate@example.com".to_string(),
            department_id: None,
            role: Role::Guard,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn stats(counts: Arc<AtomicUsize>) -> Arc<StatsService> {
        let mut visits = MockVisitsRepository::new();
        visits.expect_count().returning(move |_| {
            counts.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        });
        Arc::new(StatsService::new(
            Arc::new(visits),
            Arc::new(MockHostsRepository::new()),
        ))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_subscribes_once_and_refreshes_on_change() {
        let counts = Arc::new(AtomicUsize::new(0));
        let (events, receiver) = mpsc::channel(4);

        let mut feed = MockChangeFeed::new();
        feed.expect_subscribe()
            .with(eq("visits"))
            .times(1)
            .return_once(move |table| Ok(Subscription::from_receiver(table, receiver)));

        let watcher = DashboardWatcher::new(
            stats(counts.clone()),
            Arc::new(feed),
            guard(),
            Utc,
            QUIET_SCHEDULE,
        );
        let mut snapshots = watcher.subscribe();

        assert_ok!(watcher.start().await);
        assert_ok!(watcher.start().await);
        assert!(watcher.is_running().await);
        assert!(snapshots.borrow_and_update().is_some());
        assert_eq!(counts.load(Ordering::SeqCst), 4);

        events
            .send(ChangeEvent {
                table: "visits".to_string(),
                kind: ChangeKind::Update,
                record: serde_json::Value::Null,
                old_record: serde_json::Value::Null,
            })
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), snapshots.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counts.load(Ordering::SeqCst), 8);

        assert_ok!(watcher.stop().await);
        assert!(!watcher.is_running().await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_subscribe_leaves_no_poller_behind() {
        let counts = Arc::new(AtomicUsize::new(0));

        let mut feed = MockChangeFeed::new();
        feed.expect_subscribe()
            .times(1)
            .return_once(|_| Err(PlatformError::Realtime("offline".to_string())));

        let watcher = DashboardWatcher::new(
            stats(counts.clone()),
            Arc::new(feed),
            guard(),
            Utc,
            "* * * * * *",
        );

        assert_err!(watcher.start().await);
        assert!(!watcher.is_running().await);
        assert_ok!(watcher.stop().await);

        let after_start = counts.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(counts.load(Ordering::SeqCst), after_start);
    }

    #[tokio::test]
    async fn test_refresh_publishes_snapshot() {
        let watcher = DashboardWatcher::new(
            stats(Arc::new(AtomicUsize::new(0))),
            Arc::new(MockChangeFeed::new()),
            guard(),
            Utc,
            QUIET_SCHEDULE,
        );
        let snapshots = watcher.subscribe();

        let snapshot = assert_ok!(watcher.refresh().await);
        assert_eq!(snapshot.stats.cards.len(), 4);
        assert!(snapshot.window.contains(&snapshot.refreshed_at));
        assert_eq!(snapshots.borrow().as_ref(), Some(&snapshot));
    }

    #[tokio::test]
    async fn test_stop_without_start_is_a_no_op() {
        let watcher = DashboardWatcher::new(
            stats(Arc::new(AtomicUsize::new(0))),
            Arc::new(MockChangeFeed::new()),
            guard(),
            Utc,
            QUIET_SCHEDULE,
        );
        assert_ok!(watcher.stop().await);
    }
}
