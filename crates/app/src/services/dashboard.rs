use std::sync::Arc;

use board_core::DashboardSnapshot;
use chrono::{DateTime, Utc};
use fieldservice::FieldServiceApi;
use pipeline::{
    CelebrationTracker, PipelineOptions, build_snapshot, compute_buckets, run_cycle,
    zeroed_snapshot,
};
use tokio::sync::{Mutex, RwLock};

use crate::error::Result;
use crate::services::SharedConfig;

/// Runs poll passes and keeps the latest board in memory.
///
/// Passes are serialized: the poller and an on-demand refresh never run the
/// pipeline at the same time.
#[derive(Clone)]
pub struct DashboardService {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    api: Arc<dyn FieldServiceApi>,
    options: PipelineOptions,
    celebrate: bool,
    latest: RwLock<Option<DashboardSnapshot>>,
    cycle: Mutex<CelebrationTracker>,
}

impl DashboardService {
    pub(super) fn new(api: Arc<dyn FieldServiceApi>, config: SharedConfig) -> Result<Self> {
        let options = config.pipeline_options()?;
        Ok(Self {
            inner: Arc::new(DashboardInner {
                api,
                options,
                celebrate: config.board.celebrate,
                latest: RwLock::new(None),
                cycle: Mutex::new(CelebrationTracker::new()),
            }),
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.inner.options
    }

    pub async fn refresh(&self) -> DashboardSnapshot {
        self.refresh_at(Utc::now()).await
    }

    /// Runs one pass as of `now` and publishes the result.
    ///
    /// A failed pass still publishes a board: every count is zero and the
    /// error text is carried in `warning`.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> DashboardSnapshot {
        let mut tracker = self.inner.cycle.lock().await;
        let options = &self.inner.options;
        let today = now.with_timezone(&options.timezone).date_naive();

        let snapshot = match run_cycle(self.inner.api.as_ref(), options, today).await {
            Ok(output) => {
                let mut snapshot = build_snapshot(&output, options, now);
                if self.inner.celebrate {
                    snapshot.celebrations = tracker.observe(today, &snapshot.days);
                    for celebration in &snapshot.celebrations {
                        tracing::info!(
                            category = %celebration.category,
                            day = %celebration.label,
                            date = %celebration.date,
                            "target met"
                        );
                    }
                }
                snapshot
            }
            Err(err) => {
                tracing::warn!(error = %err, "poll cycle failed; publishing zeroed board");
                let buckets = compute_buckets(today, &options.timezone);
                zeroed_snapshot(
                    &buckets,
                    options,
                    now,
                    format!("Data unavailable: {}", err),
                )
            }
        };

        *self.inner.latest.write().await = Some(snapshot.clone());
        snapshot
    }

    pub async fn latest(&self) -> Option<DashboardSnapshot> {
        self.inner.latest.read().await.clone()
    }

    /// Latest board, running a first pass if none has been published yet.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        if let Some(snapshot) = self.latest().await {
            return snapshot;
        }
        self.refresh().await
    }
}
