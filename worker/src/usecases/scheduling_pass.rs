use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::{
    repositories::crawl_queue::CrawlQueueRepository,
    value_objects::{
        crawl_scheduling::{EnqueueOutcome, new_crawl_job},
        lifecycle_policy::SchedulerSettings,
    },
};
use serde::Serialize;
use std::{sync::Arc, time::Instant};
use tracing::{debug, error, info};

use super::{due_set_selector::DueSetSelector, elapsed_ms};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulingPassStats {
    pub candidates: usize,
    pub enqueued: usize,
    pub skipped: usize,
    pub errors: usize,
    #[serde(skip)]
    pub elapsed_ms: u64,
}

pub struct SchedulingPassUseCase {
    selector: DueSetSelector,
    crawl_queue_repository: Arc<dyn CrawlQueueRepository + Send + Sync>,
    settings: SchedulerSettings,
}

impl SchedulingPassUseCase {
    pub fn new(
        selector: DueSetSelector,
        crawl_queue_repository: Arc<dyn CrawlQueueRepository + Send + Sync>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            selector,
            crawl_queue_repository,
            settings,
        }
    }

    /// Selects the due set once and enqueues it sequentially. Per-item
    /// failures are counted; only a failed selection aborts the pass.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<SchedulingPassStats> {
        let started = Instant::now();

        let due = self
            .selector
            .select_due(now, self.settings.batch_limit)
            .await?;

        let mut stats = SchedulingPassStats {
            candidates: due.len(),
            ..Default::default()
        };

        for competitor in due {
            let competitor_id = competitor.competitor_id;
            let job = new_crawl_job(
                competitor_id,
                competitor.url,
                competitor.priority,
                self.settings.crawl_max_attempts,
                now,
            );

            match self.crawl_queue_repository.enqueue(job).await {
                Ok(EnqueueOutcome::Enqueued(queue_id)) => {
                    stats.enqueued += 1;
                    debug!(
                        %competitor_id,
                        %queue_id,
                        priority = competitor.priority,
                        "schedule_crawls: enqueued"
                    );
                }
                Ok(EnqueueOutcome::AlreadyQueued) => {
                    stats.skipped += 1;
                    debug!(%competitor_id, "schedule_crawls: already queued; skipping");
                }
                Err(err) => {
                    stats.errors += 1;
                    error!(
                        %competitor_id,
                        error = ?err,
                        "schedule_crawls: failed to enqueue competitor"
                    );
                }
            }
        }

        stats.elapsed_ms = elapsed_ms(started);

        info!(
            candidates = stats.candidates,
            enqueued = stats.enqueued,
            skipped = stats.skipped,
            errors = stats.errors,
            elapsed_ms = stats.elapsed_ms,
            "schedule_crawls: completed"
        );

        Ok(stats)
    }
}
