use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 3;
pub const DEFAULT_TRIAL_DURATION_DAYS: i64 = 14;
pub const DEFAULT_TRIAL_COMPETITOR_LIMIT: i32 = 3;
pub const DEFAULT_TRIAL_PLAN_IDENTIFIER: &str = "trial";

pub const DEFAULT_SCHEDULER_BATCH_LIMIT: i64 = 100;
pub const DEFAULT_LIFECYCLE_BATCH_SIZE: i64 = 500;
pub const DEFAULT_CRAWL_MAX_ATTEMPTS: i32 = 3;

/// `-1` in `competitor_limit` means the plan has no cap.
pub const UNLIMITED_COMPETITORS: i32 = -1;

/// How write actions (manual crawls, adding competitors) behave while a
/// subscription sits in its grace window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GraceWritePolicy {
    /// Writes follow the crawl eligibility predicate: allowed until the grace window closes.
    #[default]
    AllowWithinWindow,
    /// Grace period is read-only: every write is denied with `GRACE_PERIOD`.
    ReadOnly,
}

/// Subscription lifecycle knobs, loaded once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecyclePolicy {
    pub grace_period_days: i64,
    pub trial_duration_days: i64,
    pub trial_competitor_limit: i32,
    pub trial_plan_identifier: String,
    pub grace_write_policy: GraceWritePolicy,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            trial_duration_days: DEFAULT_TRIAL_DURATION_DAYS,
            trial_competitor_limit: DEFAULT_TRIAL_COMPETITOR_LIMIT,
            trial_plan_identifier: DEFAULT_TRIAL_PLAN_IDENTIFIER.to_string(),
            grace_write_policy: GraceWritePolicy::default(),
        }
    }
}

impl LifecyclePolicy {
    pub fn grace_period(&self) -> Duration {
        Duration::days(self.grace_period_days)
    }

    pub fn trial_duration(&self) -> Duration {
        Duration::days(self.trial_duration_days)
    }

    /// Last instant at which a subscription whose period ended at
    /// `current_period_end` is still inside its grace window.
    pub fn grace_deadline(&self, current_period_end: DateTime<Utc>) -> DateTime<Utc> {
        current_period_end + self.grace_period()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    pub batch_limit: i64,
    pub lifecycle_batch_size: i64,
    pub crawl_max_attempts: i32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            batch_limit: DEFAULT_SCHEDULER_BATCH_LIMIT,
            lifecycle_batch_size: DEFAULT_LIFECYCLE_BATCH_SIZE,
            crawl_max_attempts: DEFAULT_CRAWL_MAX_ATTEMPTS,
        }
    }
}
