use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use diesel::Queryable;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    entities::{
        crawl_queue::{CrawlQueueEntity, InsertCrawlQueueEntity},
        subscriptions::SubscriptionEntity,
    },
    value_objects::{eligibility::is_eligible, lifecycle_policy::LifecyclePolicy},
};

/// Manual triggers outrank everything the scheduler creates.
pub const MANUAL_PRIORITY: i32 = 1000;
pub const FIRST_CRAWL_PRIORITY: i32 = 100;
pub const RECRAWL_PRIORITY: i32 = 0;

/// One competitor row as read by the due-set query, with its owner resolved.
#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct DueCandidate {
    pub competitor_id: Uuid,
    pub owner_user_id: Uuid,
    pub url: String,
    pub is_active: bool,
    pub crawl_frequency_minutes: i32,
    pub last_crawled_at: Option<DateTime<Utc>>,
    pub queued: bool,
}

impl DueCandidate {
    /// Active, not already queued, and either never crawled or past its interval.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active || self.queued {
            return false;
        }

        match self.last_crawled_at {
            None => true,
            Some(last_crawled_at) => {
                last_crawled_at + Duration::minutes(i64::from(self.crawl_frequency_minutes)) < now
            }
        }
    }

    pub fn scheduler_priority(&self) -> i32 {
        if self.last_crawled_at.is_none() {
            FIRST_CRAWL_PRIORITY
        } else {
            RECRAWL_PRIORITY
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueCompetitor {
    pub competitor_id: Uuid,
    pub url: String,
    pub priority: i32,
}

/// Never-crawled first, then the most overdue; competitor id breaks ties.
pub fn sort_by_crawl_age(candidates: &mut [DueCandidate]) {
    candidates.sort_by(|a, b| {
        let by_age = match (a.last_crawled_at, b.last_crawled_at) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(a_at), Some(b_at)) => a_at.cmp(&b_at),
        };
        by_age.then_with(|| a.competitor_id.cmp(&b.competitor_id))
    });
}

/// Applies the due rule and owner eligibility to a batch of candidates.
///
/// `owner_subscriptions` maps a user id to that user's current (newest)
/// subscription; owners missing from the map are treated as ineligible.
pub fn select_due(
    mut candidates: Vec<DueCandidate>,
    owner_subscriptions: &HashMap<Uuid, SubscriptionEntity>,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
    limit: usize,
) -> Vec<DueCompetitor> {
    sort_by_crawl_age(&mut candidates);

    candidates
        .into_iter()
        .filter(|candidate| candidate.is_due(now))
        .filter(|candidate| {
            owner_subscriptions
                .get(&candidate.owner_user_id)
                .is_some_and(|subscription| is_eligible(subscription, now, policy))
        })
        .take(limit)
        .map(|candidate| DueCompetitor {
            priority: candidate.scheduler_priority(),
            competitor_id: candidate.competitor_id,
            url: candidate.url,
        })
        .collect()
}

/// Result of an idempotent enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued(Uuid),
    AlreadyQueued,
}

pub fn new_crawl_job(
    competitor_id: Uuid,
    url: String,
    priority: i32,
    max_attempts: i32,
    now: DateTime<Utc>,
) -> InsertCrawlQueueEntity {
    InsertCrawlQueueEntity {
        competitor_id,
        url,
        priority,
        attempt: 0,
        max_attempts,
        scheduled_for: now,
        created_at: now,
    }
}

/// 1-indexed position of a row scheduled at `scheduled_for` with `priority`:
/// rows scheduled no later and with at least its priority, itself included.
pub fn queue_position(
    scheduled_for: DateTime<Utc>,
    priority: i32,
    queue: &[CrawlQueueEntity],
) -> i64 {
    queue
        .iter()
        .filter(|other| other.scheduled_for <= scheduled_for && other.priority >= priority)
        .count() as i64
}
