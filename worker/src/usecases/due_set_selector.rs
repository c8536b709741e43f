use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::{
    repositories::{competitors::CompetitorRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        crawl_scheduling::{self, DueCompetitor},
        lifecycle_policy::LifecyclePolicy,
    },
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::debug;
use uuid::Uuid;

/// Pages scanned per selection before giving up on filling `limit`.
/// Bounds the work when many due competitors belong to ineligible owners.
const MAX_PAGES: usize = 10;

pub struct DueSetSelector {
    competitor_repository: Arc<dyn CompetitorRepository + Send + Sync>,
    subscription_repository: Arc<dyn SubscriptionRepository + Send + Sync>,
    policy: LifecyclePolicy,
}

impl DueSetSelector {
    pub fn new(
        competitor_repository: Arc<dyn CompetitorRepository + Send + Sync>,
        subscription_repository: Arc<dyn SubscriptionRepository + Send + Sync>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            competitor_repository,
            subscription_repository,
            policy,
        }
    }

    /// Competitors that should be crawled now, most overdue first, at most `limit`.
    pub async fn select_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<DueCompetitor>> {
        let target = usize::try_from(limit).unwrap_or(0);
        if target == 0 {
            return Ok(Vec::new());
        }

        let mut selected: Vec<DueCompetitor> = Vec::with_capacity(target);
        let mut offset = 0_i64;

        for page_index in 0..MAX_PAGES {
            let page = self
                .competitor_repository
                .list_due_candidates(now, offset, limit)
                .await?;
            let page_len = page.len();
            if page_len == 0 {
                break;
            }

            let owner_ids: Vec<Uuid> = page
                .iter()
                .map(|candidate| candidate.owner_user_id)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();

            let owners: HashMap<Uuid, _> = self
                .subscription_repository
                .find_current_subscriptions_for_users(owner_ids)
                .await?
                .into_iter()
                .map(|subscription| (subscription.user_id, subscription))
                .collect();

            let remaining = target - selected.len();
            let picked =
                crawl_scheduling::select_due(page, &owners, now, &self.policy, remaining);

            debug!(
                page = page_index,
                scanned = page_len,
                picked = picked.len(),
                "due_set: page evaluated"
            );

            selected.extend(picked);

            if selected.len() >= target || (page_len as i64) < limit {
                break;
            }
            offset += limit;
        }

        Ok(selected)
    }
}
