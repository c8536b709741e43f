use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};
use uuid::Uuid;

use crate::domain::{
    entities::{
        businesses::BusinessEntity,
        competitors::{CompetitorEntity, InsertCompetitorEntity},
        crawl_queue::{CrawlQueueEntity, InsertCrawlQueueEntity},
        email_logs::{EmailLogEntity, InsertEmailLogEntity},
        subscriptions::{
            ActivateSubscriptionEntity, InsertSubscriptionEntity, SubscriptionEntity,
        },
    },
    repositories::{
        competitors::CompetitorRepository, crawl_queue::CrawlQueueRepository,
        email_logs::EmailLogRepository, notifications::EmailSender,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        crawl_scheduling::{DueCandidate, EnqueueOutcome, queue_position, sort_by_crawl_age},
        enums::{
            email_types::{EmailLogStatus, EmailType},
            subscription_statuses::SubscriptionStatus,
        },
        subscriptions::LifecycleCandidate,
    },
};

#[derive(Debug, Clone)]
struct UserRecord {
    email: String,
    name: Option<String>,
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, UserRecord>,
    businesses: Vec<BusinessEntity>,
    competitors: Vec<CompetitorEntity>,
    subscriptions: Vec<SubscriptionEntity>,
    crawl_queue: Vec<CrawlQueueEntity>,
    email_logs: Vec<EmailLogEntity>,
}

impl State {
    fn newest_subscription(&self, user_id: Uuid) -> Option<&SubscriptionEntity> {
        self.subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| (s.created_at, s.id))
    }

    fn owner_of(&self, business_id: Uuid) -> Option<Uuid> {
        self.businesses
            .iter()
            .find(|b| b.id == business_id)
            .map(|b| b.user_id)
    }
}

/// Mirrors the Postgres repositories, including the one-pending-row-per-competitor
/// queue constraint and newest-row-wins subscription reads.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_user(&self, email: &str, name: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.state().users.insert(
            id,
            UserRecord {
                email: email.to_string(),
                name: name.map(str::to_string),
            },
        );
        id
    }

    pub fn add_business(&self, user_id: Uuid, now: DateTime<Utc>) -> BusinessEntity {
        let business = BusinessEntity {
            id: Uuid::new_v4(),
            user_id,
            name: "Acme Retail".to_string(),
            created_at: now,
        };
        self.state().businesses.push(business.clone());
        business
    }

    pub fn add_competitor(
        &self,
        business_id: Uuid,
        url: &str,
        last_crawled_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> CompetitorEntity {
        let competitor = CompetitorEntity {
            id: Uuid::new_v4(),
            business_id,
            name: url.to_string(),
            url: url.to_string(),
            is_active: true,
            crawl_frequency_minutes: 60,
            last_crawled_at,
            created_at: now,
            updated_at: now,
        };
        self.state().competitors.push(competitor.clone());
        competitor
    }

    pub fn put_subscription(&self, subscription: SubscriptionEntity) {
        let mut state = self.state();
        state.subscriptions.retain(|s| s.id != subscription.id);
        state.subscriptions.push(subscription);
    }

    pub fn subscription(&self, subscription_id: Uuid) -> Option<SubscriptionEntity> {
        self.state()
            .subscriptions
            .iter()
            .find(|s| s.id == subscription_id)
            .cloned()
    }

    pub fn queue(&self) -> Vec<CrawlQueueEntity> {
        self.state().crawl_queue.clone()
    }

    pub fn email_logs(&self) -> Vec<EmailLogEntity> {
        self.state().email_logs.clone()
    }

    /// Simulates the crawler consuming a job.
    pub fn complete_crawl(&self, competitor_id: Uuid, crawled_at: DateTime<Utc>) {
        let mut state = self.state();
        state.crawl_queue.retain(|q| q.competitor_id != competitor_id);
        if let Some(c) = state.competitors.iter_mut().find(|c| c.id == competitor_id) {
            c.last_crawled_at = Some(crawled_at);
        }
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryStore {
    async fn find_current_subscription(&self, user_id: Uuid) -> Result<Option<SubscriptionEntity>> {
        Ok(self.state().newest_subscription(user_id).cloned())
    }

    async fn find_current_subscriptions_for_users(
        &self,
        user_ids: Vec<Uuid>,
    ) -> Result<Vec<SubscriptionEntity>> {
        let state = self.state();
        let unique: HashSet<Uuid> = user_ids.into_iter().collect();
        Ok(unique
            .into_iter()
            .filter_map(|user_id| state.newest_subscription(user_id).cloned())
            .collect())
    }

    async fn list_lifecycle_candidates(
        &self,
        status: SubscriptionStatus,
        plan_identifier: String,
        period_end_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<LifecycleCandidate>> {
        let state = self.state();
        let mut candidates: Vec<LifecycleCandidate> = state
            .subscriptions
            .iter()
            .filter(|s| s.status == status.as_str())
            .filter(|s| s.plan_identifier == plan_identifier)
            .filter(|s| s.current_period_end < period_end_before)
            .filter(|s| state.newest_subscription(s.user_id).map(|n| n.id) == Some(s.id))
            .filter_map(|s| {
                state.users.get(&s.user_id).map(|user| LifecycleCandidate {
                    subscription: s.clone(),
                    email: user.email.clone(),
                    name: user.name.clone(),
                })
            })
            .collect();

        candidates.sort_by_key(|c| c.subscription.current_period_end);
        candidates.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(candidates)
    }

    async fn transition_status(
        &self,
        subscription_id: Uuid,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state();
        match state
            .subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id && s.status == from.as_str())
        {
            Some(subscription) => {
                subscription.status = to.to_string();
                subscription.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_subscription(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity> {
        let subscription = SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: insert_subscription_entity.user_id,
            status: insert_subscription_entity.status,
            plan_identifier: insert_subscription_entity.plan_identifier,
            current_period_start: insert_subscription_entity.current_period_start,
            current_period_end: insert_subscription_entity.current_period_end,
            competitor_limit: insert_subscription_entity.competitor_limit,
            created_at: insert_subscription_entity.created_at,
            updated_at: insert_subscription_entity.updated_at,
        };
        self.state().subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn activate_subscription(
        &self,
        subscription_id: Uuid,
        changes: ActivateSubscriptionEntity,
    ) -> Result<SubscriptionEntity> {
        let mut state = self.state();
        let subscription = state
            .subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id)
            .ok_or_else(|| anyhow!("subscription {subscription_id} not found"))?;

        subscription.status = changes.status;
        subscription.plan_identifier = changes.plan_identifier;
        subscription.current_period_start = changes.current_period_start;
        subscription.current_period_end = changes.current_period_end;
        subscription.competitor_limit = changes.competitor_limit;
        subscription.updated_at = changes.updated_at;
        Ok(subscription.clone())
    }
}

#[async_trait]
impl CompetitorRepository for InMemoryStore {
    async fn list_due_candidates(
        &self,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<DueCandidate>> {
        let state = self.state();
        let queued: HashSet<Uuid> = state.crawl_queue.iter().map(|q| q.competitor_id).collect();

        let mut candidates: Vec<DueCandidate> = state
            .competitors
            .iter()
            .filter_map(|c| {
                state.owner_of(c.business_id).map(|owner_user_id| DueCandidate {
                    competitor_id: c.id,
                    owner_user_id,
                    url: c.url.clone(),
                    is_active: c.is_active,
                    crawl_frequency_minutes: c.crawl_frequency_minutes,
                    last_crawled_at: c.last_crawled_at,
                    queued: queued.contains(&c.id),
                })
            })
            .filter(|candidate| candidate.is_due(now))
            .collect();

        sort_by_crawl_age(&mut candidates);

        Ok(candidates
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn find_owned_competitor(
        &self,
        user_id: Uuid,
        competitor_id: Uuid,
    ) -> Result<Option<CompetitorEntity>> {
        let state = self.state();
        Ok(state
            .competitors
            .iter()
            .find(|c| c.id == competitor_id && state.owner_of(c.business_id) == Some(user_id))
            .cloned())
    }

    async fn find_owned_business(
        &self,
        user_id: Uuid,
        business_id: Uuid,
    ) -> Result<Option<BusinessEntity>> {
        Ok(self
            .state()
            .businesses
            .iter()
            .find(|b| b.id == business_id && b.user_id == user_id)
            .cloned())
    }

    async fn count_competitors_for_user(&self, user_id: Uuid) -> Result<i64> {
        let state = self.state();
        let count = state
            .competitors
            .iter()
            .filter(|c| state.owner_of(c.business_id) == Some(user_id))
            .count();
        Ok(i64::try_from(count)?)
    }

    async fn create_competitor(
        &self,
        insert_competitor_entity: InsertCompetitorEntity,
    ) -> Result<CompetitorEntity> {
        let competitor = CompetitorEntity {
            id: Uuid::new_v4(),
            business_id: insert_competitor_entity.business_id,
            name: insert_competitor_entity.name,
            url: insert_competitor_entity.url,
            is_active: insert_competitor_entity.is_active,
            crawl_frequency_minutes: insert_competitor_entity.crawl_frequency_minutes,
            last_crawled_at: insert_competitor_entity.last_crawled_at,
            created_at: insert_competitor_entity.created_at,
            updated_at: insert_competitor_entity.updated_at,
        };
        self.state().competitors.push(competitor.clone());
        Ok(competitor)
    }
}

#[async_trait]
impl CrawlQueueRepository for InMemoryStore {
    async fn enqueue(
        &self,
        insert_crawl_queue_entity: InsertCrawlQueueEntity,
    ) -> Result<EnqueueOutcome> {
        let mut state = self.state();
        if state
            .crawl_queue
            .iter()
            .any(|q| q.competitor_id == insert_crawl_queue_entity.competitor_id)
        {
            return Ok(EnqueueOutcome::AlreadyQueued);
        }

        let id = Uuid::new_v4();
        state.crawl_queue.push(CrawlQueueEntity {
            id,
            competitor_id: insert_crawl_queue_entity.competitor_id,
            url: insert_crawl_queue_entity.url,
            priority: insert_crawl_queue_entity.priority,
            attempt: insert_crawl_queue_entity.attempt,
            max_attempts: insert_crawl_queue_entity.max_attempts,
            scheduled_for: insert_crawl_queue_entity.scheduled_for,
            created_at: insert_crawl_queue_entity.created_at,
        });
        Ok(EnqueueOutcome::Enqueued(id))
    }

    async fn find_by_competitor(&self, competitor_id: Uuid) -> Result<Option<CrawlQueueEntity>> {
        Ok(self
            .state()
            .crawl_queue
            .iter()
            .find(|q| q.competitor_id == competitor_id)
            .cloned())
    }

    async fn count_ahead(&self, scheduled_for: DateTime<Utc>, priority: i32) -> Result<i64> {
        Ok(queue_position(scheduled_for, priority, &self.state().crawl_queue))
    }
}

#[async_trait]
impl EmailLogRepository for InMemoryStore {
    async fn has_sent(&self, user_id: Uuid, email_type: EmailType) -> Result<bool> {
        let sent = EmailLogStatus::Sent.to_string();
        Ok(self.state().email_logs.iter().any(|log| {
            log.user_id == user_id && log.email_type == email_type.as_str() && log.status == sent
        }))
    }

    async fn record(&self, insert_email_log_entity: InsertEmailLogEntity) -> Result<()> {
        self.state().email_logs.push(EmailLogEntity {
            id: Uuid::new_v4(),
            user_id: insert_email_log_entity.user_id,
            email_type: insert_email_log_entity.email_type,
            recipient: insert_email_log_entity.recipient,
            status: insert_email_log_entity.status,
            error: insert_email_log_entity.error,
            created_at: insert_email_log_entity.created_at,
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Captures outgoing mail; recipients listed in `failing` get an error instead.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(recipient.to_string());
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(to)
        {
            return Err(anyhow!("email api returned non-success status: 503"));
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                html: html.to_string(),
            });
        Ok(())
    }
}
