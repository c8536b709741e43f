use anyhow::Result;
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::{email_logs::InsertEmailLogEntity, subscriptions::SubscriptionEntity},
    repositories::{
        email_logs::EmailLogRepository,
        notifications::{EmailSender, TemplateRenderer},
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        eligibility::{should_enter_grace_period, should_expire},
        enums::{
            email_types::{EmailLogStatus, EmailType},
            subscription_statuses::SubscriptionStatus,
        },
        lifecycle_policy::{LifecyclePolicy, SchedulerSettings},
        subscriptions::LifecycleCandidate,
    },
};
use serde::Serialize;
use serde_json::{Value, json};
use std::{sync::Arc, time::Instant};
use tracing::{error, info, warn};

use super::elapsed_ms;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseStats {
    pub candidates: usize,
    pub transitioned: usize,
    pub notifications_sent: usize,
    pub notifications_skipped: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecyclePassStats {
    pub trial_to_grace: PhaseStats,
    pub grace_to_expired: PhaseStats,
    #[serde(skip)]
    pub elapsed_ms: u64,
}

/// One direction of the trial lifecycle and the email that announces it.
#[derive(Debug, Clone, Copy)]
struct Phase {
    name: &'static str,
    from: SubscriptionStatus,
    to: SubscriptionStatus,
    email_type: EmailType,
    is_due: fn(&SubscriptionEntity, DateTime<Utc>, &LifecyclePolicy) -> bool,
}

fn trial_has_lapsed(
    subscription: &SubscriptionEntity,
    now: DateTime<Utc>,
    _policy: &LifecyclePolicy,
) -> bool {
    should_enter_grace_period(subscription.status(), subscription.current_period_end, now)
}

fn grace_has_lapsed(
    subscription: &SubscriptionEntity,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> bool {
    should_expire(subscription.status(), subscription.current_period_end, now, policy)
}

const TRIAL_TO_GRACE: Phase = Phase {
    name: "trial_to_grace",
    from: SubscriptionStatus::Trialing,
    to: SubscriptionStatus::GracePeriod,
    email_type: EmailType::TrialEnded,
    is_due: trial_has_lapsed,
};

const GRACE_TO_EXPIRED: Phase = Phase {
    name: "grace_to_expired",
    from: SubscriptionStatus::GracePeriod,
    to: SubscriptionStatus::Expired,
    email_type: EmailType::GracePeriodEnded,
    is_due: grace_has_lapsed,
};

pub struct LifecycleTransitionUseCase {
    subscription_repository: Arc<dyn SubscriptionRepository + Send + Sync>,
    email_log_repository: Arc<dyn EmailLogRepository + Send + Sync>,
    email_sender: Arc<dyn EmailSender + Send + Sync>,
    template_renderer: Arc<dyn TemplateRenderer + Send + Sync>,
    policy: LifecyclePolicy,
    settings: SchedulerSettings,
    app_base_url: String,
}

impl LifecycleTransitionUseCase {
    pub fn new(
        subscription_repository: Arc<dyn SubscriptionRepository + Send + Sync>,
        email_log_repository: Arc<dyn EmailLogRepository + Send + Sync>,
        email_sender: Arc<dyn EmailSender + Send + Sync>,
        template_renderer: Arc<dyn TemplateRenderer + Send + Sync>,
        policy: LifecyclePolicy,
        settings: SchedulerSettings,
        app_base_url: String,
    ) -> Self {
        Self {
            subscription_repository,
            email_log_repository,
            email_sender,
            template_renderer,
            policy,
            settings,
            app_base_url,
        }
    }

    /// Moves lapsed trials into grace, then lapsed grace periods to expired.
    /// Each subscription is handled on its own; a listing failure aborts.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<LifecyclePassStats> {
        let started = Instant::now();

        let trial_to_grace = self.run_phase(TRIAL_TO_GRACE, now, now).await?;

        let grace_cutoff = now - self.policy.grace_period();
        let grace_to_expired = self.run_phase(GRACE_TO_EXPIRED, grace_cutoff, now).await?;

        let stats = LifecyclePassStats {
            trial_to_grace,
            grace_to_expired,
            elapsed_ms: elapsed_ms(started),
        };

        info!(
            trial_candidates = stats.trial_to_grace.candidates,
            trial_transitioned = stats.trial_to_grace.transitioned,
            grace_candidates = stats.grace_to_expired.candidates,
            grace_transitioned = stats.grace_to_expired.transitioned,
            errors = stats.trial_to_grace.errors + stats.grace_to_expired.errors,
            elapsed_ms = stats.elapsed_ms,
            "expire_subscriptions: completed"
        );

        Ok(stats)
    }

    async fn run_phase(
        &self,
        phase: Phase,
        period_end_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<PhaseStats> {
        let candidates = self
            .subscription_repository
            .list_lifecycle_candidates(
                phase.from,
                self.policy.trial_plan_identifier.clone(),
                period_end_before,
                self.settings.lifecycle_batch_size,
            )
            .await?;

        let mut stats = PhaseStats {
            candidates: candidates.len(),
            ..Default::default()
        };

        for candidate in &candidates {
            self.process_candidate(phase, candidate, now, &mut stats).await;
        }

        info!(
            phase = phase.name,
            candidates = stats.candidates,
            transitioned = stats.transitioned,
            notifications_sent = stats.notifications_sent,
            notifications_skipped = stats.notifications_skipped,
            errors = stats.errors,
            "expire_subscriptions: phase completed"
        );

        Ok(stats)
    }

    async fn process_candidate(
        &self,
        phase: Phase,
        candidate: &LifecycleCandidate,
        now: DateTime<Utc>,
        stats: &mut PhaseStats,
    ) {
        let subscription_id = candidate.subscription.id;
        let user_id = candidate.subscription.user_id;

        // The listing query is only a prefilter; the domain rule decides.
        if !(phase.is_due)(&candidate.subscription, now, &self.policy) {
            info!(
                %subscription_id,
                %user_id,
                phase = phase.name,
                current_period_end = %candidate.subscription.current_period_end,
                "expire_subscriptions: candidate not yet due; skipping"
            );
            return;
        }

        match self
            .subscription_repository
            .transition_status(subscription_id, phase.from, phase.to, now)
            .await
        {
            Ok(true) => {
                stats.transitioned += 1;
                info!(
                    %subscription_id,
                    %user_id,
                    from = %phase.from,
                    to = %phase.to,
                    "expire_subscriptions: status transitioned"
                );
            }
            Ok(false) => {
                info!(
                    %subscription_id,
                    phase = phase.name,
                    "expire_subscriptions: already transitioned by another pass; no email"
                );
                return;
            }
            Err(err) => {
                stats.errors += 1;
                error!(
                    %subscription_id,
                    %user_id,
                    error = ?err,
                    "expire_subscriptions: failed to transition status"
                );
                return;
            }
        }

        self.notify(phase.email_type, candidate, now, stats).await;
    }

    /// Sends `email_type` unless a successful send is already logged.
    /// Failures are recorded and never undo the transition.
    async fn notify(
        &self,
        email_type: EmailType,
        candidate: &LifecycleCandidate,
        now: DateTime<Utc>,
        stats: &mut PhaseStats,
    ) {
        let user_id = candidate.subscription.user_id;

        match self.email_log_repository.has_sent(user_id, email_type).await {
            Ok(true) => {
                stats.notifications_skipped += 1;
                info!(
                    %user_id,
                    email_type = %email_type,
                    "expire_subscriptions: notification already sent; skipping"
                );
                return;
            }
            Ok(false) => {}
            Err(err) => {
                stats.errors += 1;
                error!(
                    %user_id,
                    email_type = %email_type,
                    error = ?err,
                    "expire_subscriptions: failed to check email log; not sending"
                );
                return;
            }
        }

        let subject = self.template_renderer.subject(email_type);
        let delivery = match self
            .template_renderer
            .render(email_type, &self.template_data(candidate))
        {
            Ok(html) => {
                self.email_sender
                    .send_email(&candidate.email, &subject, &html)
                    .await
            }
            Err(err) => Err(err),
        };

        let (status, error_text) = match delivery {
            Ok(()) => {
                stats.notifications_sent += 1;
                (EmailLogStatus::Sent, None)
            }
            Err(err) => {
                stats.errors += 1;
                error!(
                    %user_id,
                    email_type = %email_type,
                    error = ?err,
                    "expire_subscriptions: failed to send notification"
                );
                (EmailLogStatus::Failed, Some(err.to_string()))
            }
        };

        let log = InsertEmailLogEntity {
            user_id,
            email_type: email_type.to_string(),
            recipient: candidate.email.clone(),
            status: status.to_string(),
            error: error_text,
            created_at: now,
        };

        if let Err(err) = self.email_log_repository.record(log).await {
            warn!(
                %user_id,
                email_type = %email_type,
                error = ?err,
                "expire_subscriptions: failed to record email log"
            );
        }
    }

    fn template_data(&self, candidate: &LifecycleCandidate) -> Value {
        let period_end = candidate.subscription.current_period_end;
        let name = candidate
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("there");

        json!({
            "name": name,
            "trial_ended_at": period_end.format("%B %-d, %Y").to_string(),
            "grace_period_days": self.policy.grace_period_days,
            "grace_ends_at": self.policy.grace_deadline(period_end).format("%B %-d, %Y").to_string(),
            "upgrade_url": format!("{}/billing", self.app_base_url.trim_end_matches('/')),
        })
    }
}
