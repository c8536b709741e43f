//! Time-boundary rules of the subscription lifecycle.
//!
//! Everything here is pure: callers pass `now` and the policy explicitly, so
//! the same rules back the scheduler, the lifecycle job and the HTTP surface.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    entities::subscriptions::SubscriptionEntity,
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        lifecycle_policy::{GraceWritePolicy, LifecyclePolicy},
    },
};

/// Whether competitors owned by this subscription may be crawled at `now`.
pub fn is_eligible(
    subscription: &SubscriptionEntity,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> bool {
    is_status_eligible(
        subscription.status(),
        subscription.current_period_end,
        now,
        policy,
    )
}

pub fn is_status_eligible(
    status: SubscriptionStatus,
    current_period_end: DateTime<Utc>,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> bool {
    match status {
        SubscriptionStatus::Active => true,
        SubscriptionStatus::Trialing => now <= current_period_end,
        SubscriptionStatus::GracePeriod => now <= policy.grace_deadline(current_period_end),
        SubscriptionStatus::PastDue
        | SubscriptionStatus::Canceled
        | SubscriptionStatus::Expired
        | SubscriptionStatus::Paused => false,
    }
}

/// trialing → grace_period once the trial period is over.
pub fn should_enter_grace_period(
    status: SubscriptionStatus,
    current_period_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    status == SubscriptionStatus::Trialing && now > current_period_end
}

/// grace_period → expired once the grace window is over.
pub fn should_expire(
    status: SubscriptionStatus,
    current_period_end: DateTime<Utc>,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> bool {
    status == SubscriptionStatus::GracePeriod && now > policy.grace_deadline(current_period_end)
}

/// Why a user may not perform a write action such as a manual crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessDenial {
    NoSubscription,
    TrialExpired,
    GracePeriod,
    SubscriptionCanceled,
    SubscriptionInactive,
}

impl AccessDenial {
    pub fn error_code(&self) -> &'static str {
        match self {
            AccessDenial::NoSubscription => "NO_SUBSCRIPTION",
            AccessDenial::TrialExpired => "TRIAL_EXPIRED",
            AccessDenial::GracePeriod => "GRACE_PERIOD",
            AccessDenial::SubscriptionCanceled => "SUBSCRIPTION_CANCELED",
            AccessDenial::SubscriptionInactive => "SUBSCRIPTION_INACTIVE",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            AccessDenial::NoSubscription => {
                "No subscription found. Start a free trial to monitor competitors."
            }
            AccessDenial::TrialExpired => {
                "Your free trial has ended. Upgrade to a paid plan to keep monitoring competitors."
            }
            AccessDenial::GracePeriod => {
                "Your trial has lapsed into its grace period. Upgrade to a paid plan to resume crawling."
            }
            AccessDenial::SubscriptionCanceled => {
                "Your subscription has been canceled. Resubscribe to resume crawling."
            }
            AccessDenial::SubscriptionInactive => {
                "Your subscription is not active. Update your billing details to resume crawling."
            }
        }
    }
}

/// Checks a write action against the user's current subscription.
///
/// With [`GraceWritePolicy::AllowWithinWindow`] this denies exactly when
/// [`is_eligible`] is false; `ReadOnly` additionally denies the whole grace window.
pub fn write_access_denial(
    subscription: Option<&SubscriptionEntity>,
    now: DateTime<Utc>,
    policy: &LifecyclePolicy,
) -> Option<AccessDenial> {
    let Some(subscription) = subscription else {
        return Some(AccessDenial::NoSubscription);
    };

    let period_end = subscription.current_period_end;
    match subscription.status() {
        SubscriptionStatus::Active => None,
        SubscriptionStatus::Trialing if now <= period_end => None,
        SubscriptionStatus::Trialing => Some(AccessDenial::TrialExpired),
        SubscriptionStatus::GracePeriod => match policy.grace_write_policy {
            GraceWritePolicy::ReadOnly => Some(AccessDenial::GracePeriod),
            GraceWritePolicy::AllowWithinWindow if now <= policy.grace_deadline(period_end) => None,
            GraceWritePolicy::AllowWithinWindow => Some(AccessDenial::GracePeriod),
        },
        SubscriptionStatus::Expired if subscription.is_trial_plan(&policy.trial_plan_identifier) => {
            Some(AccessDenial::TrialExpired)
        }
        SubscriptionStatus::Canceled => Some(AccessDenial::SubscriptionCanceled),
        SubscriptionStatus::Expired | SubscriptionStatus::PastDue | SubscriptionStatus::Paused => {
            Some(AccessDenial::SubscriptionInactive)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn subscription(status: SubscriptionStatus, period_end: DateTime<Utc>) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: status.to_string(),
            plan_identifier: "trial".to_string(),
            current_period_start: period_end - Duration::days(14),
            current_period_end: period_end,
            competitor_limit: 3,
            created_at: period_end - Duration::days(14),
            updated_at: period_end - Duration::days(14),
        }
    }

    #[test]
    fn trial_is_eligible_up_to_and_including_period_end() {
        let policy = LifecyclePolicy::default();
        let sub = subscription(SubscriptionStatus::Trialing, t0());

        assert!(is_eligible(&sub, t0() - Duration::days(3), &policy));
        assert!(is_eligible(&sub, t0(), &policy));
        assert!(!is_eligible(&sub, t0() + Duration::milliseconds(1), &policy));
    }

    #[test]
    fn grace_window_spans_configured_days_after_period_end() {
        let policy = LifecyclePolicy::default();
        let sub = subscription(SubscriptionStatus::GracePeriod, t0());

        assert!(is_eligible(&sub, t0(), &policy));
        assert!(is_eligible(&sub, t0() + Duration::days(1), &policy));
        assert!(is_eligible(&sub, t0() + Duration::days(3), &policy));
        assert!(!is_eligible(
            &sub,
            t0() + Duration::days(3) + Duration::milliseconds(1),
            &policy
        ));
    }

    #[test]
    fn grace_window_follows_injected_policy() {
        let policy = LifecyclePolicy {
            grace_period_days: 7,
            ..LifecyclePolicy::default()
        };
        let sub = subscription(SubscriptionStatus::GracePeriod, t0());

        assert!(is_eligible(&sub, t0() + Duration::days(6), &policy));
        assert!(!is_eligible(&sub, t0() + Duration::days(8), &policy));
    }

    #[test]
    fn paused_is_never_eligible_even_with_future_period() {
        let policy = LifecyclePolicy::default();
        let sub = subscription(SubscriptionStatus::Paused, t0() + Duration::days(365));

        assert!(!is_eligible(&sub, t0(), &policy));
    }

    #[test]
    fn active_is_eligible_regardless_of_period_dates() {
        let policy = LifecyclePolicy::default();
        let sub = subscription(SubscriptionStatus::Active, t0() - Duration::days(90));

        assert!(is_eligible(&sub, t0(), &policy));
    }

    #[test]
    fn terminal_and_past_due_statuses_are_not_eligible() {
        let policy = LifecyclePolicy::default();
        for status in [
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Canceled,
            SubscriptionStatus::Expired,
        ] {
            let sub = subscription(status, t0() + Duration::days(30));
            assert!(!is_eligible(&sub, t0(), &policy), "{status} must not be eligible");
        }
    }

    #[test]
    fn unknown_stored_status_is_not_eligible() {
        let policy = LifecyclePolicy::default();
        let mut sub = subscription(SubscriptionStatus::Active, t0() + Duration::days(30));
        sub.status = "legacy_vip".to_string();

        assert!(!is_eligible(&sub, t0(), &policy));
    }

    #[test]
    fn transition_predicates_use_strict_boundaries() {
        let policy = LifecyclePolicy::default();

        assert!(!should_enter_grace_period(SubscriptionStatus::Trialing, t0(), t0()));
        assert!(should_enter_grace_period(
            SubscriptionStatus::Trialing,
            t0(),
            t0() + Duration::milliseconds(1)
        ));
        assert!(!should_enter_grace_period(
            SubscriptionStatus::Active,
            t0(),
            t0() + Duration::days(1)
        ));

        let deadline = t0() + Duration::days(3);
        assert!(!should_expire(SubscriptionStatus::GracePeriod, t0(), deadline, &policy));
        assert!(should_expire(
            SubscriptionStatus::GracePeriod,
            t0(),
            deadline + Duration::milliseconds(1),
            &policy
        ));
        assert!(!should_expire(
            SubscriptionStatus::Trialing,
            t0(),
            deadline + Duration::days(1),
            &policy
        ));
    }

    #[test]
    fn write_access_matches_eligibility_in_default_mode() {
        let policy = LifecyclePolicy::default();
        let offsets = [-5, -1, 0, 1, 2, 3, 4, 10];

        for status in SubscriptionStatus::ALL {
            for offset in offsets {
                let sub = subscription(status, t0());
                let now = t0() + Duration::days(offset);
                assert_eq!(
                    write_access_denial(Some(&sub), now, &policy).is_none(),
                    is_eligible(&sub, now, &policy),
                    "status {status} at offset {offset}d"
                );
            }
        }
    }

    #[test]
    fn write_access_reports_distinct_denials() {
        let policy = LifecyclePolicy::default();
        let now = t0();

        assert_eq!(
            write_access_denial(None, now, &policy),
            Some(AccessDenial::NoSubscription)
        );

        let trial = subscription(SubscriptionStatus::Trialing, now - Duration::hours(1));
        assert_eq!(
            write_access_denial(Some(&trial), now, &policy),
            Some(AccessDenial::TrialExpired)
        );

        let grace = subscription(SubscriptionStatus::GracePeriod, now - Duration::days(4));
        assert_eq!(
            write_access_denial(Some(&grace), now, &policy),
            Some(AccessDenial::GracePeriod)
        );

        let canceled = subscription(SubscriptionStatus::Canceled, now + Duration::days(4));
        assert_eq!(
            write_access_denial(Some(&canceled), now, &policy),
            Some(AccessDenial::SubscriptionCanceled)
        );

        let past_due = subscription(SubscriptionStatus::PastDue, now + Duration::days(4));
        assert_eq!(
            write_access_denial(Some(&past_due), now, &policy),
            Some(AccessDenial::SubscriptionInactive)
        );

        let expired_trial = subscription(SubscriptionStatus::Expired, now - Duration::days(10));
        assert_eq!(
            write_access_denial(Some(&expired_trial), now, &policy),
            Some(AccessDenial::TrialExpired)
        );

        let mut expired_paid = expired_trial.clone();
        expired_paid.plan_identifier = "pro_monthly".to_string();
        assert_eq!(
            write_access_denial(Some(&expired_paid), now, &policy),
            Some(AccessDenial::SubscriptionInactive)
        );
    }

    #[test]
    fn read_only_grace_policy_denies_whole_window() {
        let policy = LifecyclePolicy {
            grace_write_policy: GraceWritePolicy::ReadOnly,
            ..LifecyclePolicy::default()
        };
        let sub = subscription(SubscriptionStatus::GracePeriod, t0());

        assert!(is_eligible(&sub, t0() + Duration::days(1), &policy));
        assert_eq!(
            write_access_denial(Some(&sub), t0() + Duration::days(1), &policy),
            Some(AccessDenial::GracePeriod)
        );
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AccessDenial::NoSubscription.error_code(), "NO_SUBSCRIPTION");
        assert_eq!(AccessDenial::TrialExpired.error_code(), "TRIAL_EXPIRED");
        assert_eq!(AccessDenial::GracePeriod.error_code(), "GRACE_PERIOD");
        assert_eq!(
            AccessDenial::SubscriptionCanceled.error_code(),
            "SUBSCRIPTION_CANCELED"
        );
        assert_eq!(
            AccessDenial::SubscriptionInactive.error_code(),
            "SUBSCRIPTION_INACTIVE"
        );
    }
}
