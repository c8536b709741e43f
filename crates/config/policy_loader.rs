use anyhow::{Context, Result, bail};
use std::str::FromStr;

use crate::{
    domain::value_objects::lifecycle_policy::{
        DEFAULT_CRAWL_MAX_ATTEMPTS, DEFAULT_GRACE_PERIOD_DAYS, DEFAULT_LIFECYCLE_BATCH_SIZE,
        DEFAULT_SCHEDULER_BATCH_LIMIT, DEFAULT_TRIAL_COMPETITOR_LIMIT,
        DEFAULT_TRIAL_DURATION_DAYS, DEFAULT_TRIAL_PLAN_IDENTIFIER, GraceWritePolicy,
        LifecyclePolicy, SchedulerSettings, UNLIMITED_COMPETITORS,
    },
    observability::parse_bool,
};

/// Upper bound for day-valued knobs.
const MAX_POLICY_DAYS: i64 = 3650;

pub fn load_lifecycle_policy() -> Result<LifecyclePolicy> {
    dotenvy::dotenv().ok();
    lifecycle_policy_from(|key| std::env::var(key).ok())
}

pub fn load_scheduler_settings() -> Result<SchedulerSettings> {
    dotenvy::dotenv().ok();
    scheduler_settings_from(|key| std::env::var(key).ok())
}

pub(crate) fn lifecycle_policy_from<F>(lookup: F) -> Result<LifecyclePolicy>
where
    F: Fn(&str) -> Option<String>,
{
    let grace_period_days: i64 = parse_or(&lookup, "GRACE_PERIOD_DAYS", DEFAULT_GRACE_PERIOD_DAYS)?;
    if !(0..=MAX_POLICY_DAYS).contains(&grace_period_days) {
        bail!("GRACE_PERIOD_DAYS must be between 0 and {MAX_POLICY_DAYS}");
    }

    let trial_duration_days: i64 =
        parse_or(&lookup, "TRIAL_DURATION_DAYS", DEFAULT_TRIAL_DURATION_DAYS)?;
    if !(1..=MAX_POLICY_DAYS).contains(&trial_duration_days) {
        bail!("TRIAL_DURATION_DAYS must be between 1 and {MAX_POLICY_DAYS}");
    }

    let trial_competitor_limit: i32 = parse_or(
        &lookup,
        "TRIAL_COMPETITOR_LIMIT",
        DEFAULT_TRIAL_COMPETITOR_LIMIT,
    )?;
    if trial_competitor_limit < UNLIMITED_COMPETITORS {
        bail!("TRIAL_COMPETITOR_LIMIT must be {UNLIMITED_COMPETITORS} (unlimited) or more");
    }

    let trial_plan_identifier = lookup("TRIAL_PLAN_IDENTIFIER")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_TRIAL_PLAN_IDENTIFIER.to_string());

    let block_writes = match lookup("BLOCK_WRITES_DURING_GRACE") {
        Some(raw) if !raw.trim().is_empty() => {
            parse_bool(&raw).context("BLOCK_WRITES_DURING_GRACE is invalid")?
        }
        _ => false,
    };

    Ok(LifecyclePolicy {
        grace_period_days,
        trial_duration_days,
        trial_competitor_limit,
        trial_plan_identifier,
        grace_write_policy: if block_writes {
            GraceWritePolicy::ReadOnly
        } else {
            GraceWritePolicy::AllowWithinWindow
        },
    })
}

pub(crate) fn scheduler_settings_from<F>(lookup: F) -> Result<SchedulerSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let batch_limit: i64 = parse_or(&lookup, "SCHEDULER_BATCH_LIMIT", DEFAULT_SCHEDULER_BATCH_LIMIT)?;
    let lifecycle_batch_size: i64 =
        parse_or(&lookup, "LIFECYCLE_BATCH_SIZE", DEFAULT_LIFECYCLE_BATCH_SIZE)?;
    let crawl_max_attempts: i32 =
        parse_or(&lookup, "CRAWL_MAX_ATTEMPTS", DEFAULT_CRAWL_MAX_ATTEMPTS)?;

    if batch_limit <= 0 {
        bail!("SCHEDULER_BATCH_LIMIT must be positive");
    }
    if lifecycle_batch_size <= 0 {
        bail!("LIFECYCLE_BATCH_SIZE must be positive");
    }
    if crawl_max_attempts <= 0 {
        bail!("CRAWL_MAX_ATTEMPTS must be positive");
    }

    Ok(SchedulerSettings {
        batch_limit,
        lifecycle_batch_size,
        crawl_max_attempts,
    })
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} is invalid")),
        _ => Ok(default),
    }
}
