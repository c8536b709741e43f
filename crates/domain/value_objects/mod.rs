pub mod competitors;
pub mod crawl_scheduling;
pub mod eligibility;
pub mod enums;
pub mod lifecycle_policy;
pub mod subscriptions;
