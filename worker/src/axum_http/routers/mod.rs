pub mod cron;
pub mod subscriptions;
