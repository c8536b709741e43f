pub mod competitors;
pub mod crawl_queue;
pub mod email_logs;
pub mod subscriptions;
