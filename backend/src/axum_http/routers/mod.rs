pub mod competitors;
pub mod crawls;
pub mod subscriptions;
