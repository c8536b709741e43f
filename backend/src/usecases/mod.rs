pub mod competitors;
pub mod manual_crawl;
pub mod subscriptions;
