pub mod email_types;
pub mod subscription_statuses;
