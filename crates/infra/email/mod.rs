pub mod http_email_sender;
pub mod templates;
