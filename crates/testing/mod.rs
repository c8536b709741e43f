//! In-memory stand-ins for the repositories and the email sender, used by
//! the service crates' integration tests.

mod in_memory;

pub use in_memory::{InMemoryStore, RecordingEmailSender, SentEmail};
