pub mod config;
pub mod domain;
pub mod infra;
pub mod observability;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
