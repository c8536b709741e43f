pub mod due_set_selector;
pub mod lifecycle_transitions;
pub mod scheduling_pass;
pub mod subscription_activation;

use std::time::Instant;

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
