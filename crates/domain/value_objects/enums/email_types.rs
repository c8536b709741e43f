use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    TrialEnded,
    GracePeriodEnded,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::TrialEnded => "trial_ended",
            EmailType::GracePeriodEnded => "grace_period_ended",
        }
    }
}

impl Display for EmailType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailLogStatus {
    Sent,
    Failed,
}

impl Display for EmailLogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            EmailLogStatus::Sent => "sent",
            EmailLogStatus::Failed => "failed",
        };
        write!(f, "{}", status)
    }
}
