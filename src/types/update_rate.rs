//! Update rate control for loop packet streams

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Update rate for loop packet streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRate {
    /// Every packet the station produces (NM150 emits roughly one per second)
    #[default]
    Native,

    /// At most one packet per this many seconds, latest wins
    /// A period of zero is the same as Native
    EverySecs(u32),
}

impl UpdateRate {
    /// Normalize rate so a zero period becomes Native
    pub fn normalize(self) -> Self {
        match self {
            UpdateRate::EverySecs(0) => UpdateRate::Native,
            other => other,
        }
    }

    /// Get throttle interval if needed
    pub fn throttle_interval(self) -> Option<Duration> {
        match self.normalize() {
            UpdateRate::Native => None,
            UpdateRate::EverySecs(secs) => Some(Duration::from_secs(u64::from(secs))),
        }
    }
}
