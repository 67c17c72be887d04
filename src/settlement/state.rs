//! Settlement status ordering
//!
//! ```text
//! INITIATED ──▶ PROCESSING ──┬──▶ COMPLETED
//!     │                      └──▶ FAILED
//!     └──────────────────────────▶ COMPLETED | FAILED
//! ```
//!
//! Status only moves forward. Completed and failed are both final.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Initiated,
    Processing,
    Completed,
    Failed,
}

impl SettlementStatus {
    fn rank(&self) -> u8 {
        match self {
            SettlementStatus::Initiated => 0,
            SettlementStatus::Processing => 1,
            SettlementStatus::Completed | SettlementStatus::Failed => 2,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }

    /// Strict forward progress
    pub fn can_advance_to(&self, next: SettlementStatus) -> bool {
        next.rank() > self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Initiated => "initiated",
            SettlementStatus::Processing => "processing",
            SettlementStatus::Completed => "completed",
            SettlementStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "initiated" => Ok(SettlementStatus::Initiated),
            "processing" => Ok(SettlementStatus::Processing),
            "completed" => Ok(SettlementStatus::Completed),
            "failed" => Ok(SettlementStatus::Failed),
            _ => Err(format!("Invalid settlement status: {}", s)),
        }
    }
}
