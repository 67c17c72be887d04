//! Transaction status lifecycle
//!
//! ```text
//!            ┌──▶ CONFIRMED
//! PENDING ───┼──▶ FAILED
//!            └──▶ CANCELLED
//! ```
//!
//! Every terminal status is final. A record is created `pending` before the
//! transfer is attempted and leaves `pending` exactly once.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded, transfer submitted or about to be submitted
    Pending,
    /// Terminal: the executor returned a receipt
    Confirmed,
    /// Terminal: the executor reported a definitive failure
    Failed,
    /// Terminal: withdrawn by an operator before execution
    Cancelled,
}

impl TransactionStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(self, TransactionStatus::Pending) && next.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "confirmed" => Ok(TransactionStatus::Confirmed),
            "failed" => Ok(TransactionStatus::Failed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

/// Direction of a transaction relative to the position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Withdrawal,
    Deposit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Deposit => "deposit",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "deposit" => Ok(TransactionType::Deposit),
            _ => Err(format!("Invalid transaction type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(TransactionStatus::Confirmed.is_terminal());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_only_pending_moves() {
        use TransactionStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Pending));

        for terminal in [Confirmed, Failed, Cancelled] {
            for next in [Pending, Confirmed, Failed, Cancelled] {
                assert!(
                    !terminal.can_transition_to(next),
                    "{} -> {} must be rejected",
                    terminal,
                    next
                );
            }
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
        assert_eq!(
            "failed".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Failed
        );
        assert!("FAILED".parse::<TransactionStatus>().is_err());
        assert_eq!(
            "withdrawal".parse::<TransactionType>().unwrap(),
            TransactionType::Withdrawal
        );
    }
}
