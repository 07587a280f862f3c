//! Transaction status machine.

use serde::{Deserialize, Serialize};

use crate::transition::TransitionRejected;

/// Payment status of a checkout transaction.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Approved
///           └──► Declined
///
/// any ─────────► Error
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Created, not yet charged or still being settled by the gateway.
    #[default]
    Pending,

    /// The gateway accepted the charge.
    Approved,

    /// The gateway or a stock check refused the charge.
    Declined,

    /// The charge failed for a technical reason.
    Error,
}

/// A move requested on the transaction machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionTransition {
    Approve,
    Decline,
    MarkAsError,
}

impl TransactionStatus {
    pub fn can_approve(&self) -> bool {
        matches!(self, TransactionStatus::Pending)
    }

    pub fn can_decline(&self) -> bool {
        matches!(self, TransactionStatus::Pending)
    }

    /// Errors can be recorded from any status, terminal ones included.
    pub fn can_mark_as_error(&self) -> bool {
        true
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TransactionStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// Returns the status reached through `transition`, or the reason it
    /// is not allowed from here.
    pub fn apply(
        self,
        transition: TransactionTransition,
    ) -> Result<TransactionStatus, TransitionRejected<TransactionStatus>> {
        match transition {
            TransactionTransition::Approve if self.can_approve() => Ok(TransactionStatus::Approved),
            TransactionTransition::Approve => Err(TransitionRejected {
                from: self,
                message: "Only pending transactions can be approved",
            }),
            TransactionTransition::Decline if self.can_decline() => Ok(TransactionStatus::Declined),
            TransactionTransition::Decline => Err(TransitionRejected {
                from: self,
                message: "Only pending transactions can be declined",
            }),
            TransactionTransition::MarkAsError => Ok(TransactionStatus::Error),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Approved => "APPROVED",
            TransactionStatus::Declined => "DECLINED",
            TransactionStatus::Error => "ERROR",
        }
    }

    /// Parses the stored status name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(TransactionStatus::Pending),
            "APPROVED" => Some(TransactionStatus::Approved),
            "DECLINED" => Some(TransactionStatus::Declined),
            "ERROR" => Some(TransactionStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
