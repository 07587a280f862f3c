//! Delivery status machine.

use serde::{Deserialize, Serialize};

use crate::transition::TransitionRejected;

/// Shipping status of a delivery.
///
/// ```text
/// Pending ──► InTransit ──► Delivered
///
/// any ──────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    InTransit,
    Delivered,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryTransition {
    Dispatch,
    Deliver,
    Fail,
}

impl DeliveryStatus {
    pub fn can_dispatch(&self) -> bool {
        matches!(self, DeliveryStatus::Pending)
    }

    pub fn can_deliver(&self) -> bool {
        matches!(self, DeliveryStatus::InTransit)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Failed)
    }

    pub fn apply(
        self,
        transition: DeliveryTransition,
    ) -> Result<DeliveryStatus, TransitionRejected<DeliveryStatus>> {
        match transition {
            DeliveryTransition::Dispatch if self.can_dispatch() => Ok(DeliveryStatus::InTransit),
            DeliveryTransition::Dispatch => Err(TransitionRejected {
                from: self,
                message: "Only pending deliveries can be marked as in transit",
            }),
            DeliveryTransition::Deliver if self.can_deliver() => Ok(DeliveryStatus::Delivered),
            DeliveryTransition::Deliver => Err(TransitionRejected {
                from: self,
                message: "Only in-transit deliveries can be marked as delivered",
            }),
            DeliveryTransition::Fail => Ok(DeliveryStatus::Failed),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::InTransit => "IN_TRANSIT",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::Failed => "FAILED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(DeliveryStatus::Pending),
            "IN_TRANSIT" => Some(DeliveryStatus::InTransit),
            "DELIVERED" => Some(DeliveryStatus::Delivered),
            "FAILED" => Some(DeliveryStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
