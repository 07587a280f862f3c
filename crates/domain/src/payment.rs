//! Payment gateway port.

use async_trait::async_trait;
use common::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw card data as typed by the buyer. Never logged in full.
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub holder: String,
    /// `MM/YY`.
    pub expiration: String,
    pub cvv: String,
}

impl CardDetails {
    /// Splits the `MM/YY` expiry into month and year.
    pub fn expiry_parts(&self) -> Option<(&str, &str)> {
        self.expiration.split_once('/')
    }

    pub fn last_four(&self) -> &str {
        let start = self.number.len().saturating_sub(4);
        self.number.get(start..).unwrap_or_default()
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &format_args!("****{}", self.last_four()))
            .field("holder", &self.holder)
            .field("expiration", &self.expiration)
            .field("cvv", &"***")
            .finish()
    }
}

/// A charge to submit to the gateway.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub amount: Money,
    pub currency: String,
    pub customer_email: String,
    /// Our transaction number; the gateway echoes it back.
    pub reference: String,
    pub card: CardDetails,
}

/// Gateway-side status, already mapped onto our vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Approved,
    Declined,
    Error,
    Pending,
}

impl PaymentStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Approved => "APPROVED",
            PaymentStatus::Declined => "DECLINED",
            PaymentStatus::Error => "ERROR",
            PaymentStatus::Pending => "PENDING",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentResponse {
    /// Gateway transaction id.
    pub id: String,
    pub status: PaymentStatus,
    pub reference: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The gateway could not be reached or timed out.
    #[error("gateway unreachable: {0}")]
    Transport(String),

    /// The gateway answered with an error.
    #[error("{0}")]
    Rejected(String),

    /// The gateway answered with something we could not read.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Tokenizes the card and submits the charge.
    ///
    /// Implementations talking to a remote gateway fold their failures into
    /// an [`PaymentStatus::Error`] response; `Err` is reserved for callers
    /// that cannot produce any response at all.
    async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, GatewayError>;

    /// Looks up the current status of an earlier charge.
    async fn get_transaction_status(
        &self,
        gateway_transaction_id: &str,
    ) -> Result<PaymentResponse, GatewayError>;
}
