//! Checkout transaction entity.

pub mod number;
mod state;

pub use state::{TransactionStatus, TransactionTransition};

use chrono::{DateTime, Utc};
use common::{
    Clock, CustomerId, DomainError, DomainResult, IdGenerator, Money, ProductId, TransactionId,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Input for [`Transaction::create`].
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub product_amount: Money,
    pub base_fee: Money,
    pub delivery_fee: Money,
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionProps {
    pub id: TransactionId,
    pub transaction_number: String,
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub product_amount: Money,
    pub base_fee: Money,
    pub delivery_fee: Money,
    pub total_amount: Money,
    pub status: TransactionStatus,
    pub gateway_transaction_id: Option<String>,
    pub payment_method: String,
    pub payment_data: Option<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchase attempt for one unit of a product.
///
/// The total is fixed at creation. Status moves go through
/// [`TransactionStatus::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    id: TransactionId,
    transaction_number: String,
    product_id: ProductId,
    customer_id: CustomerId,
    product_amount: Money,
    base_fee: Money,
    delivery_fee: Money,
    total_amount: Money,
    status: TransactionStatus,
    gateway_transaction_id: Option<String>,
    payment_method: String,
    payment_data: Option<Map<String, Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Validates the amounts and creates a pending transaction.
    pub fn create(
        new: NewTransaction,
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> DomainResult<Self> {
        if !new.product_amount.is_positive() {
            return Err(DomainError::validation("Product amount must be positive"));
        }
        if new.base_fee.is_negative() {
            return Err(DomainError::validation("Base fee must be non-negative"));
        }
        if new.delivery_fee.is_negative() {
            return Err(DomainError::validation("Delivery fee must be non-negative"));
        }
        if new.payment_method.trim().is_empty() {
            return Err(DomainError::validation("Payment method is required"));
        }

        let total_amount = new
            .product_amount
            .checked_add(new.base_fee)
            .and_then(|sum| sum.checked_add(new.delivery_fee))
            .ok_or_else(|| DomainError::validation("Total amount is too large"))?;

        let now = clock.now();
        Ok(Self {
            id: TransactionId::from_uuid(ids.next_uuid()),
            transaction_number: number::generate(now, ids),
            product_id: new.product_id,
            customer_id: new.customer_id,
            product_amount: new.product_amount,
            base_fee: new.base_fee,
            delivery_fee: new.delivery_fee,
            total_amount,
            status: TransactionStatus::Pending,
            gateway_transaction_id: None,
            payment_method: new.payment_method,
            payment_data: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn reconstitute(props: TransactionProps) -> Self {
        Self {
            id: props.id,
            transaction_number: props.transaction_number,
            product_id: props.product_id,
            customer_id: props.customer_id,
            product_amount: props.product_amount,
            base_fee: props.base_fee,
            delivery_fee: props.delivery_fee,
            total_amount: props.total_amount,
            status: props.status,
            gateway_transaction_id: props.gateway_transaction_id,
            payment_method: props.payment_method,
            payment_data: props.payment_data,
            created_at: props.created_at,
            updated_at: props.updated_at,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn transaction_number(&self) -> &str {
        &self.transaction_number
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn product_amount(&self) -> Money {
        self.product_amount
    }

    pub fn base_fee(&self) -> Money {
        self.base_fee
    }

    pub fn delivery_fee(&self) -> Money {
        self.delivery_fee
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn gateway_transaction_id(&self) -> Option<&str> {
        self.gateway_transaction_id.as_deref()
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn payment_data(&self) -> Option<&Map<String, Value>> {
        self.payment_data.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records a successful charge.
    pub fn approve(
        &mut self,
        gateway_transaction_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.status = self.status.apply(TransactionTransition::Approve)?;
        self.gateway_transaction_id = Some(gateway_transaction_id.into());
        self.updated_at = now;
        Ok(())
    }

    /// Records a refused charge, keeping the reason when one is given.
    pub fn decline(&mut self, reason: Option<&str>, now: DateTime<Utc>) -> DomainResult<()> {
        self.status = self.status.apply(TransactionTransition::Decline)?;
        if let Some(reason) = reason {
            self.merge_payment_data("declineReason", reason);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Records a technical failure. Allowed from every status, including
    /// ones that are already settled.
    pub fn mark_as_error(&mut self, message: &str, now: DateTime<Utc>) -> DomainResult<()> {
        self.status = self.status.apply(TransactionTransition::MarkAsError)?;
        self.merge_payment_data("error", message);
        self.updated_at = now;
        Ok(())
    }

    fn merge_payment_data(&mut self, key: &str, value: &str) {
        self.payment_data
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    pub fn to_props(&self) -> TransactionProps {
        TransactionProps {
            id: self.id,
            transaction_number: self.transaction_number.clone(),
            product_id: self.product_id,
            customer_id: self.customer_id,
            product_amount: self.product_amount,
            base_fee: self.base_fee,
            delivery_fee: self.delivery_fee,
            total_amount: self.total_amount,
            status: self.status,
            gateway_transaction_id: self.gateway_transaction_id.clone(),
            payment_method: self.payment_method.clone(),
            payment_data: self.payment_data.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
