//! Delivery entity, created once a payment is approved.

mod state;

pub use state::{DeliveryStatus, DeliveryTransition};

use chrono::{DateTime, TimeDelta, Utc};
use common::{Clock, DeliveryId, DomainError, DomainResult, IdGenerator, TransactionId, combine};
use serde::{Deserialize, Serialize};

use crate::validation::min_trimmed_len;

/// Days between creating a delivery and its estimated arrival.
pub const ESTIMATED_DELIVERY_DAYS: i64 = 5;

#[derive(Debug, Clone)]
pub struct NewDelivery {
    pub transaction_id: TransactionId,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryProps {
    pub id: DeliveryId,
    pub transaction_id: TransactionId,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub notes: Option<String>,
    pub status: DeliveryStatus,
    pub estimated_delivery: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    id: DeliveryId,
    transaction_id: TransactionId,
    address: String,
    city: String,
    state: String,
    zip_code: String,
    country: String,
    notes: Option<String>,
    status: DeliveryStatus,
    estimated_delivery: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl Delivery {
    pub fn create(
        new: NewDelivery,
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
    ) -> DomainResult<Self> {
        combine([
            min_trimmed_len(&new.address, 5, "Address must be at least 5 characters"),
            min_trimmed_len(&new.city, 2, "City is required"),
            min_trimmed_len(&new.state, 2, "State is required"),
            min_trimmed_len(&new.zip_code, 3, "Zip code is required"),
            min_trimmed_len(&new.country, 2, "Country is required"),
        ])?;

        let now = clock.now();
        Ok(Self {
            id: DeliveryId::from_uuid(ids.next_uuid()),
            transaction_id: new.transaction_id,
            address: new.address,
            city: new.city,
            state: new.state,
            zip_code: new.zip_code,
            country: new.country,
            notes: new.notes,
            status: DeliveryStatus::Pending,
            estimated_delivery: now + TimeDelta::days(ESTIMATED_DELIVERY_DAYS),
            created_at: now,
        })
    }

    pub fn reconstitute(props: DeliveryProps) -> Self {
        Self {
            id: props.id,
            transaction_id: props.transaction_id,
            address: props.address,
            city: props.city,
            state: props.state,
            zip_code: props.zip_code,
            country: props.country,
            notes: props.notes,
            status: props.status,
            estimated_delivery: props.estimated_delivery,
            created_at: props.created_at,
        }
    }

    pub fn id(&self) -> DeliveryId {
        self.id
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn estimated_delivery(&self) -> DateTime<Utc> {
        self.estimated_delivery
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn mark_as_in_transit(&mut self) -> DomainResult<()> {
        self.transition(DeliveryTransition::Dispatch)
    }

    pub fn mark_as_delivered(&mut self) -> DomainResult<()> {
        self.transition(DeliveryTransition::Deliver)
    }

    pub fn mark_as_failed(&mut self) -> DomainResult<()> {
        self.transition(DeliveryTransition::Fail)
    }

    fn transition(&mut self, transition: DeliveryTransition) -> DomainResult<()> {
        self.status = self.status.apply(transition).map_err(DomainError::from)?;
        Ok(())
    }

    pub fn to_props(&self) -> DeliveryProps {
        DeliveryProps {
            id: self.id,
            transaction_id: self.transaction_id,
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            country: self.country.clone(),
            notes: self.notes.clone(),
            status: self.status,
            estimated_delivery: self.estimated_delivery,
            created_at: self.created_at,
        }
    }
}
