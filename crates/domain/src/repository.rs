//! Persistence contracts for the checkout entities.

use async_trait::async_trait;
use common::{CustomerId, DeliveryId, DomainError, ProductId, TransactionId};
use thiserror::Error;

use crate::{Customer, Delivery, Product, Transaction};

/// Errors raised by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The row to update does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A conditional stock decrement matched no row.
    #[error("Insufficient stock. Available: {available}")]
    InsufficientStock { available: u32 },

    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored row could not be turned back into an entity.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => DomainError::not_found(entity, id),
            RepositoryError::InsufficientStock { available } => {
                DomainError::insufficient_stock(available)
            }
            RepositoryError::Conflict(msg) => DomainError::conflict(msg),
            other => DomainError::internal(other.to_string()),
        }
    }
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>>;

    async fn find_all(&self) -> RepositoryResult<Vec<Product>>;

    async fn save(&self, product: &Product) -> RepositoryResult<Product>;

    async fn update(&self, product: &Product) -> RepositoryResult<Product>;

    /// Removes `quantity` units in a single conditional step.
    ///
    /// Fails with [`RepositoryError::InsufficientStock`] when fewer units
    /// remain; the stored stock is left untouched in that case.
    async fn decrement_stock(&self, id: ProductId, quantity: u32) -> RepositoryResult<Product>;

    async fn delete(&self, id: ProductId) -> RepositoryResult<()>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: CustomerId) -> RepositoryResult<Option<Customer>>;

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Customer>>;

    async fn save(&self, customer: &Customer) -> RepositoryResult<Customer>;

    async fn update(&self, customer: &Customer) -> RepositoryResult<Customer>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: TransactionId) -> RepositoryResult<Option<Transaction>>;

    async fn find_by_number(&self, number: &str) -> RepositoryResult<Option<Transaction>>;

    /// Newest first.
    async fn find_by_customer_id(&self, id: CustomerId) -> RepositoryResult<Vec<Transaction>>;

    async fn save(&self, transaction: &Transaction) -> RepositoryResult<Transaction>;

    async fn update(&self, transaction: &Transaction) -> RepositoryResult<Transaction>;
}

#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    async fn find_by_id(&self, id: DeliveryId) -> RepositoryResult<Option<Delivery>>;

    async fn find_by_transaction_id(
        &self,
        id: TransactionId,
    ) -> RepositoryResult<Option<Delivery>>;

    async fn save(&self, delivery: &Delivery) -> RepositoryResult<Delivery>;

    async fn update(&self, delivery: &Delivery) -> RepositoryResult<Delivery>;
}
