//! Read-only use cases.

use common::{DomainError, DomainResult, ProductId, TransactionId};
use domain::{Product, Transaction};

use crate::ports::CheckoutPorts;

#[derive(Debug, Clone)]
pub struct GetTransaction {
    ports: CheckoutPorts,
}

impl GetTransaction {
    pub fn new(ports: CheckoutPorts) -> Self {
        Self { ports }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, id: TransactionId) -> DomainResult<Transaction> {
        self.ports
            .transactions
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Transaction", id))
    }
}

#[derive(Debug, Clone)]
pub struct GetTransactionByNumber {
    ports: CheckoutPorts,
}

impl GetTransactionByNumber {
    pub fn new(ports: CheckoutPorts) -> Self {
        Self { ports }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, number: &str) -> DomainResult<Transaction> {
        self.ports
            .transactions
            .find_by_number(number)
            .await?
            .ok_or_else(|| DomainError::not_found("Transaction", number))
    }
}

#[derive(Debug, Clone)]
pub struct GetProduct {
    ports: CheckoutPorts,
}

impl GetProduct {
    pub fn new(ports: CheckoutPorts) -> Self {
        Self { ports }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, id: ProductId) -> DomainResult<Product> {
        self.ports
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", id))
    }
}

/// Lists the whole catalog, oldest first.
#[derive(Debug, Clone)]
pub struct GetAllProducts {
    ports: CheckoutPorts,
}

impl GetAllProducts {
    pub fn new(ports: CheckoutPorts) -> Self {
        Self { ports }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self) -> DomainResult<Vec<Product>> {
        Ok(self.ports.products.find_all().await?)
    }
}
