use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Clock, CustomerId, DeliveryId, ErrorCode, ProductId, SystemClock, TransactionId};
use domain::{
    Customer, CustomerRepository, Delivery, DeliveryRepository, Product, ProductRepository,
    RepositoryError, RepositoryResult, Transaction, TransactionRepository,
};
use tokio::sync::RwLock;

/// In-memory store for tests and database-less runs.
///
/// One clonable handle implements every repository trait and enforces the
/// same uniqueness rules as the PostgreSQL schema.
///
/// Stock decrements stamp `updated_at` from the store's [`Clock`].
#[derive(Clone)]
pub struct InMemoryStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
    transactions: Arc<RwLock<HashMap<TransactionId, Transaction>>>,
    deliveries: Arc<RwLock<HashMap<DeliveryId, Delivery>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    /// Creates a new empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            products: Arc::default(),
            customers: Arc::default(),
            transactions: Arc::default(),
            deliveries: Arc::default(),
            clock,
        }
    }

    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn customer_count(&self) -> usize {
        self.customers.read().await.len()
    }

    pub async fn transaction_count(&self) -> usize {
        self.transactions.read().await.len()
    }

    pub async fn delivery_count(&self) -> usize {
        self.deliveries.read().await.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> RepositoryError {
    RepositoryError::NotFound {
        entity,
        id: id.to_string(),
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by_key(|p| (p.created_at(), p.id()));
        Ok(products)
    }

    async fn save(&self, product: &Product) -> RepositoryResult<Product> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id()) {
            return Err(RepositoryError::Conflict(format!(
                "product {} already exists",
                product.id()
            )));
        }
        products.insert(product.id(), product.clone());
        Ok(product.clone())
    }

    async fn update(&self, product: &Product) -> RepositoryResult<Product> {
        let mut products = self.products.write().await;
        let stored = products
            .get_mut(&product.id())
            .ok_or_else(|| not_found("Product", product.id()))?;
        *stored = product.clone();
        Ok(product.clone())
    }

    async fn decrement_stock(&self, id: ProductId, quantity: u32) -> RepositoryResult<Product> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or_else(|| not_found("Product", id))?;
        let available = product.stock();
        product
            .decrease_stock(quantity, self.clock.now())
            .map_err(|err| match err.code() {
                ErrorCode::InsufficientStock => RepositoryError::InsufficientStock { available },
                _ => RepositoryError::Storage(err.message().to_string()),
            })?;
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> RepositoryResult<()> {
        self.products.write().await.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn find_by_id(&self, id: CustomerId) -> RepositoryResult<Option<Customer>> {
        Ok(self.customers.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Customer>> {
        Ok(self
            .customers
            .read()
            .await
            .values()
            .find(|c| c.email() == email)
            .cloned())
    }

    async fn save(&self, customer: &Customer) -> RepositoryResult<Customer> {
        let mut customers = self.customers.write().await;
        if customers
            .values()
            .any(|c| c.id() == customer.id() || c.email() == customer.email())
        {
            return Err(RepositoryError::Conflict(format!(
                "customer with email {} already exists",
                customer.email()
            )));
        }
        customers.insert(customer.id(), customer.clone());
        Ok(customer.clone())
    }

    async fn update(&self, customer: &Customer) -> RepositoryResult<Customer> {
        let mut customers = self.customers.write().await;
        let stored = customers
            .get_mut(&customer.id())
            .ok_or_else(|| not_found("Customer", customer.id()))?;
        *stored = customer.clone();
        Ok(customer.clone())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn find_by_id(&self, id: TransactionId) -> RepositoryResult<Option<Transaction>> {
        Ok(self.transactions.read().await.get(&id).cloned())
    }

    async fn find_by_number(&self, number: &str) -> RepositoryResult<Option<Transaction>> {
        Ok(self
            .transactions
            .read()
            .await
            .values()
            .find(|t| t.transaction_number() == number)
            .cloned())
    }

    async fn find_by_customer_id(&self, id: CustomerId) -> RepositoryResult<Vec<Transaction>> {
        let mut found: Vec<Transaction> = self
            .transactions
            .read()
            .await
            .values()
            .filter(|t| t.customer_id() == id)
            .cloned()
            .collect();
        found.sort_by_key(|t| std::cmp::Reverse(t.created_at()));
        Ok(found)
    }

    async fn save(&self, transaction: &Transaction) -> RepositoryResult<Transaction> {
        let mut transactions = self.transactions.write().await;
        if transactions.values().any(|t| {
            t.id() == transaction.id()
                || t.transaction_number() == transaction.transaction_number()
        }) {
            return Err(RepositoryError::Conflict(format!(
                "transaction {} already exists",
                transaction.transaction_number()
            )));
        }
        transactions.insert(transaction.id(), transaction.clone());
        Ok(transaction.clone())
    }

    async fn update(&self, transaction: &Transaction) -> RepositoryResult<Transaction> {
        let mut transactions = self.transactions.write().await;
        let stored = transactions
            .get_mut(&transaction.id())
            .ok_or_else(|| not_found("Transaction", transaction.id()))?;
        *stored = transaction.clone();
        Ok(transaction.clone())
    }
}

#[async_trait]
impl DeliveryRepository for InMemoryStore {
    async fn find_by_id(&self, id: DeliveryId) -> RepositoryResult<Option<Delivery>> {
        Ok(self.deliveries.read().await.get(&id).cloned())
    }

    async fn find_by_transaction_id(
        &self,
        id: TransactionId,
    ) -> RepositoryResult<Option<Delivery>> {
        Ok(self
            .deliveries
            .read()
            .await
            .values()
            .find(|d| d.transaction_id() == id)
            .cloned())
    }

    async fn save(&self, delivery: &Delivery) -> RepositoryResult<Delivery> {
        let mut deliveries = self.deliveries.write().await;
        if deliveries
            .values()
            .any(|d| d.id() == delivery.id() || d.transaction_id() == delivery.transaction_id())
        {
            return Err(RepositoryError::Conflict(format!(
                "delivery for transaction {} already exists",
                delivery.transaction_id()
            )));
        }
        deliveries.insert(delivery.id(), delivery.clone());
        Ok(delivery.clone())
    }

    async fn update(&self, delivery: &Delivery) -> RepositoryResult<Delivery> {
        let mut deliveries = self.deliveries.write().await;
        let stored = deliveries
            .get_mut(&delivery.id())
            .ok_or_else(|| not_found("Delivery", delivery.id()))?;
        *stored = delivery.clone();
        Ok(delivery.clone())
    }
}
