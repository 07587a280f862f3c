//! Checkout use cases.
//!
//! Opening a transaction, paying it through the card gateway and the
//! read-throughs the storefront needs. Every use case returns a
//! [`DomainResult`]; the HTTP layer is the only place errors become
//! responses.

pub mod poll;
pub mod ports;
pub mod use_cases;

use common::{DomainResult, ProductId, ResultExt, TransactionId};
use domain::{Product, Transaction};

pub use poll::{PollPolicy, Sleeper, TokioSleeper, poll_until};
pub use ports::{CheckoutPorts, DEFAULT_CURRENCY};
pub use use_cases::{
    CreateTransaction, CreateTransactionInput, DeliveryDetails, GetAllProducts, GetProduct,
    GetTransaction, GetTransactionByNumber, ProcessPayment, ProcessPaymentInput,
};

/// All checkout use cases wired to one set of ports.
#[derive(Debug, Clone)]
pub struct Checkout {
    create_transaction: CreateTransaction,
    process_payment: ProcessPayment,
    get_transaction: GetTransaction,
    get_transaction_by_number: GetTransactionByNumber,
    get_product: GetProduct,
    get_all_products: GetAllProducts,
}

impl Checkout {
    pub fn new(ports: CheckoutPorts) -> Self {
        Self {
            create_transaction: CreateTransaction::new(ports.clone()),
            process_payment: ProcessPayment::new(ports.clone()),
            get_transaction: GetTransaction::new(ports.clone()),
            get_transaction_by_number: GetTransactionByNumber::new(ports.clone()),
            get_product: GetProduct::new(ports.clone()),
            get_all_products: GetAllProducts::new(ports),
        }
    }

    pub async fn create_transaction(
        &self,
        input: CreateTransactionInput,
    ) -> DomainResult<Transaction> {
        self.create_transaction.execute(input).await
    }

    pub async fn process_payment(&self, input: ProcessPaymentInput) -> DomainResult<Transaction> {
        self.process_payment.execute(input).await.on_failure(|err| {
            tracing::warn!(code = %err.code(), error = %err.message(), "payment not processed");
        })
    }

    pub async fn get_transaction(&self, id: TransactionId) -> DomainResult<Transaction> {
        self.get_transaction.execute(id).await
    }

    pub async fn get_transaction_by_number(&self, number: &str) -> DomainResult<Transaction> {
        self.get_transaction_by_number.execute(number).await
    }

    pub async fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        self.get_product.execute(id).await
    }

    pub async fn get_all_products(&self) -> DomainResult<Vec<Product>> {
        self.get_all_products.execute().await
    }
}
