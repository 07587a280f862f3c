use common::{DomainError, DomainResult, Money, ProductId};
use domain::{Customer, NewCustomer, NewTransaction, RepositoryError, Transaction};

use crate::ports::CheckoutPorts;

/// Input for opening a checkout.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub product_id: ProductId,
    pub customer_email: String,
    pub customer_full_name: String,
    pub customer_phone: String,
    pub base_fee: Money,
    pub delivery_fee: Money,
    pub payment_method: String,
}

/// Opens a PENDING transaction for one unit of a product.
///
/// Stock is only checked here, never reserved; the decrement happens once
/// the charge is approved.
#[derive(Debug, Clone)]
pub struct CreateTransaction {
    ports: CheckoutPorts,
}

impl CreateTransaction {
    pub fn new(ports: CheckoutPorts) -> Self {
        Self { ports }
    }

    #[tracing::instrument(
        skip(self, input),
        fields(product_id = %input.product_id, payment_method = %input.payment_method)
    )]
    pub async fn execute(&self, input: CreateTransactionInput) -> DomainResult<Transaction> {
        let product = self
            .ports
            .products
            .find_by_id(input.product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", input.product_id))?;

        if !product.is_available(1) {
            return Err(DomainError::insufficient_stock(product.stock()));
        }

        let customer = self.find_or_register_customer(&input).await?;

        let transaction = Transaction::create(
            NewTransaction {
                product_id: product.id(),
                customer_id: customer.id(),
                product_amount: product.price(),
                base_fee: input.base_fee,
                delivery_fee: input.delivery_fee,
                payment_method: input.payment_method,
            },
            self.ports.ids.as_ref(),
            self.ports.clock.as_ref(),
        )?;

        let saved = self.ports.transactions.save(&transaction).await?;

        metrics::counter!("transactions_created_total").increment(1);
        tracing::info!(
            transaction_number = saved.transaction_number(),
            total = %saved.total_amount(),
            "transaction created"
        );
        Ok(saved)
    }

    /// Reuses the customer registered under the email, creating one
    /// otherwise. A concurrent registration of the same email is resolved
    /// by reading the winner back.
    async fn find_or_register_customer(
        &self,
        input: &CreateTransactionInput,
    ) -> DomainResult<Customer> {
        let customers = &self.ports.customers;
        if let Some(existing) = customers.find_by_email(&input.customer_email).await? {
            return Ok(existing);
        }

        let customer = Customer::create(
            NewCustomer {
                email: input.customer_email.clone(),
                full_name: input.customer_full_name.clone(),
                phone: input.customer_phone.clone(),
            },
            self.ports.ids.as_ref(),
            self.ports.clock.as_ref(),
        )?;

        match customers.save(&customer).await {
            Ok(saved) => Ok(saved),
            Err(RepositoryError::Conflict(reason)) => {
                tracing::debug!(%reason, "customer registered concurrently");
                customers
                    .find_by_email(&input.customer_email)
                    .await?
                    .ok_or_else(|| DomainError::conflict(reason))
            }
            Err(other) => Err(other.into()),
        }
    }
}
