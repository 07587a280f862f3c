use std::time::Instant;

use common::{DomainError, DomainResult, TransactionId};
use domain::{
    CardDetails, Delivery, GatewayError, NewDelivery, PaymentRequest, PaymentResponse,
    PaymentStatus, Transaction,
};

use crate::poll::poll_until;
use crate::ports::CheckoutPorts;

/// Where the purchased unit ships to.
#[derive(Debug, Clone)]
pub struct DeliveryDetails {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub notes: Option<String>,
}

/// Input for paying a PENDING transaction.
#[derive(Debug, Clone)]
pub struct ProcessPaymentInput {
    pub transaction_id: TransactionId,
    pub card: CardDetails,
    pub delivery: DeliveryDetails,
}

/// Charges the card for a PENDING transaction and settles it.
///
/// 1. Load the transaction (must be PENDING), its customer and product
/// 2. Decline right away when the product ran out of stock
/// 3. Charge through the gateway, polling while the answer is PENDING
/// 4. Approved: take one unit of stock and schedule the delivery.
///    Declined: record the reason. Anything else: record an error
/// 5. Persist and return the settled transaction
///
/// A gateway failure marks the transaction as ERROR and surfaces as
/// PAYMENT_FAILED. Steps after an approval are not rolled back if a later
/// one fails.
#[derive(Debug, Clone)]
pub struct ProcessPayment {
    ports: CheckoutPorts,
}

impl ProcessPayment {
    pub fn new(ports: CheckoutPorts) -> Self {
        Self { ports }
    }

    #[tracing::instrument(skip(self, input), fields(transaction_id = %input.transaction_id))]
    pub async fn execute(&self, input: ProcessPaymentInput) -> DomainResult<Transaction> {
        let started = Instant::now();
        let ports = &self.ports;

        let mut transaction = ports
            .transactions
            .find_by_id(input.transaction_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Transaction", input.transaction_id))?;

        if !transaction.status().is_pending() {
            return Err(DomainError::validation(
                "Transaction is not in pending status",
            ));
        }

        let customer = ports
            .customers
            .find_by_id(transaction.customer_id())
            .await?
            .ok_or_else(|| DomainError::not_found("Customer", transaction.customer_id()))?;

        let product = ports
            .products
            .find_by_id(transaction.product_id())
            .await?
            .ok_or_else(|| DomainError::not_found("Product", transaction.product_id()))?;

        // Checked ahead of the stock check and the charge; a bad address
        // never costs the buyer.
        let delivery = Delivery::create(
            NewDelivery {
                transaction_id: transaction.id(),
                address: input.delivery.address,
                city: input.delivery.city,
                state: input.delivery.state,
                zip_code: input.delivery.zip_code,
                country: input.delivery.country,
                notes: input.delivery.notes,
            },
            ports.ids.as_ref(),
            ports.clock.as_ref(),
        )?;

        if !product.is_available(1) {
            transaction.decline(Some("Insufficient stock"), ports.clock.now())?;
            ports.transactions.update(&transaction).await?;
            record_outcome(&transaction, started);
            return Err(DomainError::insufficient_stock(product.stock()));
        }

        let request = PaymentRequest {
            amount: transaction.total_amount(),
            currency: ports.currency.clone(),
            customer_email: customer.email().to_string(),
            reference: transaction.transaction_number().to_string(),
            card: input.card,
        };

        let response = match self.charge_and_settle(&request).await {
            Ok(response) => response,
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(error = %message, "payment gateway call failed");
                transaction.mark_as_error(&message, ports.clock.now())?;
                ports.transactions.update(&transaction).await?;
                record_outcome(&transaction, started);
                return Err(DomainError::payment_failed(message));
            }
        };

        let now = ports.clock.now();
        match response.status {
            PaymentStatus::Approved => {
                transaction.approve(response.id.as_str(), now)?;
                ports.products.decrement_stock(product.id(), 1).await?;
                ports.deliveries.save(&delivery).await?;
            }
            PaymentStatus::Declined => {
                transaction.decline(response.message.as_deref(), now)?;
            }
            PaymentStatus::Error | PaymentStatus::Pending => {
                let message = response.message.as_deref().unwrap_or("Unknown error");
                transaction.mark_as_error(message, now)?;
            }
        }

        let saved = ports.transactions.update(&transaction).await?;
        record_outcome(&saved, started);
        tracing::info!(
            transaction_number = saved.transaction_number(),
            status = %saved.status(),
            gateway_id = %response.id,
            "payment processed"
        );
        Ok(saved)
    }

    /// Submits the charge, then re-queries while the gateway keeps
    /// answering PENDING.
    async fn charge_and_settle(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, GatewayError> {
        let gateway = &self.ports.gateway;
        let charged = gateway.process_payment(request).await?;
        let gateway_id = charged.id.clone();

        poll_until(
            self.ports.poll_policy,
            self.ports.sleeper.as_ref(),
            charged,
            |response| !response.status.is_pending(),
            || {
                metrics::counter!("payment_status_polls_total").increment(1);
                gateway.get_transaction_status(&gateway_id)
            },
        )
        .await
    }
}

fn record_outcome(transaction: &Transaction, started: Instant) {
    metrics::counter!("payments_processed_total", "status" => transaction.status().as_str())
        .increment(1);
    metrics::histogram!("payment_duration_seconds").record(started.elapsed().as_secs_f64());
}
