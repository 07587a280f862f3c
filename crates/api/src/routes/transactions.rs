//! Checkout endpoints: open a transaction, pay it, look it up.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::{CreateTransactionInput, DeliveryDetails, ProcessPaymentInput};
use chrono::{DateTime, Utc};
use common::{DomainResult, Money, ProductId, TransactionId, combine};
use domain::{CardDetails, Transaction};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::validation::{CARD_NUMBER, CVV, EMAIL, EXPIRATION, fee, length, not_blank, pattern};

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub product_id: String,
    pub customer_email: String,
    pub customer_full_name: String,
    pub customer_phone: String,
    /// Falls back to the configured fee when omitted.
    pub base_fee: Option<f64>,
    pub delivery_fee: Option<f64>,
    pub payment_method: String,
}

impl CreateTransactionRequest {
    fn validate(&self) -> DomainResult<()> {
        combine([
            not_blank("productId", &self.product_id),
            pattern(&EMAIL, &self.customer_email, "customerEmail must be an email"),
            length("customerFullName", &self.customer_full_name, 3, 100),
            length("customerPhone", &self.customer_phone, 10, 20),
            self.base_fee.map_or(Ok(()), |amount| fee("baseFee", amount)),
            self.delivery_fee.map_or(Ok(()), |amount| fee("deliveryFee", amount)),
            not_blank("paymentMethod", &self.payment_method),
        ])
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    pub transaction_id: String,
    pub card_number: String,
    pub card_holder: String,
    pub expiration_date: String,
    pub cvv: String,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub delivery_zip_code: String,
    pub delivery_country: String,
    pub delivery_notes: Option<String>,
}

impl ProcessPaymentRequest {
    fn validate(&self) -> DomainResult<()> {
        combine([
            not_blank("transactionId", &self.transaction_id),
            pattern(
                &CARD_NUMBER,
                &self.card_number,
                "Card number must be between 13 and 19 digits",
            ),
            length("cardHolder", &self.card_holder, 3, 100),
            pattern(
                &EXPIRATION,
                &self.expiration_date,
                "Expiration date must be in MM/YY format",
            ),
            pattern(&CVV, &self.cvv, "CVV must be 3 or 4 digits"),
            length("deliveryAddress", &self.delivery_address, 5, 200),
            length("deliveryCity", &self.delivery_city, 2, 100),
            length("deliveryState", &self.delivery_state, 2, 100),
            length("deliveryZipCode", &self.delivery_zip_code, 3, 20),
            length("deliveryCountry", &self.delivery_country, 2, 100),
            self.delivery_notes
                .as_deref()
                .map_or(Ok(()), |notes| length("deliveryNotes", notes, 0, 500)),
        ])
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub transaction_number: String,
    pub product_id: String,
    pub customer_id: String,
    pub product_amount: f64,
    pub base_fee: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
    pub status: String,
    #[serde(rename = "wompiTransactionId", skip_serializing_if = "Option::is_none")]
    pub gateway_transaction_id: Option<String>,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id().to_string(),
            transaction_number: tx.transaction_number().to_string(),
            product_id: tx.product_id().to_string(),
            customer_id: tx.customer_id().to_string(),
            product_amount: tx.product_amount().as_decimal(),
            base_fee: tx.base_fee().as_decimal(),
            delivery_fee: tx.delivery_fee().as_decimal(),
            total_amount: tx.total_amount().as_decimal(),
            status: tx.status().as_str().to_string(),
            gateway_transaction_id: tx.gateway_transaction_id().map(str::to_string),
            payment_method: tx.payment_method().to_string(),
            created_at: tx.created_at(),
            updated_at: tx.updated_at(),
        }
    }
}

// -- Handlers --

/// POST /transactions: open a PENDING transaction for one unit.
#[tracing::instrument(skip(state, payload))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let Json(req) = payload?;
    req.validate()?;

    let product_id: ProductId = req
        .product_id
        .parse()
        .map_err(|_| ApiError::Validation(format!("Invalid product id: {}", req.product_id)))?;

    let input = CreateTransactionInput {
        product_id,
        customer_email: req.customer_email,
        customer_full_name: req.customer_full_name,
        customer_phone: req.customer_phone,
        base_fee: fee_or_default("baseFee", req.base_fee, state.fees.base_fee)?,
        delivery_fee: fee_or_default("deliveryFee", req.delivery_fee, state.fees.delivery_fee)?,
        payment_method: req.payment_method,
    };

    let transaction = state.checkout.create_transaction(input).await?;
    Ok((StatusCode::CREATED, Json(transaction.into())))
}

/// POST /transactions/process-payment: charge the card and settle.
#[tracing::instrument(skip(state, payload))]
pub async fn process_payment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessPaymentRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;

    let input = ProcessPaymentInput {
        transaction_id: parse_transaction_id(&req.transaction_id)?,
        card: CardDetails {
            number: req.card_number,
            holder: req.card_holder,
            expiration: req.expiration_date,
            cvv: req.cvv,
        },
        delivery: DeliveryDetails {
            address: req.delivery_address,
            city: req.delivery_city,
            state: req.delivery_state,
            zip_code: req.delivery_zip_code,
            country: req.delivery_country,
            notes: req.delivery_notes.filter(|notes| !notes.trim().is_empty()),
        },
    };

    let transaction = state.checkout.process_payment(input).await?;
    Ok(Json(transaction.into()))
}

/// GET /transactions/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let transaction = state
        .checkout
        .get_transaction(parse_transaction_id(&id)?)
        .await?;
    Ok(Json(transaction.into()))
}

/// GET /transactions/number/{number}
#[tracing::instrument(skip(state))]
pub async fn get_by_number(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let transaction = state.checkout.get_transaction_by_number(&number).await?;
    Ok(Json(transaction.into()))
}

fn fee_or_default(field: &str, amount: Option<f64>, default: Money) -> Result<Money, ApiError> {
    match amount {
        Some(amount) => Money::from_decimal(amount)
            .ok_or_else(|| ApiError::Validation(format!("{field} is out of range"))),
        None => Ok(default),
    }
}

fn parse_transaction_id(raw: &str) -> Result<TransactionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("Invalid transaction id: {raw}")))
}
