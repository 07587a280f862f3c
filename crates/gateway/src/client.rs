//! HTTP client for the card payment gateway.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{Either, try_catch};
use domain::{
    CardDetails, GatewayError, PaymentGateway, PaymentRequest, PaymentResponse, PaymentStatus,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::signature::integrity_signature;
use crate::status::{default_message, map_status};

/// Request timeout applied to every gateway call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Used when the merchant endpoint cannot provide an acceptance token.
pub const SANDBOX_ACCEPTANCE_TOKEN: &str = "sandbox_acceptance_token";

/// Credentials and endpoint of the gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub public_key: String,
    pub private_key: String,
    pub integrity_key: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(
        base_url: impl Into<String>,
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        integrity_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            public_key: public_key.into(),
            private_key: private_key.into(),
            integrity_key: integrity_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("public_key", &self.public_key)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MerchantData {
    presigned_acceptance: PresignedAcceptance,
}

#[derive(Debug, Deserialize)]
struct PresignedAcceptance {
    acceptance_token: String,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    id: String,
    status: String,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    status_message: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenizeBody<'a> {
    number: &'a str,
    cvc: &'a str,
    exp_month: &'a str,
    exp_year: &'a str,
    card_holder: &'a str,
}

#[derive(Debug, Serialize)]
struct PaymentMethodBody<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    token: &'a str,
    installments: u32,
}

#[derive(Debug, Serialize)]
struct ChargeBody<'a> {
    acceptance_token: &'a str,
    amount_in_cents: i64,
    currency: &'a str,
    customer_email: &'a str,
    payment_method: PaymentMethodBody<'a>,
    reference: &'a str,
    signature: String,
}

/// Gateway client: tokenizes cards, submits signed charges and looks up
/// charge status.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpPaymentGateway {
    pub fn new(config: GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Exchanges raw card data for a single-use token.
    #[tracing::instrument(skip_all, fields(card_last_four = %card.last_four()))]
    pub async fn tokenize_card(&self, card: &CardDetails) -> Result<String, GatewayError> {
        let (exp_month, exp_year) = card.expiry_parts().ok_or_else(|| {
            GatewayError::Rejected("Card expiration must be in MM/YY format".to_string())
        })?;
        let body = TokenizeBody {
            number: &card.number,
            cvc: &card.cvv,
            exp_month,
            exp_year,
            card_holder: &card.holder,
        };

        let request = self
            .client
            .post(self.url("tokens/cards"))
            .bearer_auth(&self.config.public_key)
            .json(&body);
        let token: Envelope<TokenData> = send(request).await?;
        Ok(token.data.id)
    }

    /// Fetches the merchant's presigned acceptance token, falling back to
    /// the sandbox token when the lookup fails.
    pub async fn acceptance_token(&self) -> String {
        let request = self
            .client
            .get(self.url(&format!("merchants/{}", self.config.public_key)));
        match send::<Envelope<MerchantData>>(request).await {
            Ok(merchant) => merchant.data.presigned_acceptance.acceptance_token,
            Err(err) => {
                tracing::warn!(error = %err, "acceptance token lookup failed, using sandbox token");
                SANDBOX_ACCEPTANCE_TOKEN.to_string()
            }
        }
    }

    #[tracing::instrument(skip(self, request), fields(reference = %request.reference))]
    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentResponse, GatewayError> {
        let token = self.tokenize_card(&request.card).await?;
        let acceptance_token = self.acceptance_token().await;
        let amount_in_cents = request.amount.cents();

        let body = ChargeBody {
            acceptance_token: &acceptance_token,
            amount_in_cents,
            currency: &request.currency,
            customer_email: &request.customer_email,
            payment_method: PaymentMethodBody {
                kind: "CARD",
                token: &token,
                installments: 1,
            },
            reference: &request.reference,
            signature: integrity_signature(
                &request.reference,
                amount_in_cents,
                &request.currency,
                &self.config.integrity_key,
            ),
        };

        let http = self
            .client
            .post(self.url("transactions"))
            .bearer_auth(&self.config.private_key)
            .json(&body);
        let created: Envelope<TransactionData> = send(http).await?;
        Ok(into_response(created.data, &request.reference))
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, GatewayError> {
        let started = Instant::now();
        let outcome: Either<GatewayError, PaymentResponse> =
            try_catch(self.charge(request), |err| err).await;
        metrics::histogram!("gateway_request_duration_seconds", "operation" => "charge")
            .record(started.elapsed().as_secs_f64());

        let response = outcome.fold(
            |err| {
                tracing::warn!(reference = %request.reference, error = %err, "charge failed");
                metrics::counter!("gateway_errors_total", "operation" => "charge").increment(1);
                PaymentResponse {
                    id: String::new(),
                    status: PaymentStatus::Error,
                    reference: request.reference.clone(),
                    message: Some(err.to_string()),
                }
            },
            |response| response,
        );
        Ok(response)
    }

    #[tracing::instrument(skip(self))]
    async fn get_transaction_status(
        &self,
        gateway_transaction_id: &str,
    ) -> Result<PaymentResponse, GatewayError> {
        let request = self
            .client
            .get(self.url(&format!("transactions/{gateway_transaction_id}")))
            .bearer_auth(&self.config.private_key);
        let found: Envelope<TransactionData> = send(request).await.inspect_err(|_| {
            metrics::counter!("gateway_errors_total", "operation" => "status").increment(1);
        })?;
        let reference = found.data.reference.clone().unwrap_or_default();
        Ok(into_response(found.data, &reference))
    }
}

fn into_response(data: TransactionData, fallback_reference: &str) -> PaymentResponse {
    let status = map_status(&data.status);
    let message = match status {
        PaymentStatus::Approved => default_message(status).to_string(),
        _ => data
            .status_message
            .unwrap_or_else(|| default_message(status).to_string()),
    };
    PaymentResponse {
        id: data.id,
        status,
        reference: data
            .reference
            .unwrap_or_else(|| fallback_reference.to_string()),
        message: Some(message),
    }
}

/// Sends a request and decodes a successful JSON body. Error bodies are
/// searched for `error.reason` or `error.message`.
async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, GatewayError> {
    let response = request
        .send()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::Rejected(
            error_reason(&body).unwrap_or_else(|| format!("gateway returned HTTP {status}")),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

fn error_reason(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("reason")
        .and_then(Value::as_str)
        .or_else(|| error.get("message").and_then(Value::as_str))
        .map(str::to_string)
}
