//! Scriptable in-memory gateway for tests and offline runs.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use domain::{GatewayError, PaymentGateway, PaymentRequest, PaymentResponse, PaymentStatus};

use crate::status::default_message;

#[derive(Debug)]
struct InMemoryGatewayState {
    default_status: PaymentStatus,
    charge_script: VecDeque<PaymentStatus>,
    poll_script: VecDeque<PaymentStatus>,
    charges: HashMap<String, (String, PaymentStatus)>,
    requests: Vec<PaymentRequest>,
    status_checks: usize,
    next_id: u32,
    fail_on_charge: bool,
    fail_on_status: bool,
}

impl Default for InMemoryGatewayState {
    fn default() -> Self {
        Self {
            default_status: PaymentStatus::Approved,
            charge_script: VecDeque::new(),
            poll_script: VecDeque::new(),
            charges: HashMap::new(),
            requests: Vec::new(),
            status_checks: 0,
            next_id: 0,
            fail_on_charge: false,
            fail_on_status: false,
        }
    }
}

/// In-memory payment gateway.
///
/// Charges are answered from a script of statuses, falling back to a
/// default (approve). Status polls pop their own script; once it runs dry
/// the charge's last known status is returned.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a gateway that approves every charge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway answering every unscripted charge with `status`.
    pub fn with_default_status(status: PaymentStatus) -> Self {
        let gateway = Self::default();
        gateway.write().default_status = status;
        gateway
    }

    /// Queues the status of the next charge.
    pub fn push_charge_status(&self, status: PaymentStatus) {
        self.write().charge_script.push_back(status);
    }

    /// Queues the answer of the next status poll.
    pub fn push_poll_status(&self, status: PaymentStatus) {
        self.write().poll_script.push_back(status);
    }

    /// Configures the gateway to fail charge calls outright.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.write().fail_on_charge = fail;
    }

    /// Configures the gateway to fail status polls.
    pub fn set_fail_on_status(&self, fail: bool) {
        self.write().fail_on_status = fail;
    }

    /// Returns the number of charges accepted.
    pub fn charge_count(&self) -> usize {
        self.read().charges.len()
    }

    /// Returns the number of status polls answered or failed.
    pub fn status_check_count(&self) -> usize {
        self.read().status_checks
    }

    /// Returns the last charge request received.
    pub fn last_request(&self) -> Option<PaymentRequest> {
        self.read().requests.last().cloned()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryGatewayState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryGatewayState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn response(id: &str, reference: &str, status: PaymentStatus) -> PaymentResponse {
    PaymentResponse {
        id: id.to_string(),
        status,
        reference: reference.to_string(),
        message: Some(default_message(status).to_string()),
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, GatewayError> {
        let mut state = self.write();
        state.requests.push(request.clone());

        if state.fail_on_charge {
            return Err(GatewayError::Transport("gateway unavailable".to_string()));
        }

        let status = state
            .charge_script
            .pop_front()
            .unwrap_or(state.default_status);
        state.next_id += 1;
        let id = format!("PAY-{:04}", state.next_id);
        state
            .charges
            .insert(id.clone(), (request.reference.clone(), status));

        Ok(response(&id, &request.reference, status))
    }

    async fn get_transaction_status(
        &self,
        gateway_transaction_id: &str,
    ) -> Result<PaymentResponse, GatewayError> {
        let mut state = self.write();
        state.status_checks += 1;

        if state.fail_on_status {
            return Err(GatewayError::Transport("gateway unavailable".to_string()));
        }

        let scripted = state.poll_script.pop_front();
        let (reference, status) = state
            .charges
            .get_mut(gateway_transaction_id)
            .ok_or_else(|| GatewayError::Rejected("Transaction not found".to_string()))?;
        if let Some(next) = scripted {
            *status = next;
        }
        Ok(response(gateway_transaction_id, reference, *status))
    }
}
