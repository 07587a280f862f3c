//! Collaborators the use cases are wired with.

use std::sync::Arc;

use common::{Clock, IdGenerator, RandomIds, SystemClock};
use domain::{
    CustomerRepository, DeliveryRepository, PaymentGateway, ProductRepository,
    TransactionRepository,
};

use crate::poll::{PollPolicy, Sleeper, TokioSleeper};

/// Currency charged when none is configured.
pub const DEFAULT_CURRENCY: &str = "COP";

/// Repositories, gateway and injected time/identity sources shared by the
/// use cases.
#[derive(Clone)]
pub struct CheckoutPorts {
    pub products: Arc<dyn ProductRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub deliveries: Arc<dyn DeliveryRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub clock: Arc<dyn Clock>,
    pub ids: Arc<dyn IdGenerator>,
    pub sleeper: Arc<dyn Sleeper>,
    pub poll_policy: PollPolicy,
    pub currency: String,
}

impl CheckoutPorts {
    /// Wires all four repositories to a single store handle.
    pub fn from_store<S>(store: S, gateway: Arc<dyn PaymentGateway>) -> Self
    where
        S: ProductRepository
            + CustomerRepository
            + TransactionRepository
            + DeliveryRepository
            + Clone
            + 'static,
    {
        Self {
            products: Arc::new(store.clone()),
            customers: Arc::new(store.clone()),
            transactions: Arc::new(store.clone()),
            deliveries: Arc::new(store),
            gateway,
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIds),
            sleeper: Arc::new(TokioSleeper),
            poll_policy: PollPolicy::default(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }
}

impl std::fmt::Debug for CheckoutPorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutPorts")
            .field("poll_policy", &self.poll_policy)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}
