//! Payment gateway adapters.
//!
//! [`HttpPaymentGateway`] talks to the card gateway over HTTPS;
//! [`InMemoryPaymentGateway`] answers from a script for tests and offline
//! runs.

pub mod client;
pub mod memory;
pub mod signature;
pub mod status;

pub use client::{GatewayConfig, HttpPaymentGateway, SANDBOX_ACCEPTANCE_TOKEN};
pub use memory::InMemoryPaymentGateway;
pub use signature::integrity_signature;
pub use status::map_status;
