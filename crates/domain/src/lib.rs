//! Domain layer of the checkout backend.
//!
//! This crate provides:
//! - Product, Customer, Transaction and Delivery entities with validated
//!   factories and explicit status machines
//! - Repository contracts implemented by the `store` crate
//! - The payment gateway port implemented by the `gateway` crate

pub mod customer;
pub mod delivery;
pub mod payment;
pub mod product;
pub mod repository;
pub mod transaction;
pub mod transition;

mod validation;

pub use customer::{Customer, CustomerProps, NewCustomer};
pub use delivery::{Delivery, DeliveryProps, DeliveryStatus, NewDelivery};
pub use payment::{
    CardDetails, GatewayError, PaymentGateway, PaymentRequest, PaymentResponse, PaymentStatus,
};
pub use product::{NewProduct, Product, ProductProps};
pub use repository::{
    CustomerRepository, DeliveryRepository, ProductRepository, RepositoryError,
    RepositoryResult, TransactionRepository,
};
pub use transaction::{NewTransaction, Transaction, TransactionProps, TransactionStatus};
pub use transition::TransitionRejected;
