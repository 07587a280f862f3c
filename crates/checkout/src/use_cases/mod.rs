mod create_transaction;
mod process_payment;
mod queries;

pub use create_transaction::{CreateTransaction, CreateTransactionInput};
pub use process_payment::{DeliveryDetails, ProcessPayment, ProcessPaymentInput};
pub use queries::{GetAllProducts, GetProduct, GetTransaction, GetTransactionByNumber};
