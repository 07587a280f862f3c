//! Shared building blocks for the checkout backend.

pub mod clock;
pub mod either;
pub mod error;
pub mod money;
pub mod result;
pub mod types;

pub use clock::{Clock, FixedClock, IdGenerator, RandomIds, SequentialIds, SystemClock};
pub use either::{Either, try_catch};
pub use error::{DomainError, ErrorCode};
pub use money::Money;
pub use result::{DomainResult, InvalidAccess, ResultExt, combine};
pub use types::{CustomerId, DeliveryId, ProductId, TransactionId};
