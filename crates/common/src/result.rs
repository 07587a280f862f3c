//! Helpers on top of `Result<T, DomainError>`.
//!
//! `map`, `and_then` and `?` already short-circuit with the original error;
//! [`ResultExt`] adds the remaining combinators the use cases lean on.

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};

use thiserror::Error;

use crate::error::DomainError;

/// Result of a domain operation.
pub type DomainResult<T> = Result<T, DomainError>;

/// Reading the wrong side of a result. This is a programming error, not a
/// business failure, and is kept apart from [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidAccess {
    #[error("cannot read the value of a failed result")]
    ValueOfFailure,
    #[error("cannot read the error of a successful result")]
    ErrorOfSuccess,
}

pub trait ResultExt<T> {
    /// Borrows the success value.
    fn value(&self) -> Result<&T, InvalidAccess>;

    /// Borrows the failure.
    fn error(&self) -> Result<&DomainError, InvalidAccess>;

    /// Runs `f` on the success value and hands the result back unchanged.
    fn on_success(self, f: impl FnOnce(&T)) -> Self;

    /// Runs `f` on the failure and hands the result back unchanged.
    fn on_failure(self, f: impl FnOnce(&DomainError)) -> Self;

    /// Like `map`, but a panic inside `f` becomes a `MAPPING_ERROR` failure.
    fn map_catching<U>(self, f: impl FnOnce(T) -> U) -> DomainResult<U>;

    /// Chains an async step that is only run on success.
    fn flat_map_async<U, F, Fut>(self, f: F) -> impl Future<Output = DomainResult<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = DomainResult<U>>;
}

impl<T> ResultExt<T> for DomainResult<T> {
    fn value(&self) -> Result<&T, InvalidAccess> {
        self.as_ref().map_err(|_| InvalidAccess::ValueOfFailure)
    }

    fn error(&self) -> Result<&DomainError, InvalidAccess> {
        match self {
            Ok(_) => Err(InvalidAccess::ErrorOfSuccess),
            Err(e) => Ok(e),
        }
    }

    fn on_success(self, f: impl FnOnce(&T)) -> Self {
        if let Ok(value) = &self {
            f(value);
        }
        self
    }

    fn on_failure(self, f: impl FnOnce(&DomainError)) -> Self {
        if let Err(err) = &self {
            f(err);
        }
        self
    }

    fn map_catching<U>(self, f: impl FnOnce(T) -> U) -> DomainResult<U> {
        let value = self?;
        catch_unwind(AssertUnwindSafe(|| f(value))).map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "mapping function panicked".to_string());
            DomainError::mapping(message)
        })
    }

    fn flat_map_async<U, F, Fut>(self, f: F) -> impl Future<Output = DomainResult<U>>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = DomainResult<U>>,
    {
        async move {
            match self {
                Ok(value) => f(value).await,
                Err(err) => Err(err),
            }
        }
    }
}

/// Returns the first failure in iteration order, or `Ok(())` when every
/// result succeeded.
pub fn combine<T, I>(results: I) -> DomainResult<()>
where
    I: IntoIterator<Item = DomainResult<T>>,
{
    for result in results {
        result?;
    }
    Ok(())
}
