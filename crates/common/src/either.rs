//! Two-sided value, right-biased.

use std::future::Future;

/// Either a `Left` (conventionally the failure side) or a `Right` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Either<L, R> {
    Left(L),
    Right(R),
}

impl<L, R> Either<L, R> {
    pub fn is_left(&self) -> bool {
        matches!(self, Either::Left(_))
    }

    pub fn is_right(&self) -> bool {
        matches!(self, Either::Right(_))
    }

    pub fn map<U>(self, f: impl FnOnce(R) -> U) -> Either<L, U> {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => Either::Right(f(r)),
        }
    }

    pub fn flat_map<U>(self, f: impl FnOnce(R) -> Either<L, U>) -> Either<L, U> {
        match self {
            Either::Left(l) => Either::Left(l),
            Either::Right(r) => f(r),
        }
    }

    pub fn map_left<M>(self, f: impl FnOnce(L) -> M) -> Either<M, R> {
        match self {
            Either::Left(l) => Either::Left(f(l)),
            Either::Right(r) => Either::Right(r),
        }
    }

    /// Collapses both sides into one value.
    pub fn fold<U>(self, on_left: impl FnOnce(L) -> U, on_right: impl FnOnce(R) -> U) -> U {
        match self {
            Either::Left(l) => on_left(l),
            Either::Right(r) => on_right(r),
        }
    }

    pub fn get_or_else(self, default: R) -> R {
        match self {
            Either::Left(_) => default,
            Either::Right(r) => r,
        }
    }

    /// Replaces a `Left` with whatever `f` produces from it.
    pub fn or_else(self, f: impl FnOnce(L) -> Either<L, R>) -> Either<L, R> {
        match self {
            Either::Left(l) => f(l),
            right => right,
        }
    }

    pub fn into_result(self) -> Result<R, L> {
        match self {
            Either::Left(l) => Err(l),
            Either::Right(r) => Ok(r),
        }
    }
}

impl<L, R> From<Result<R, L>> for Either<L, R> {
    fn from(result: Result<R, L>) -> Self {
        match result {
            Ok(r) => Either::Right(r),
            Err(l) => Either::Left(l),
        }
    }
}

/// Awaits a fallible future and lifts its outcome into an [`Either`],
/// converting the error with `on_error`.
pub async fn try_catch<L, R, E, Fut>(future: Fut, on_error: impl FnOnce(E) -> L) -> Either<L, R>
where
    Fut: Future<Output = Result<R, E>>,
{
    match future.await {
        Ok(value) => Either::Right(value),
        Err(err) => Either::Left(on_error(err)),
    }
}
