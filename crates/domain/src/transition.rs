//! Rejected state-machine transitions.

use common::DomainError;

/// A transition that the current status does not allow.
///
/// `S` is the status enum of the entity whose machine refused the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRejected<S> {
    pub from: S,
    pub message: &'static str,
}

impl<S> std::fmt::Display for TransitionRejected<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message)
    }
}

impl<S: std::fmt::Debug> std::error::Error for TransitionRejected<S> {}

impl<S> From<TransitionRejected<S>> for DomainError {
    fn from(rejected: TransitionRejected<S>) -> Self {
        DomainError::validation(rejected.message)
    }
}
