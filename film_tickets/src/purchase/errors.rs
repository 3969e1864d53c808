//! Purchase flow error types.

use thiserror::Error;

use crate::api::FilmId;

/// Errors raised by the purchase flow before anything reaches the service.
///
/// Service failures are not errors here: they move the flow to its failed
/// state and are reported through [`Completion`](super::Completion).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PurchaseError {
    /// The action is not valid in the current state.
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    /// The film has no ticket price, so no purchase can be priced.
    #[error("Film {0} has no ticket price")]
    PriceUnavailable(FilmId),

    /// Purchases are made on behalf of the logged-in principal.
    #[error("Not authenticated")]
    NotAuthenticated,
}

/// Result type for purchase flow operations
pub type PurchaseResult<T> = Result<T, PurchaseError>;
