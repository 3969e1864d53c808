//! Ticket purchase: pricing, the purchase dialog state machine, and the
//! controller that runs it against the service.
//!
//! # Example
//!
//! ```
//! use film_tickets::money::Money;
//! use film_tickets::purchase::quote;
//!
//! let q = quote(Money::from_major(10_000), 2);
//! assert_eq!(q.fee, Money::from_major(4_200));
//! assert_eq!(q.total.to_string(), "$24,200.00");
//! ```

pub mod controller;
pub mod errors;
pub mod flow;
pub mod pricing;

pub use controller::{HISTORY_PAGE_SIZE, PurchaseApi, PurchaseController, PurchaseHistory};
pub use errors::{PurchaseError, PurchaseResult};
pub use flow::{
    Completion, Draft, ItemSnapshot, PurchaseFlow, PurchaseState, SUCCESS_DISPLAY, Submission,
};
pub use pricing::{FEE_RATE_PERCENT, Quote, Reconciliation, quote, reconcile, service_fee};
