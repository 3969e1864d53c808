//! # Film Tickets
//!
//! Client-side core for a film ticketing service. The remote HTTP API owns
//! pricing, persistence and authorization enforcement; this crate owns the
//! pieces of client state that have real transitions:
//!
//! - **Session store**: bearer token and authenticated principal, persisted
//!   together and cleared together.
//! - **Authorization gate**: a pure decision per navigation
//!   (allow / redirect to login / redirect to unauthorized).
//! - **Purchase flow**: the select → configure → submit state machine behind
//!   the "buy tickets" modal.
//!
//! ## Core Modules
//!
//! - [`auth`]: session store, gate, login/register/logout
//! - [`api`]: remote API client, wire models, request fencing
//! - [`router`]: typed routing surface and its access requirements
//! - [`catalog`]: paged film browsing with stale-response protection
//! - [`purchase`]: pricing and the purchase state machine
//!
//! ## Example
//!
//! ```
//! use film_tickets::auth::{AccessDecision, Gate, SessionStore};
//! use film_tickets::router::Route;
//!
//! let store = SessionStore::in_memory();
//! let gate = Gate::new(store);
//!
//! // Nobody is logged in yet, so protected pages bounce to the login page.
//! assert_eq!(gate.check_route(&Route::Dashboard), AccessDecision::RedirectLogin);
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod money;
pub mod purchase;
pub mod router;

pub use api::{ApiClient, ApiError, ApiResult, RequestFence};
pub use auth::{AccessDecision, AuthError, AuthManager, Gate, Principal, Role, SessionStore};
pub use money::Money;
pub use purchase::{PurchaseController, PurchaseFlow, PurchaseState};
