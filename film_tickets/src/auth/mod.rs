//! Authentication module: session persistence, route gating and the
//! login/register/logout operations.
//!
//! The session lives in a [`SessionStore`] handle that is created once at
//! startup and passed to every consumer. Only [`AuthManager`] mutates it.
//!
//! ## Example
//!
//! ```no_run
//! use film_tickets::api::ApiClient;
//! use film_tickets::auth::{AuthManager, Gate, Role, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SessionStore::in_memory();
//!     let client = ApiClient::new("http://localhost:8080/api", store.clone());
//!     let auth = AuthManager::new(client, store.clone());
//!
//!     let principal = auth.login("admin@example.com", "Secret123!").await?;
//!     println!("Welcome {}", principal.name);
//!
//!     let gate = Gate::new(store);
//!     println!("admin area: {:?}", gate.check(&[Role::Admin]));
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod gate;
pub mod manager;
pub mod models;
pub mod store;

pub use errors::{AuthError, AuthResult, StorageError};
pub use gate::{AccessDecision, DisabledPolicy, Gate, decide};
pub use manager::AuthManager;
pub use models::{
    AuthResponse, FieldErrors, Principal, RegistrationForm, Role, Session, SignInRequest,
    SignUpRequest, UserId,
};
pub use store::{FileStorage, MemoryStorage, SessionStore, Storage, TOKEN_KEY, USER_KEY};
