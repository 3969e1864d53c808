//! Remote API client.
//!
//! Every call attaches the session's bearer token, sends JSON (multipart
//! for film creation) and maps non-2xx responses to a single
//! [`ApiError`] carrying the service's message.
//!
//! ## Example
//!
//! ```no_run
//! use film_tickets::api::ApiClient;
//! use film_tickets::auth::SessionStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new("http://localhost:8080/api", SessionStore::in_memory());
//!     let page = client.list_enabled_films(0, 10).await?;
//!     for film in page.content {
//!         println!("{} ({} min)", film.title, film.duration);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod errors;
pub mod fence;
mod films;
pub mod models;
mod purchases;
mod users;

pub use client::ApiClient;
pub use errors::{ApiError, ApiResult};
pub use fence::{FenceToken, RequestFence};
pub use models::{
    CreateFilmRequest, CreatePurchaseDetail, CreatePurchaseRequest, Film, FilmClassification,
    FilmId, ImageUpload, Page, PaymentMethod, Purchase, PurchaseDetail, PurchaseId,
    UpdateFilmRequest, UpdateUserRequest,
};
