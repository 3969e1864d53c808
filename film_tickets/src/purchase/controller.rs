//! Drives [`PurchaseFlow`] against the service and keeps the buyer's
//! purchase history current.

use async_trait::async_trait;
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use super::{
    errors::{PurchaseError, PurchaseResult},
    flow::{Completion, PurchaseFlow, PurchaseState},
    pricing::Quote,
};
use crate::{
    api::{
        ApiClient, ApiResult, CreatePurchaseRequest, Film, Page, PaymentMethod, Purchase,
        RequestFence,
    },
    auth::{SessionStore, UserId},
};

/// Purchases shown in the buyer's history.
pub const HISTORY_PAGE_SIZE: u32 = 20;

/// The purchase endpoints the controller needs.
#[async_trait]
pub trait PurchaseApi: Send + Sync {
    async fn create_purchase(&self, request: &CreatePurchaseRequest) -> ApiResult<Purchase>;

    async fn purchases_by_user(
        &self,
        user_id: UserId,
        page: u32,
        size: u32,
    ) -> ApiResult<Page<Purchase>>;
}

#[async_trait]
impl PurchaseApi for ApiClient {
    async fn create_purchase(&self, request: &CreatePurchaseRequest) -> ApiResult<Purchase> {
        ApiClient::create_purchase(self, request).await
    }

    async fn purchases_by_user(
        &self,
        user_id: UserId,
        page: u32,
        size: u32,
    ) -> ApiResult<Page<Purchase>> {
        ApiClient::purchases_by_user(self, user_id, page, size).await
    }
}

/// First page of the buyer's purchases.
#[derive(Clone, Debug, Default)]
pub struct PurchaseHistory {
    purchases: Vec<Purchase>,
    total: u64,
    error: Option<String>,
    loading: bool,
    fence: RequestFence,
}

impl PurchaseHistory {
    #[must_use]
    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }

    /// Number of purchases on the service, including those not loaded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

/// Shared handle to one purchase dialog and the history behind it.
///
/// Locks are never held across a service call, so the dialog can be
/// cancelled while a purchase is in flight.
pub struct PurchaseController<A> {
    api: Arc<A>,
    session: SessionStore,
    flow: Arc<Mutex<PurchaseFlow>>,
    history: Arc<Mutex<PurchaseHistory>>,
}

impl<A> Clone for PurchaseController<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            session: self.session.clone(),
            flow: Arc::clone(&self.flow),
            history: Arc::clone(&self.history),
        }
    }
}

impl<A: PurchaseApi + 'static> PurchaseController<A> {
    pub fn new(api: A, session: SessionStore) -> Self {
        Self::from_shared(Arc::new(api), session)
    }

    pub fn from_shared(api: Arc<A>, session: SessionStore) -> Self {
        Self {
            api,
            session,
            flow: Arc::new(Mutex::new(PurchaseFlow::new())),
            history: Arc::new(Mutex::new(PurchaseHistory::default())),
        }
    }

    /// Close successful purchases after `display`. Resets the dialog.
    #[must_use]
    pub fn with_success_display(self, display: Duration) -> Self {
        *lock(&self.flow) = PurchaseFlow::new().with_success_display(display);
        self
    }

    /// Snapshot of the dialog state.
    #[must_use]
    pub fn state(&self) -> PurchaseState {
        lock(&self.flow).state().clone()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        lock(&self.flow).is_open()
    }

    /// Price estimate for the current draft.
    #[must_use]
    pub fn quote(&self) -> Option<Quote> {
        lock(&self.flow).state().draft().map(|d| d.quote())
    }

    #[must_use]
    pub fn history(&self) -> PurchaseHistory {
        lock(&self.history).clone()
    }

    /// Open the dialog for `film`. A success that has been shown long
    /// enough is closed first.
    pub fn select(&self, film: &Film) -> PurchaseResult<()> {
        let mut flow = lock(&self.flow);
        flow.tick(Instant::now());
        flow.select_item(film)
    }

    pub fn set_quantity_input(&self, input: &str) -> PurchaseResult<()> {
        lock(&self.flow).set_quantity_input(input)
    }

    pub fn set_quantity(&self, quantity: i64) -> PurchaseResult<()> {
        lock(&self.flow).set_quantity(quantity)
    }

    pub fn increment(&self) -> PurchaseResult<()> {
        lock(&self.flow).increment()
    }

    pub fn decrement(&self) -> PurchaseResult<()> {
        lock(&self.flow).decrement()
    }

    pub fn set_payment_method(&self, method: PaymentMethod) -> PurchaseResult<()> {
        lock(&self.flow).set_payment_method(method)
    }

    pub fn cancel(&self) {
        lock(&self.flow).cancel();
    }

    /// Send the current draft as the logged-in principal.
    ///
    /// History is reloaded whenever the service created a purchase, even if
    /// the dialog was cancelled meanwhile. A success closes the dialog after
    /// the display delay.
    ///
    /// # Errors
    ///
    /// * `PurchaseError::NotAuthenticated` - No principal in the session
    /// * `PurchaseError::InvalidTransition` - Nothing to confirm
    ///
    /// Service failures are reported as [`Completion::Failed`].
    pub async fn submit(&self) -> PurchaseResult<Completion> {
        let user_id = self.user_id()?;
        let submission = lock(&self.flow).confirm(user_id)?;

        let result = self.api.create_purchase(&submission.request).await;

        let completion = lock(&self.flow).complete(submission.token, result, Instant::now());
        if completion.refreshes_history() {
            self.load_history(user_id).await;
        }
        if matches!(completion, Completion::Succeeded { .. }) {
            self.schedule_dismiss();
        }
        Ok(completion)
    }

    /// Reload the first page of the principal's purchases.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::NotAuthenticated` without a principal. Service
    /// failures are kept in [`PurchaseHistory::error`].
    pub async fn refresh_history(&self) -> PurchaseResult<()> {
        let user_id = self.user_id()?;
        self.load_history(user_id).await;
        Ok(())
    }

    async fn load_history(&self, user_id: UserId) {
        let token = {
            let mut history = lock(&self.history);
            history.loading = true;
            history.fence.begin()
        };

        let result = self
            .api
            .purchases_by_user(user_id, 0, HISTORY_PAGE_SIZE)
            .await;

        let mut history = lock(&self.history);
        let Some(result) = history.fence.accept(token, result) else {
            return;
        };
        history.loading = false;
        match result {
            Ok(page) => {
                history.total = page.total_elements;
                history.purchases = page.content;
                history.error = None;
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load purchase history");
                history.error = Some(e.to_string());
            }
        }
    }

    fn schedule_dismiss(&self) {
        let flow = Arc::clone(&self.flow);
        let delay = lock(&flow).success_display();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if lock(&flow).tick(Instant::now()) {
                tracing::debug!("Purchase dialog closed");
            }
        });
    }

    fn user_id(&self) -> PurchaseResult<UserId> {
        self.session
            .user()
            .map(|p| p.id)
            .ok_or(PurchaseError::NotAuthenticated)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
