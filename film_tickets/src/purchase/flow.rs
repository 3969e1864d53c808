//! The "buy tickets" state machine.
//!
//! ```text
//! Idle -> ItemSelected -> Configuring -> Submitting -> Succeeded -> Idle
//!                              ^              |
//!                              +--- Failed <--+
//! ```
//!
//! `cancel` returns to `Idle` from anywhere. The flow performs no I/O:
//! [`PurchaseFlow::confirm`] hands out a [`Submission`] and the caller
//! reports the service's answer through [`PurchaseFlow::complete`].

use std::time::{Duration, Instant};

use super::{
    errors::{PurchaseError, PurchaseResult},
    pricing::{Quote, Reconciliation, quote, reconcile},
};
use crate::{
    api::{
        ApiError, CreatePurchaseDetail, CreatePurchaseRequest, FenceToken, Film, FilmId,
        PaymentMethod, Purchase, RequestFence,
    },
    auth::UserId,
    money::Money,
};

/// How long a successful purchase stays on screen before the flow closes.
pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(2);

/// The film as it was when the user chose to buy it. Never refreshed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ItemSnapshot {
    pub film_id: FilmId,
    pub title: String,
    pub unit_price: Money,
}

impl ItemSnapshot {
    /// # Errors
    ///
    /// Returns [`PurchaseError::PriceUnavailable`] if the film has no price.
    pub fn from_film(film: &Film) -> PurchaseResult<Self> {
        let unit_price = film
            .ticket_price
            .ok_or(PurchaseError::PriceUnavailable(film.id))?;
        Ok(Self {
            film_id: film.id,
            title: film.title.clone(),
            unit_price,
        })
    }
}

/// What the user is about to buy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Draft {
    pub item: ItemSnapshot,
    pub quantity: u32,
    pub payment_method: PaymentMethod,
}

impl Draft {
    fn new(item: ItemSnapshot) -> Self {
        Self {
            item,
            quantity: 1,
            payment_method: PaymentMethod::default(),
        }
    }

    #[must_use]
    pub fn quote(&self) -> Quote {
        quote(self.item.unit_price, self.quantity)
    }

    /// Single-line purchase request for `user_id`.
    #[must_use]
    pub fn to_request(&self, user_id: UserId) -> CreatePurchaseRequest {
        CreatePurchaseRequest {
            user_id,
            payment_method: self.payment_method,
            details: vec![CreatePurchaseDetail {
                film_id: self.item.film_id,
                quantity: self.quantity,
                unit_price: self.item.unit_price,
            }],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum PurchaseState {
    #[default]
    Idle,
    ItemSelected(Draft),
    Configuring(Draft),
    Submitting {
        draft: Draft,
        token: FenceToken,
    },
    Succeeded {
        draft: Draft,
        purchase: Purchase,
        reconciliation: Reconciliation,
        completed_at: Instant,
    },
    Failed {
        draft: Draft,
        message: String,
    },
}

impl PurchaseState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PurchaseState::Idle => "idle",
            PurchaseState::ItemSelected(_) => "item selected",
            PurchaseState::Configuring(_) => "configuring",
            PurchaseState::Submitting { .. } => "submitting",
            PurchaseState::Succeeded { .. } => "succeeded",
            PurchaseState::Failed { .. } => "failed",
        }
    }

    #[must_use]
    pub fn draft(&self) -> Option<&Draft> {
        match self {
            PurchaseState::Idle => None,
            PurchaseState::ItemSelected(draft)
            | PurchaseState::Configuring(draft)
            | PurchaseState::Submitting { draft, .. }
            | PurchaseState::Succeeded { draft, .. }
            | PurchaseState::Failed { draft, .. } => Some(draft),
        }
    }
}

/// A purchase request handed to the caller for sending.
#[derive(Clone, Debug)]
pub struct Submission {
    pub token: FenceToken,
    pub request: CreatePurchaseRequest,
    pub quote: Quote,
}

/// How a service response was applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    Succeeded {
        purchase: Purchase,
        reconciliation: Reconciliation,
    },
    Failed {
        message: String,
    },
    /// The flow was cancelled or restarted before the response arrived.
    /// The state was left alone.
    Stale { succeeded: bool },
}

impl Completion {
    /// Whether the purchase history should be reloaded.
    ///
    /// A late success still created a purchase on the service, so it counts.
    #[must_use]
    pub fn refreshes_history(&self) -> bool {
        matches!(
            self,
            Completion::Succeeded { .. } | Completion::Stale { succeeded: true }
        )
    }
}

#[derive(Debug)]
pub struct PurchaseFlow {
    state: PurchaseState,
    fence: RequestFence,
    success_display: Duration,
}

impl Default for PurchaseFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl PurchaseFlow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: PurchaseState::Idle,
            fence: RequestFence::new(),
            success_display: SUCCESS_DISPLAY,
        }
    }

    /// Keep a finished purchase on screen for `display` instead of
    /// [`SUCCESS_DISPLAY`].
    #[must_use]
    pub fn with_success_display(mut self, display: Duration) -> Self {
        self.success_display = display;
        self
    }

    #[must_use]
    pub fn success_display(&self) -> Duration {
        self.success_display
    }

    #[must_use]
    pub fn state(&self) -> &PurchaseState {
        &self.state
    }

    /// Whether the purchase dialog is showing.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self.state, PurchaseState::Idle)
    }

    /// Start buying `film` with one ticket paid by credit card.
    ///
    /// # Errors
    ///
    /// * `PurchaseError::InvalidTransition` - A purchase is already open
    /// * `PurchaseError::PriceUnavailable` - The film cannot be priced
    pub fn select_item(&mut self, film: &Film) -> PurchaseResult<()> {
        if self.is_open() {
            return Err(self.invalid("select a film"));
        }
        let item = ItemSnapshot::from_film(film)?;
        self.state = PurchaseState::ItemSelected(Draft::new(item));
        Ok(())
    }

    /// Set the ticket count. Anything below one becomes one.
    pub fn set_quantity(&mut self, quantity: i64) -> PurchaseResult<()> {
        let quantity = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        self.edit("change the quantity", |draft| draft.quantity = quantity)
    }

    /// Set the ticket count from user input. Input that is not a whole
    /// number becomes one.
    pub fn set_quantity_input(&mut self, input: &str) -> PurchaseResult<()> {
        self.set_quantity(input.trim().parse().unwrap_or(1))
    }

    pub fn increment(&mut self) -> PurchaseResult<()> {
        self.edit("change the quantity", |draft| {
            draft.quantity = draft.quantity.saturating_add(1);
        })
    }

    pub fn decrement(&mut self) -> PurchaseResult<()> {
        self.edit("change the quantity", |draft| {
            draft.quantity = draft.quantity.saturating_sub(1).max(1);
        })
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) -> PurchaseResult<()> {
        self.edit("change the payment method", |draft| {
            draft.payment_method = method;
        })
    }

    /// Freeze the draft and produce the request to send.
    ///
    /// Valid after selecting a film, while configuring, and after a failed
    /// attempt (retry with the same quantity and method).
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::InvalidTransition` from any other state.
    pub fn confirm(&mut self, user_id: UserId) -> PurchaseResult<Submission> {
        let draft = match &self.state {
            PurchaseState::ItemSelected(draft)
            | PurchaseState::Configuring(draft)
            | PurchaseState::Failed { draft, .. } => draft.clone(),
            _ => return Err(self.invalid("confirm")),
        };

        let token = self.fence.begin();
        let submission = Submission {
            token,
            request: draft.to_request(user_id),
            quote: draft.quote(),
        };
        tracing::debug!(
            film_id = draft.item.film_id,
            quantity = draft.quantity,
            total = %submission.quote.total,
            "Submitting purchase"
        );
        self.state = PurchaseState::Submitting { draft, token };
        Ok(submission)
    }

    /// Apply the service's answer to a [`Submission`].
    pub fn complete(
        &mut self,
        token: FenceToken,
        result: Result<Purchase, ApiError>,
        now: Instant,
    ) -> Completion {
        let draft = match std::mem::take(&mut self.state) {
            PurchaseState::Submitting {
                draft,
                token: current,
            } if current == token && self.fence.is_current(token) => draft,
            other => {
                self.state = other;
                let succeeded = result.is_ok();
                tracing::info!(succeeded, "Ignoring purchase response for a closed dialog");
                return Completion::Stale { succeeded };
            }
        };

        match result {
            Ok(purchase) => {
                let reconciliation = reconcile(&draft.quote(), purchase.total_amount);
                tracing::info!(
                    purchase_id = purchase.id,
                    total = %reconciliation.shown_total(),
                    "Purchase completed"
                );
                self.state = PurchaseState::Succeeded {
                    draft,
                    purchase: purchase.clone(),
                    reconciliation,
                    completed_at: now,
                };
                Completion::Succeeded {
                    purchase,
                    reconciliation,
                }
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "Purchase failed");
                self.state = PurchaseState::Failed {
                    draft,
                    message: message.clone(),
                };
                Completion::Failed { message }
            }
        }
    }

    /// Close the dialog. Any response still in flight will be ignored.
    pub fn cancel(&mut self) {
        self.fence.invalidate();
        self.state = PurchaseState::Idle;
    }

    /// Close a finished purchase once it has been shown long enough.
    /// Returns `true` if the dialog closed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let expired = matches!(
            &self.state,
            PurchaseState::Succeeded { completed_at, .. }
                if now.saturating_duration_since(*completed_at) >= self.success_display
        );
        if expired {
            self.state = PurchaseState::Idle;
        }
        expired
    }

    fn edit(&mut self, action: &'static str, apply: impl FnOnce(&mut Draft)) -> PurchaseResult<()> {
        let mut draft = match &self.state {
            PurchaseState::ItemSelected(draft)
            | PurchaseState::Configuring(draft)
            | PurchaseState::Failed { draft, .. } => draft.clone(),
            _ => return Err(self.invalid(action)),
        };
        apply(&mut draft);
        self.state = PurchaseState::Configuring(draft);
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> PurchaseError {
        PurchaseError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}
