//! Request fencing.
//!
//! Responses may arrive out of order. Each request takes a [`FenceToken`]
//! when it is issued; only the holder of the newest token may apply its
//! response. Anything older is dropped.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Identifies one issued request.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FenceToken(u64);

/// Generation counter shared by every clone.
#[derive(Clone, Debug, Default)]
pub struct RequestFence {
    current: Arc<AtomicU64>,
}

impl RequestFence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token, superseding every earlier one.
    pub fn begin(&self) -> FenceToken {
        FenceToken(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Supersede every issued token without starting a new request.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    #[must_use]
    pub fn is_current(&self, token: FenceToken) -> bool {
        self.current.load(Ordering::Acquire) == token.0
    }

    /// `Some(value)` if `token` is still current, otherwise the value is dropped.
    pub fn accept<T>(&self, token: FenceToken, value: T) -> Option<T> {
        if self.is_current(token) {
            Some(value)
        } else {
            tracing::debug!(token = token.0, "Dropping stale response");
            None
        }
    }
}
