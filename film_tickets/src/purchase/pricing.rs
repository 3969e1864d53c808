//! Ticket pricing estimate and reconciliation with the service total.

use crate::money::Money;

/// Service fee charged on top of the ticket subtotal, in percent.
pub const FEE_RATE_PERCENT: i64 = 21;

/// Client-side price estimate shown before confirming.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Quote {
    pub unit_price: Money,
    pub quantity: u32,
    pub subtotal: Money,
    pub fee: Money,
    pub total: Money,
}

/// Fee for a subtotal, rounded half-up to the cent.
#[must_use]
pub fn service_fee(subtotal: Money) -> Money {
    subtotal.percent(FEE_RATE_PERCENT)
}

#[must_use]
pub fn quote(unit_price: Money, quantity: u32) -> Quote {
    let subtotal = unit_price.times(quantity);
    let fee = service_fee(subtotal);
    Quote {
        unit_price,
        quantity,
        subtotal,
        fee,
        total: subtotal + fee,
    }
}

/// Estimated total next to the total the service actually recorded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Reconciliation {
    pub estimated: Money,
    pub authoritative: Money,
}

impl Reconciliation {
    /// The total to display. Always the service's.
    #[must_use]
    pub fn shown_total(&self) -> Money {
        self.authoritative
    }

    #[must_use]
    pub fn is_mismatch(&self) -> bool {
        self.estimated != self.authoritative
    }
}

pub fn reconcile(quote: &Quote, server_total: Money) -> Reconciliation {
    let reconciliation = Reconciliation {
        estimated: quote.total,
        authoritative: server_total,
    };
    if reconciliation.is_mismatch() {
        tracing::warn!(
            estimated = %quote.total,
            charged = %server_total,
            "Service total differs from the client estimate"
        );
    }
    reconciliation
}
