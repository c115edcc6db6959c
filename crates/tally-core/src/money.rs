//! # Money Module
//!
//! Integer cents for every price, subtotal, total, payment and change.
//!
//! ## Where Money Flows in a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.price_cents                                                   │
//! │       │  pricing::unit_price()                                          │
//! │       ▼                                                                 │
//! │  unit_price ── × quantity ──► line subtotal   (checked, no overflow)    │
//! │                                   │  Σ (assembler)                      │
//! │                                   ▼                                     │
//! │  tendered ── checked_change(total) ──► change  (None → underpaid)       │
//! │                                                                         │
//! │  999 × 2 = 1998, 2500 − 1998 = 502: exact, no epsilon anywhere.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let subtotal = Money::from_cents(999).checked_multiply_quantity(2).unwrap();
//! let change = Money::from_cents(2500).checked_change(subtotal);
//!
//! assert_eq!(change, Some(Money::from_cents(502)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

/// An amount in cents.
///
/// Serializes as a bare integer. Signed so that a subtraction that goes
/// below zero is visible to the caller rather than wrapping.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Line subtotal: unit price times quantity. `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Change owed when `self` is tendered against `total`.
    ///
    /// `None` when the tendered amount does not cover the total.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let total = Money::from_cents(5000);
    /// assert_eq!(Money::from_cents(4000).checked_change(total), None);
    /// assert_eq!(total.checked_change(total), Some(Money::zero()));
    /// ```
    #[inline]
    pub fn checked_change(self, total: Money) -> Option<Money> {
        (self >= total).then(|| Money(self.0 - total.0))
    }
}

/// `$D.CC`, for messages and logs only. Clients format `*_cents` themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
