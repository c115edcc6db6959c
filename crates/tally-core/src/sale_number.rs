//! # Sale Number Generator
//!
//! Human-readable, unique sale numbers.
//!
//! ```text
//! TRX-20261016-1792137600-a3f9c2
//! │   │        │          │
//! │   │        │          └── 6 hex chars from a v4 UUID
//! │   │        └── unix seconds
//! │   └── UTC calendar date
//! └── prefix
//! ```
//!
//! Two sales in the same second still differ in the suffix. The database
//! UNIQUE constraint is the final arbiter: a collision surfaces as
//! `DuplicateSaleNumber` and is not retried.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Prefix of every sale number.
pub const SALE_NUMBER_PREFIX: &str = "TRX";

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for sale timestamps and numbers.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// =============================================================================
// Generation
// =============================================================================

/// Generates a fresh sale number for `now`.
pub fn generate(now: DateTime<Utc>) -> String {
    format_sale_number(now, Uuid::new_v4())
}

/// Formats a sale number from a timestamp and an entropy source.
pub fn format_sale_number(now: DateTime<Utc>, entropy: Uuid) -> String {
    let suffix = entropy.simple().to_string();
    format!(
        "{}-{}-{}-{}",
        SALE_NUMBER_PREFIX,
        now.format("%Y%m%d"),
        now.timestamp(),
        &suffix[..6]
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
