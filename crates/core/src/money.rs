//! Money representation.
//!
//! All amounts are integer minor units (cents). Signed so that reversal math
//! and refund deltas stay in one type; domain rules keep persisted totals ≥ 0.

/// Amount in minor currency units.
pub type Cents = i64;

/// Tax rate expressed in basis points (1300 = 13%).
pub type RateBps = u32;
