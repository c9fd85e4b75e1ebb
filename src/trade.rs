//! Trade representation produced by the matching engine.
//!
//! A Trade links the bid and ask orders that were matched, along with the
//! execution price (always the resting maker's limit price), the executed
//! quantity, and a timestamp.

use crate::order;

/// A single execution between a bid and an ask.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Trade {
    /// The bid order involved in the trade.
    pub bid_order_id: order::Id,
    /// The ask order involved in the trade.
    pub ask_order_id: order::Id,
    /// Execution price, in ticks. Equals the maker's resting price.
    pub price: order::Price,
    /// Executed quantity, in lots.
    pub qty: order::Qty,
    /// Nanoseconds since the Unix epoch when the trade was generated.
    pub timestamp: order::Timestamp,
}
