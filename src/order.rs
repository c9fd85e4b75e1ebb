use time::OffsetDateTime;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

pub type Id = u64;
pub type Price = u64; // ticks
pub type Qty = u64; // lots
pub type Timestamp = u64; // nanoseconds since the Unix epoch

/// Quote units per price tick. Prices are stored as integer tick counts, so
/// two submissions at the same quote price always land on the same level.
pub const TICK: f64 = 0.01;
/// Base units per quantity lot.
pub const LOT: f64 = 0.001;

/// Converts a quote-unit price to ticks, rounding to the nearest tick.
pub fn price_from_f64(price: f64) -> Price {
    (price / TICK).round() as Price
}

pub fn price_to_f64(price: Price) -> f64 {
    price as f64 * TICK
}

/// Converts a base-unit quantity to lots, rounding to the nearest lot.
pub fn qty_from_f64(qty: f64) -> Qty {
    (qty / LOT).round() as Qty
}

pub fn qty_to_f64(qty: Qty) -> f64 {
    qty as f64 * LOT
}

pub(crate) fn now_ns() -> Timestamp {
    OffsetDateTime::now_utc().unix_timestamp_nanos() as Timestamp
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: Id,
    pub side: Side,
    pub price: Price,
    /// Unfilled quantity. The order leaves the book once this reaches zero.
    pub remaining: Qty,
    pub timestamp: Timestamp,
}

impl Order {
    pub fn new(id: Id, side: Side, price: Price, remaining: Qty, timestamp: Timestamp) -> Self {
        Order {
            id,
            side,
            price,
            remaining,
            timestamp,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.remaining == 0
    }
}

pub mod book;
