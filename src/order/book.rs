//! Limit order book with price-time priority matching.
//!
//! Two BTreeMaps hold the price ladder (bids iterated highest price first,
//! asks lowest first). Each price level maintains a FIFO queue of orders as a
//! doubly-linked list of indices into a Slab, avoiding per-order allocations
//! and allowing O(1) removal within a level. A HashMap keeps the id-to-slot
//! handle so cancels are O(1) once the id is resolved.
//!
//! Matching is taker-driven: an incoming order crosses against the best
//! opposite levels until its limit no longer allows a fill, and any residue
//! is appended to its own side's queue. Fills always execute at the resting
//! maker's price.

use crate::order::{self, Id, Order, Price, Qty, Side, Timestamp};
use crate::trade::Trade;
use parking_lot::Mutex;
use slab::Slab;
use std::cmp;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Handler invoked synchronously for every trade, on the writer's thread.
/// Must not reenter the book.
pub type TradeHandler = Box<dyn FnMut(&Trade) + Send>;

/// Aggregated depth at a single price level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DepthItem {
    /// Price level, in ticks.
    pub price: Price,
    /// Total resting quantity at this level, in lots.
    pub qty: Qty,
}

/// A snapshot of the best price levels on both sides of the book.
#[derive(Debug, Clone, Default)]
pub struct Depth {
    /// Best bids in descending price order.
    pub bids: Vec<DepthItem>,
    /// Best asks in ascending price order.
    pub asks: Vec<DepthItem>,
}

/// Order-book errors. All of these are caller mistakes reported at the call
/// site; none of them leave the book in an inconsistent state.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("order price must be positive")]
    ZeroPrice,
    #[error("order quantity must be positive")]
    ZeroQty,
    #[error("could not find resting order with id #{0}")]
    OrderIdNotFound(Id),
}

/// One side's FIFO queue at a single price: the slab indices of its first and
/// last node, plus the quantity resting across the whole queue. The list
/// links themselves live on the nodes; [`Book::rest`] and [`Book::detach`]
/// maintain them together with this aggregate.
#[derive(Debug, Default)]
struct PriceLevel {
    head: Option<usize>,
    tail: Option<usize>,
    total_qty: Qty,
}

/// Node representing an individual order stored in the slab and linked within
/// a price level's FIFO queue.
#[derive(Debug)]
struct OrderNode {
    order: Order,
    next: Option<usize>,
    prev: Option<usize>,
}

/// Price-time priority limit order book for a single symbol.
pub struct Book {
    bids: BTreeMap<Price, PriceLevel>,
    asks: BTreeMap<Price, PriceLevel>,
    orders: Slab<OrderNode>,
    index: HashMap<Id, usize>,
    next_id: Id,
    trade_count: u64,
    last_price: Option<Price>,
    last_ts: Timestamp,
    symbol: String,
    // The mutex keeps Book Sync so readers can share it behind an RwLock; the
    // single writer reaches the handler through get_mut without locking.
    on_trade: Option<Mutex<TradeHandler>>,
}

impl Book {
    /// Create a new, empty book for the given symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Book {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: Slab::new(),
            index: HashMap::new(),
            next_id: 1,
            trade_count: 0,
            last_price: None,
            last_ts: 0,
            symbol: symbol.into(),
            on_trade: None,
        }
    }

    /// Submit a limit order: assign it the next id, match it against the
    /// opposite side, and rest any residue.
    ///
    /// Returns `Ok(Some(id))` if the order rests with remaining quantity,
    /// `Ok(None)` if it was fully filled while matching. The id space is
    /// consumed in both cases, but not on a precondition error.
    pub fn submit(&mut self, side: Side, price: Price, qty: Qty) -> Result<Option<Id>, Error> {
        if price == 0 {
            return Err(Error::ZeroPrice);
        }
        if qty == 0 {
            return Err(Error::ZeroQty);
        }

        let id = self.next_id;
        self.next_id += 1;
        let timestamp = self.next_timestamp();
        let mut taker = Order::new(id, side, price, qty, timestamp);

        self.cross(&mut taker);

        if taker.is_filled() {
            return Ok(None);
        }
        self.rest(taker);
        Ok(Some(id))
    }

    /// Cancel a resting order by id, removing it from its queue and from the
    /// index. Fully filled orders are already gone and report
    /// [`Error::OrderIdNotFound`].
    pub fn cancel(&mut self, id: Id) -> Result<Order, Error> {
        let idx = *self.index.get(&id).ok_or(Error::OrderIdNotFound(id))?;
        Ok(self.detach(idx))
    }

    /// Register a handler invoked synchronously for each trade, replacing any
    /// previous handler.
    pub fn set_trade_handler(&mut self, handler: impl FnMut(&Trade) + Send + 'static) {
        self.on_trade = Some(Mutex::new(Box::new(handler)));
    }

    /// Drop all resting orders and reset the trade counter. The id counter
    /// and last trade price are preserved.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.orders.clear();
        self.index.clear();
        self.trade_count = 0;
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Best ask minus best bid; `None` unless both sides quote.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Arithmetic mean of the best quotes, in fractional ticks. Falls back to
    /// the last trade price when a side is empty, and to zero before any
    /// trade.
    pub fn mid_price(&self) -> f64 {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => (bid + ask) as f64 / 2.0,
            _ => self.last_price.unwrap_or(0) as f64,
        }
    }

    pub fn last_price(&self) -> Option<Price> {
        self.last_price
    }

    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Number of trades emitted since construction or the last [`clear`].
    ///
    /// [`clear`]: Book::clear
    pub fn trade_count(&self) -> u64 {
        self.trade_count
    }

    /// Number of ids issued so far.
    pub fn order_count(&self) -> u64 {
        self.next_id - 1
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Up to `n` best bid levels with aggregated quantities, best first.
    pub fn top_bids(&self, n: usize) -> Vec<DepthItem> {
        self.bids
            .iter()
            .rev()
            .take(n)
            .map(|(price, level)| DepthItem {
                price: *price,
                qty: level.total_qty,
            })
            .collect()
    }

    /// Up to `n` best ask levels with aggregated quantities, best first.
    pub fn top_asks(&self, n: usize) -> Vec<DepthItem> {
        self.asks
            .iter()
            .take(n)
            .map(|(price, level)| DepthItem {
                price: *price,
                qty: level.total_qty,
            })
            .collect()
    }

    /// Depth snapshot of both sides up to `limit` levels per side.
    pub fn depth(&self, limit: usize) -> Depth {
        Depth {
            bids: self.top_bids(limit),
            asks: self.top_asks(limit),
        }
    }

    /// Timestamps are wall-clock but clamped to be non-decreasing within the
    /// book.
    fn next_timestamp(&mut self) -> Timestamp {
        self.last_ts = cmp::max(self.last_ts, order::now_ns());
        self.last_ts
    }

    /// Match the taker against the best opposite levels until it is filled or
    /// its limit no longer crosses.
    fn cross(&mut self, taker: &mut Order) {
        while !taker.is_filled() {
            let best = match taker.side {
                Side::Bid => self.asks.keys().next().copied(),
                Side::Ask => self.bids.keys().next_back().copied(),
            };
            let Some(price) = best else { break };
            let crosses = match taker.side {
                Side::Bid => taker.price >= price,
                Side::Ask => taker.price <= price,
            };
            if !crosses {
                break;
            }
            self.take_level(taker, price);
        }
    }

    /// Consume makers from the head of the level at `price` (the taker's
    /// opposite side) until the taker is filled or the level is exhausted.
    fn take_level(&mut self, taker: &mut Order, price: Price) {
        while !taker.is_filled() {
            let maker_idx = {
                let level = match taker.side.opposite() {
                    Side::Bid => self.bids.get(&price),
                    Side::Ask => self.asks.get(&price),
                };
                // The level disappears from the map once its last maker is
                // detached below.
                match level.and_then(|level| level.head) {
                    Some(idx) => idx,
                    None => return,
                }
            };

            let fill = cmp::min(taker.remaining, self.orders[maker_idx].order.remaining);
            taker.remaining -= fill;
            self.orders[maker_idx].order.remaining -= fill;
            let maker = self.orders[maker_idx].order;

            // The aggregate shrinks by the fill here; a fully filled maker is
            // detached afterwards with zero remaining.
            let level = match taker.side.opposite() {
                Side::Bid => self.bids.get_mut(&price).unwrap(),
                Side::Ask => self.asks.get_mut(&price).unwrap(),
            };
            level.total_qty -= fill;

            if maker.is_filled() {
                self.detach(maker_idx);
            }

            let (bid_order_id, ask_order_id) = match taker.side {
                Side::Bid => (taker.id, maker.id),
                Side::Ask => (maker.id, taker.id),
            };
            self.record_trade(bid_order_id, ask_order_id, maker.price, fill);
        }
    }

    /// Append a residual taker to the tail of its own side's queue and
    /// register it in the index.
    fn rest(&mut self, order: Order) {
        let Order {
            id,
            side,
            price,
            remaining,
            ..
        } = order;
        let idx = self.orders.insert(OrderNode {
            order,
            next: None,
            prev: None,
        });
        self.index.insert(id, idx);

        let level = match side {
            Side::Bid => self.bids.entry(price).or_default(),
            Side::Ask => self.asks.entry(price).or_default(),
        };
        level.total_qty += remaining;
        match level.tail.replace(idx) {
            Some(old_tail) => {
                self.orders[old_tail].next = Some(idx);
                self.orders[idx].prev = Some(old_tail);
            }
            None => level.head = Some(idx),
        }
    }

    /// Remove an order from the book entirely: the slab, the id index, its
    /// level's queue, and the level itself once nothing rests there.
    fn detach(&mut self, idx: usize) -> Order {
        let node = self.orders.remove(idx);
        self.index.remove(&node.order.id);

        // Patch the neighbours around the gap; a missing neighbour means the
        // node was the head or tail of its queue.
        let (prev, next) = (node.prev, node.next);
        if let Some(p) = prev {
            self.orders[p].next = next;
        }
        if let Some(n) = next {
            self.orders[n].prev = prev;
        }

        let price = node.order.price;
        let levels = match node.order.side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        let level = levels.get_mut(&price).unwrap();
        level.total_qty -= node.order.remaining;
        if prev.is_none() {
            level.head = next;
        }
        if next.is_none() {
            level.tail = prev;
        }
        if level.head.is_none() {
            levels.remove(&price);
        }

        node.order
    }

    /// Commit a fill to the book's counters, then hand the trade to the
    /// registered handler. Book state is consistent before the handler runs.
    fn record_trade(&mut self, bid_order_id: Id, ask_order_id: Id, price: Price, qty: Qty) {
        self.last_price = Some(price);
        self.trade_count += 1;
        let timestamp = self.next_timestamp();
        let trade = Trade {
            bid_order_id,
            ask_order_id,
            price,
            qty,
            timestamp,
        };
        if let Some(handler) = self.on_trade.as_mut() {
            (handler.get_mut())(&trade);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{price_from_f64, qty_from_f64};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn p(price: f64) -> Price {
        price_from_f64(price)
    }

    fn q(qty: f64) -> Qty {
        qty_from_f64(qty)
    }

    fn book() -> Book {
        Book::new("BTCUSDT")
    }

    /// Registers a handler that copies every trade into a shared vec.
    fn capture_trades(book: &mut Book) -> Arc<parking_lot::Mutex<Vec<Trade>>> {
        let trades = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = trades.clone();
        book.set_trade_handler(move |trade| sink.lock().push(*trade));
        trades
    }

    /// Seeds the four resting orders shared by the crossing scenarios:
    /// bids 92000 x 1.5 and 91900 x 2.0, asks 92100 x 1.0 and 92200 x 0.5.
    fn seed_two_sided(book: &mut Book) {
        assert_eq!(book.submit(Side::Bid, p(92000.0), q(1.5)).unwrap(), Some(1));
        assert_eq!(book.submit(Side::Bid, p(91900.0), q(2.0)).unwrap(), Some(2));
        assert_eq!(book.submit(Side::Ask, p(92100.0), q(1.0)).unwrap(), Some(3));
        assert_eq!(book.submit(Side::Ask, p(92200.0), q(0.5)).unwrap(), Some(4));
    }

    #[test]
    fn test_empty_book() {
        let book = book();
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.spread(), None);
        assert_eq!(book.mid_price(), 0.0);
        assert_eq!(book.last_price(), None);
        assert_eq!(book.trade_count(), 0);
        assert_eq!(book.order_count(), 0);
        assert!(book.depth(10).bids.is_empty());
        assert!(book.depth(10).asks.is_empty());
    }

    #[test]
    fn test_rest_and_cross() {
        let mut book = book();
        let trades = capture_trades(&mut book);
        seed_two_sided(&mut book);

        assert_eq!(book.best_bid(), Some(p(92000.0)));
        assert_eq!(book.best_ask(), Some(p(92100.0)));
        assert_eq!(book.spread(), Some(p(100.0)));
        assert_eq!(book.trade_count(), 0);

        // Aggressive sell crosses the spread and fully fills against the top
        // bid at the maker's price.
        let resting = book.submit(Side::Ask, p(91000.0), q(0.8)).unwrap();
        assert_eq!(resting, None, "aggressive ask should fill completely");

        let trades = trades.lock();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].bid_order_id, 1);
        assert_eq!(trades[0].ask_order_id, 5);
        assert_eq!(trades[0].price, p(92000.0), "fill must use the maker's price");
        assert_eq!(trades[0].qty, q(0.8));

        assert_eq!(book.trade_count(), 1);
        assert_eq!(book.last_price(), Some(p(92000.0)));
        assert_eq!(book.best_bid(), Some(p(92000.0)));
        assert_eq!(
            book.top_bids(1),
            vec![DepthItem {
                price: p(92000.0),
                qty: q(0.7),
            }]
        );
    }

    #[test]
    fn test_sweep_multiple_levels() {
        let mut book = book();
        let trades = capture_trades(&mut book);
        seed_two_sided(&mut book);
        book.submit(Side::Ask, p(91000.0), q(0.8)).unwrap();

        // Aggressive buy sweeps the full best ask level and part of the next.
        let resting = book.submit(Side::Bid, p(93000.0), q(1.2)).unwrap();
        assert_eq!(resting, None);

        let trades = trades.lock();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[1].price, p(92100.0));
        assert_eq!(trades[1].qty, q(1.0));
        assert_eq!(trades[2].price, p(92200.0));
        assert_eq!(trades[2].qty, q(0.2));
        assert!(
            trades.iter().all(|t| t.price != p(93000.0)),
            "the taker's limit must never be a trade price"
        );

        assert_eq!(book.trade_count(), 3);
        assert_eq!(book.best_ask(), Some(p(92200.0)));
        assert_eq!(
            book.top_asks(1),
            vec![DepthItem {
                price: p(92200.0),
                qty: q(0.3),
            }]
        );
    }

    #[test]
    fn test_partial_fill_preserves_fifo() {
        let mut book = book();
        let trades = capture_trades(&mut book);

        let a = book.submit(Side::Bid, p(100.0), q(1.0)).unwrap().unwrap();
        let b = book.submit(Side::Bid, p(100.0), q(1.0)).unwrap().unwrap();

        book.submit(Side::Ask, p(100.0), q(0.4)).unwrap();
        book.submit(Side::Ask, p(100.0), q(0.7)).unwrap();

        let trades = trades.lock();
        assert_eq!(trades.len(), 3);
        // A must be consumed before B despite the partial fill in between.
        assert_eq!((trades[0].bid_order_id, trades[0].qty), (a, q(0.4)));
        assert_eq!((trades[1].bid_order_id, trades[1].qty), (a, q(0.6)));
        assert_eq!((trades[2].bid_order_id, trades[2].qty), (b, q(0.1)));

        assert_eq!(
            book.top_bids(1),
            vec![DepthItem {
                price: p(100.0),
                qty: q(0.9),
            }]
        );
    }

    #[test]
    fn test_cancel_mid_book() {
        let mut book = book();
        let x = book.submit(Side::Bid, p(99.0), q(1.0)).unwrap().unwrap();
        book.submit(Side::Bid, p(100.0), q(1.0)).unwrap().unwrap();

        let canceled = book.cancel(x).unwrap();
        assert_eq!(canceled.id, x);
        assert_eq!(canceled.remaining, q(1.0));

        assert_eq!(book.cancel(x), Err(Error::OrderIdNotFound(x)));
        assert_eq!(book.best_bid(), Some(p(100.0)));
        assert_eq!(
            book.top_bids(2),
            vec![DepthItem {
                price: p(100.0),
                qty: q(1.0),
            }]
        );
    }

    #[test]
    fn test_no_cross_when_limits_do_not_allow() {
        let mut book = book();
        let trades = capture_trades(&mut book);
        book.submit(Side::Ask, p(101.0), q(1.0)).unwrap();

        let resting = book.submit(Side::Bid, p(100.0), q(1.0)).unwrap();
        assert!(resting.is_some(), "non-crossing bid should rest");
        assert!(trades.lock().is_empty());
        assert_eq!(book.best_bid(), Some(p(100.0)));
        assert_eq!(book.best_ask(), Some(p(101.0)));
    }

    #[test]
    fn test_book_never_crossed_after_submit() {
        let mut book = book();
        for (side, price, qty) in [
            (Side::Bid, 100.0, 1.0),
            (Side::Ask, 101.0, 2.0),
            (Side::Bid, 102.0, 0.5),
            (Side::Ask, 99.0, 4.0),
            (Side::Bid, 99.5, 1.0),
            (Side::Ask, 99.5, 3.0),
        ] {
            book.submit(side, p(price), q(qty)).unwrap();
            if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
                assert!(bid < ask, "book crossed: bid {bid} >= ask {ask}");
            }
        }
    }

    #[test]
    fn test_precondition_errors_do_not_consume_ids() {
        let mut book = book();
        assert_eq!(book.submit(Side::Bid, 0, q(1.0)), Err(Error::ZeroPrice));
        assert_eq!(book.submit(Side::Bid, p(100.0), 0), Err(Error::ZeroQty));
        assert_eq!(book.order_count(), 0);

        assert_eq!(book.submit(Side::Bid, p(100.0), q(1.0)).unwrap(), Some(1));
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn test_ids_are_consumed_on_full_fill() {
        let mut book = book();
        book.submit(Side::Bid, p(100.0), q(1.0)).unwrap(); // id 1
        let filled = book.submit(Side::Ask, p(100.0), q(1.0)).unwrap(); // id 2
        assert_eq!(filled, None);
        assert_eq!(book.order_count(), 2);

        // The filled taker's id is gone from the id space; the next order
        // continues after it.
        assert_eq!(book.submit(Side::Bid, p(50.0), q(1.0)).unwrap(), Some(3));
        assert_eq!(book.cancel(2), Err(Error::OrderIdNotFound(2)));
    }

    #[test]
    fn test_fifo_after_cancel_of_head() {
        let mut book = book();
        let trades = capture_trades(&mut book);

        let first = book.submit(Side::Bid, p(100.0), q(2.0)).unwrap().unwrap();
        let second = book.submit(Side::Bid, p(100.0), q(3.0)).unwrap().unwrap();
        book.cancel(first).unwrap();

        book.submit(Side::Ask, p(99.0), q(2.0)).unwrap();
        let trades = trades.lock();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].bid_order_id, second);
        assert_eq!(trades[0].price, p(100.0));
        assert_eq!(
            book.top_bids(1),
            vec![DepthItem {
                price: p(100.0),
                qty: q(1.0),
            }]
        );
    }

    #[test]
    fn test_clear_preserves_id_counter_and_last_price() {
        let mut book = book();
        book.submit(Side::Bid, p(100.0), q(1.0)).unwrap();
        book.submit(Side::Ask, p(100.0), q(1.0)).unwrap();
        assert_eq!(book.trade_count(), 1);

        book.clear();
        assert_eq!(book.trade_count(), 0);
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);
        assert_eq!(book.order_count(), 2);
        assert_eq!(book.last_price(), Some(p(100.0)));

        assert_eq!(book.submit(Side::Bid, p(100.0), q(1.0)).unwrap(), Some(3));
    }

    #[test]
    fn test_trade_count_matches_handler_invocations() {
        let mut book = book();
        let seen = Arc::new(AtomicU64::new(0));
        let counter = seen.clone();
        book.set_trade_handler(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        for i in 0..5u64 {
            let price = p(100.0 + i as f64);
            book.submit(Side::Bid, price, q(1.0)).unwrap();
            book.submit(Side::Ask, price, q(1.0)).unwrap();
        }

        assert_eq!(book.trade_count(), 5);
        assert_eq!(seen.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_replacing_handler_drops_the_old_one() {
        let mut book = book();
        let first = Arc::new(AtomicU64::new(0));
        let second = Arc::new(AtomicU64::new(0));

        let counter = first.clone();
        book.set_trade_handler(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let counter = second.clone();
        book.set_trade_handler(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        book.submit(Side::Bid, p(100.0), q(1.0)).unwrap();
        book.submit(Side::Ask, p(100.0), q(1.0)).unwrap();

        assert_eq!(first.load(Ordering::Relaxed), 0);
        assert_eq!(second.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_quantity_is_conserved_across_fills() {
        let mut book = book();
        let trades = capture_trades(&mut book);

        book.submit(Side::Ask, p(100.0), q(2.0)).unwrap();
        book.submit(Side::Ask, p(100.0), q(3.0)).unwrap();
        let taker = book.submit(Side::Bid, p(101.0), q(10.0)).unwrap();
        assert!(taker.is_some(), "taker should rest with residue");

        let filled: Qty = trades.lock().iter().map(|t| t.qty).sum();
        let resting = book.top_bids(1)[0].qty;
        assert_eq!(filled, q(5.0));
        assert_eq!(filled + resting, q(10.0), "taker quantity must be conserved");
        assert!(book.asks.is_empty(), "both makers should be fully consumed");
    }

    #[test]
    fn test_mid_price_fallback() {
        let mut book = book();
        assert_eq!(book.mid_price(), 0.0);

        book.submit(Side::Bid, p(100.0), q(1.0)).unwrap();
        book.submit(Side::Ask, p(100.0), q(1.0)).unwrap();
        // One side is empty now, so mid falls back to the last trade price.
        assert_eq!(book.mid_price(), p(100.0) as f64);

        book.submit(Side::Bid, p(99.0), q(1.0)).unwrap();
        book.submit(Side::Ask, p(101.0), q(1.0)).unwrap();
        assert_eq!(book.mid_price(), (p(99.0) + p(101.0)) as f64 / 2.0);
    }

    #[test]
    fn test_depth_aggregates_and_orders_levels() {
        let mut book = book();
        book.submit(Side::Bid, p(100.0), q(1.0)).unwrap();
        book.submit(Side::Bid, p(100.0), q(2.0)).unwrap();
        book.submit(Side::Bid, p(99.0), q(3.0)).unwrap();
        book.submit(Side::Ask, p(101.0), q(4.0)).unwrap();
        book.submit(Side::Ask, p(102.0), q(5.0)).unwrap();

        let depth = book.depth(10);
        assert_eq!(
            depth.bids,
            vec![
                DepthItem {
                    price: p(100.0),
                    qty: q(3.0),
                },
                DepthItem {
                    price: p(99.0),
                    qty: q(3.0),
                },
            ]
        );
        assert_eq!(
            depth.asks,
            vec![
                DepthItem {
                    price: p(101.0),
                    qty: q(4.0),
                },
                DepthItem {
                    price: p(102.0),
                    qty: q(5.0),
                },
            ]
        );

        assert_eq!(book.top_bids(1).len(), 1);
        assert_eq!(book.bid_levels(), 2);
        assert_eq!(book.ask_levels(), 2);
    }

    #[test]
    fn test_timestamps_are_non_decreasing_within_a_queue() {
        let mut book = book();
        for _ in 0..10 {
            book.submit(Side::Bid, p(100.0), q(1.0)).unwrap();
        }

        let level = book.bids.get(&p(100.0)).unwrap();
        let mut cursor = level.head;
        let mut last = 0;
        while let Some(idx) = cursor {
            let node = &book.orders[idx];
            assert!(node.order.timestamp >= last);
            last = node.order.timestamp;
            cursor = node.next;
        }
    }
}
