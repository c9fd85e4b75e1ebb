//! Telemetry sampling of the book and simulator statistics.
//!
//! The sampler is a pure reader: it takes the book's shared lock once per
//! sample, copies scalar fields and the top depth levels into an owned
//! snapshot, and never holds a reference into book-owned memory. Simulator
//! counters come from individual atomics, so a snapshot may mix values from
//! adjacent updates; each sample is internally plausible rather than
//! globally consistent.

use crate::order::{self, Price, Qty};
use crate::order::book::Book;
use crate::sim::SimStats;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use time::OffsetDateTime;

/// Levels reported per side when not configured otherwise.
pub const DEFAULT_DEPTH: usize = 10;

/// One aggregated price level, in quote/base units.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DepthEntry {
    pub price: f64,
    pub size: f64,
}

impl DepthEntry {
    fn new(price: Price, qty: Qty) -> Self {
        DepthEntry {
            price: order::price_to_f64(price),
            size: order::qty_to_f64(qty),
        }
    }
}

/// Market data snapshot handed to the transport. Empty-side prices are
/// encoded as zero.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub symbol: String,
    pub price: f64,
    pub high: f64,
    pub low: f64,
    pub best_bid: f64,
    pub best_ask: f64,
    pub spread: f64,
    pub mid_price: f64,
    pub orders_per_second: u64,
    pub total_orders: u64,
    pub total_trades: u64,
    /// Top bid levels, descending price.
    pub bids: Vec<DepthEntry>,
    /// Top ask levels, ascending price.
    pub asks: Vec<DepthEntry>,
}

/// Pure reader over a shared book and simulator counters.
pub struct Sampler {
    book: Arc<RwLock<Book>>,
    stats: Arc<SimStats>,
    depth: usize,
}

impl Sampler {
    pub fn new(book: Arc<RwLock<Book>>, stats: Arc<SimStats>, depth: usize) -> Self {
        Sampler { book, stats, depth }
    }

    /// Build one snapshot. Takes the book's shared lock exactly once.
    pub fn sample(&self) -> Snapshot {
        let stats = self.stats.snapshot();
        let (symbol, best_bid, best_ask, spread, mid_price, depth) = {
            let book = self.book.read();
            (
                book.symbol().to_string(),
                book.best_bid(),
                book.best_ask(),
                book.spread(),
                book.mid_price(),
                book.depth(self.depth),
            )
        };

        Snapshot {
            kind: "telemetry",
            timestamp: now_ms(),
            symbol,
            price: stats.current_price,
            high: stats.high_price,
            low: stats.low_price,
            best_bid: best_bid.map(order::price_to_f64).unwrap_or(0.0),
            best_ask: best_ask.map(order::price_to_f64).unwrap_or(0.0),
            spread: spread.map(order::price_to_f64).unwrap_or(0.0),
            mid_price: mid_price * order::TICK,
            orders_per_second: stats.orders_per_second as u64,
            total_orders: stats.orders_generated,
            total_trades: stats.trades_executed,
            bids: depth
                .bids
                .iter()
                .map(|item| DepthEntry::new(item.price, item.qty))
                .collect(),
            asks: depth
                .asks
                .iter()
                .map(|item| DepthEntry::new(item.price, item.qty))
                .collect(),
        }
    }
}

fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Periodically samples and hands each snapshot to a sink on a dedicated
/// thread. Dropping the publisher stops and joins the thread.
pub struct Publisher {
    running: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Publisher {
    /// Spawn the sampling loop. The interval is measured from the start of
    /// each iteration, so slow sinks shorten the sleep rather than shifting
    /// the period.
    pub fn start(
        sampler: Sampler,
        interval: Duration,
        mut sink: impl FnMut(Snapshot) + Send + 'static,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let worker = thread::Builder::new()
            .name("telemetry".into())
            .spawn(move || {
                while flag.load(Ordering::Acquire) {
                    let begin = Instant::now();
                    sink(sampler.sample());
                    let elapsed = begin.elapsed();
                    if elapsed < interval {
                        thread::sleep(interval - elapsed);
                    }
                }
            })
            .expect("could not spawn telemetry publisher");

        Publisher {
            running,
            worker: Some(worker),
        }
    }

    /// Signal the loop to exit and join it. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.stop();
    }
}
