//! Stochastic market flow generator.
//!
//! A dedicated worker thread drives a shared order book with synthetic limit
//! orders: a mean-reverting random walk produces the mid price, and each step
//! submits one randomized order whose limit straddles the walk, so the flow
//! is two-sided and occasionally crosses. Throughput is paced in batches
//! against a target orders-per-second rate.

use crate::order::{self, Side};
use crate::order::book::Book;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Relative price shock applied per generated order.
const PRICE_SHOCK: f64 = 0.01;
/// Pull factor toward the base price per generated order.
const MEAN_REVERSION: f64 = 1e-4;
/// Half-spread offset range around the walk, in quote units.
const SPREAD_RANGE: (f64, f64) = (0.5, 5.0);
/// Order size range, in base units. The lower bound rounds to one lot, so a
/// generated order never has zero quantity.
const SIZE_RANGE: (f64, f64) = (0.001, 2.0);

/// Orders generated between pacing checkpoints.
const DEFAULT_BATCH_SIZE: u64 = 10_000;

/// Handler invoked with `(current_price, total_orders)` every N generated
/// orders.
pub type PriceHook = Box<dyn FnMut(f64, u64) + Send>;

/// Live simulation counters, published as individual atomics. Readers may
/// observe values from adjacent updates; tuples are not consistent.
pub struct SimStats {
    orders_generated: AtomicU64,
    trades_executed: AtomicU64,
    current_price: AtomicU64,
    high_price: AtomicU64,
    low_price: AtomicU64,
    orders_per_second: AtomicU64,
    running: AtomicBool,
}

impl SimStats {
    fn new(start_price: f64) -> Self {
        SimStats {
            orders_generated: AtomicU64::new(0),
            trades_executed: AtomicU64::new(0),
            current_price: AtomicU64::new(start_price.to_bits()),
            high_price: AtomicU64::new(start_price.to_bits()),
            low_price: AtomicU64::new(start_price.to_bits()),
            orders_per_second: AtomicU64::new(0.0f64.to_bits()),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Copies every counter into a plain struct. Fields may tear relative to
    /// each other; each individual value is consistent.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            orders_generated: self.orders_generated.load(Ordering::Relaxed),
            trades_executed: self.trades_executed.load(Ordering::Relaxed),
            current_price: f64::from_bits(self.current_price.load(Ordering::Relaxed)),
            high_price: f64::from_bits(self.high_price.load(Ordering::Relaxed)),
            low_price: f64::from_bits(self.low_price.load(Ordering::Relaxed)),
            orders_per_second: f64::from_bits(self.orders_per_second.load(Ordering::Relaxed)),
            running: self.is_running(),
        }
    }

    fn publish_price(&self, price: f64) {
        self.current_price.store(price.to_bits(), Ordering::Relaxed);
        if price > f64::from_bits(self.high_price.load(Ordering::Relaxed)) {
            self.high_price.store(price.to_bits(), Ordering::Relaxed);
        }
        if price < f64::from_bits(self.low_price.load(Ordering::Relaxed)) {
            self.low_price.store(price.to_bits(), Ordering::Relaxed);
        }
    }
}

/// Point-in-time copy of [`SimStats`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatsSnapshot {
    pub orders_generated: u64,
    pub trades_executed: u64,
    pub current_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub orders_per_second: f64,
    pub running: bool,
}

/// Drives a book with synthetic order flow from a dedicated worker thread.
///
/// The simulator worker is the book's sole writer; telemetry readers take the
/// shared side of the lock. Dropping the simulator stops and joins the
/// worker.
pub struct MarketSimulator {
    book: Arc<RwLock<Book>>,
    stats: Arc<SimStats>,
    hook: Arc<Mutex<Option<PriceHook>>>,
    hook_every: Arc<AtomicU64>,
    base_price: f64,
    batch_size: u64,
    worker: Option<thread::JoinHandle<()>>,
}

impl MarketSimulator {
    pub fn new(book: Arc<RwLock<Book>>, base_price: f64) -> Self {
        MarketSimulator {
            book,
            stats: Arc::new(SimStats::new(base_price)),
            hook: Arc::new(Mutex::new(None)),
            hook_every: Arc::new(AtomicU64::new(0)),
            base_price,
            batch_size: DEFAULT_BATCH_SIZE,
            worker: None,
        }
    }

    pub fn batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Point-in-time copy of the simulation counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shared handle to the live counters, for concurrent readers.
    pub fn stats_handle(&self) -> Arc<SimStats> {
        self.stats.clone()
    }

    /// Register a handler invoked with `(current_price, total_orders)` every
    /// `every` generated orders, replacing any previous handler.
    pub fn set_price_hook(&self, hook: impl FnMut(f64, u64) + Send + 'static, every: u64) {
        *self.hook.lock() = Some(Box::new(hook));
        self.hook_every.store(every.max(1), Ordering::Relaxed);
    }

    /// Start generating orders at the given target rate on a worker thread.
    /// Calling start while already running is a no-op.
    pub fn start(&mut self, target_ops: u64) {
        if self.stats.running.swap(true, Ordering::AcqRel) {
            return;
        }

        let worker = Worker {
            book: self.book.clone(),
            stats: self.stats.clone(),
            hook: self.hook.clone(),
            hook_every: self.hook_every.clone(),
            base_price: self.base_price,
            batch_size: self.batch_size,
            target_ops: target_ops.max(1),
        };
        let handle = thread::Builder::new()
            .name("sim-worker".into())
            .spawn(move || worker.run())
            .expect("could not spawn simulator worker");
        self.worker = Some(handle);
        info!(target_ops, "market simulator started");
    }

    /// Signal the worker to exit and join it. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.stats.running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
            debug!("market simulator worker joined");
        }
    }
}

impl Drop for MarketSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    book: Arc<RwLock<Book>>,
    stats: Arc<SimStats>,
    hook: Arc<Mutex<Option<PriceHook>>>,
    hook_every: Arc<AtomicU64>,
    base_price: f64,
    batch_size: u64,
    target_ops: u64,
}

impl Worker {
    fn run(self) {
        let mut rng = StdRng::from_entropy();
        let mut price = f64::from_bits(self.stats.current_price.load(Ordering::Relaxed));
        let started = Instant::now();
        let mut generated: u64 = 0;
        let mut last_hook: u64 = 0;

        while self.stats.running.load(Ordering::Acquire) {
            for _ in 0..self.batch_size {
                // Cooperative shutdown check bounds stop latency to one step.
                if !self.stats.running.load(Ordering::Relaxed) {
                    break;
                }

                price = self.step_price(&mut rng, price);
                self.submit_order(&mut rng, price);
                generated += 1;
                self.stats.orders_generated.fetch_add(1, Ordering::Relaxed);

                let every = self.hook_every.load(Ordering::Relaxed);
                if every != 0 && generated - last_hook >= every {
                    if let Some(hook) = self.hook.lock().as_mut() {
                        hook(price, generated);
                    }
                    last_hook = generated;
                }
            }

            let elapsed = started.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                self.stats
                    .orders_per_second
                    .store((generated as f64 / elapsed).to_bits(), Ordering::Relaxed);
            }
            self.stats
                .trades_executed
                .store(self.book.read().trade_count(), Ordering::Relaxed);

            // Throttle when running ahead of the target rate; never try to
            // catch up when behind.
            let expected = generated as f64 / self.target_ops as f64;
            if elapsed < expected {
                thread::sleep(Duration::from_secs_f64(expected - elapsed));
            }
        }
    }

    /// One step of the price process: multiplicative shock, then mean
    /// reversion toward the base price.
    fn step_price(&self, rng: &mut StdRng, mut price: f64) -> f64 {
        let shock = rng.gen_range(-PRICE_SHOCK..PRICE_SHOCK);
        price *= 1.0 + shock;
        price += (self.base_price - price) * MEAN_REVERSION;
        self.stats.publish_price(price);
        price
    }

    fn submit_order(&self, rng: &mut StdRng, price: f64) {
        let side = if rng.gen_bool(0.5) {
            Side::Bid
        } else {
            Side::Ask
        };
        let offset = rng.gen_range(SPREAD_RANGE.0..SPREAD_RANGE.1);
        let limit = match side {
            Side::Bid => price - offset,
            Side::Ask => price + offset,
        };
        let qty = order::qty_from_f64(rng.gen_range(SIZE_RANGE.0..SIZE_RANGE.1));

        let _ = self
            .book
            .write()
            .submit(side, order::price_from_f64(limit), qty);
    }
}
