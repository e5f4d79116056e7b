//! Query performance monitoring.
//!
//! The monitor aggregates elapsed execution time per query type. Query
//! types are free-form strings; the executor uses `"{table}.{verb}"`
//! keys such as `users.list` or `orders.count`. All counters are
//! lock-free, so recording from concurrent tasks never serializes the
//! hot path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::warn;

/// Executions slower than this are flagged as slow queries.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(1000);

static GLOBAL: Lazy<QueryPerformanceMonitor> = Lazy::new(QueryPerformanceMonitor::new);

#[derive(Debug)]
struct QueryStats {
	count: AtomicU64,
	total_ms: AtomicU64,
	min_ms: AtomicU64,
	max_ms: AtomicU64,
	slow_count: AtomicU64,
}

impl QueryStats {
	fn new() -> Self {
		Self {
			count: AtomicU64::new(0),
			total_ms: AtomicU64::new(0),
			min_ms: AtomicU64::new(u64::MAX),
			max_ms: AtomicU64::new(0),
			slow_count: AtomicU64::new(0),
		}
	}

	fn record(&self, elapsed_ms: u64, slow: bool) {
		self.count.fetch_add(1, Ordering::Relaxed);
		self.total_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
		self.min_ms.fetch_min(elapsed_ms, Ordering::Relaxed);
		self.max_ms.fetch_max(elapsed_ms, Ordering::Relaxed);
		if slow {
			self.slow_count.fetch_add(1, Ordering::Relaxed);
		}
	}

	fn snapshot(&self, query_type: &str) -> QueryStatsSnapshot {
		let count = self.count.load(Ordering::Relaxed);
		let min_ms = self.min_ms.load(Ordering::Relaxed);
		QueryStatsSnapshot {
			query_type: query_type.to_string(),
			count,
			total_ms: self.total_ms.load(Ordering::Relaxed),
			min_ms: if count == 0 { 0 } else { min_ms },
			max_ms: self.max_ms.load(Ordering::Relaxed),
			slow_count: self.slow_count.load(Ordering::Relaxed),
		}
	}
}

/// A point-in-time copy of the counters for one query type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStatsSnapshot {
	pub query_type: String,
	pub count: u64,
	pub total_ms: u64,
	pub min_ms: u64,
	pub max_ms: u64,
	pub slow_count: u64,
}

impl QueryStatsSnapshot {
	/// Mean execution time, zero when nothing was recorded.
	pub fn avg_ms(&self) -> u64 {
		if self.count == 0 {
			0
		} else {
			self.total_ms / self.count
		}
	}
}

/// Aggregates per-query-type execution statistics.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use smart_query::monitor::QueryPerformanceMonitor;
///
/// let monitor = QueryPerformanceMonitor::new();
/// monitor.record("users.list", Duration::from_millis(40));
/// monitor.record("users.list", Duration::from_millis(60));
///
/// let stats = monitor.stats("users.list").unwrap();
/// assert_eq!(stats.count, 2);
/// assert_eq!(stats.avg_ms(), 50);
/// ```
#[derive(Debug)]
pub struct QueryPerformanceMonitor {
	threshold: Duration,
	stats: DashMap<String, QueryStats>,
	total_count: AtomicU64,
	total_ms: AtomicU64,
}

impl QueryPerformanceMonitor {
	/// A monitor with the default slow-query threshold of one second.
	pub fn new() -> Self {
		Self::with_threshold(DEFAULT_SLOW_THRESHOLD)
	}

	/// A monitor with a custom slow-query threshold.
	pub fn with_threshold(threshold: Duration) -> Self {
		Self {
			threshold,
			stats: DashMap::new(),
			total_count: AtomicU64::new(0),
			total_ms: AtomicU64::new(0),
		}
	}

	/// The process-wide monitor the executor records into.
	pub fn global() -> &'static Self {
		&GLOBAL
	}

	/// Record one execution of `query_type`.
	///
	/// Emits a warning when the elapsed time crosses the slow-query
	/// threshold.
	pub fn record(&self, query_type: &str, elapsed: Duration) {
		let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
		let slow = elapsed > self.threshold;

		self.total_count.fetch_add(1, Ordering::Relaxed);
		self.total_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
		self.stats
			.entry(query_type.to_string())
			.or_insert_with(QueryStats::new)
			.record(elapsed_ms, slow);

		if slow {
			warn!(query_type, elapsed_ms, "slow query detected");
		}
	}

	/// Start timing one execution; call [`QueryTimer::finish`] when it
	/// completes.
	pub fn start(&self, query_type: impl Into<String>) -> QueryTimer<'_> {
		QueryTimer {
			monitor: self,
			query_type: query_type.into(),
			started: Instant::now(),
		}
	}

	/// Snapshot of the counters for one query type.
	pub fn stats(&self, query_type: &str) -> Option<QueryStatsSnapshot> {
		self.stats
			.get(query_type)
			.map(|entry| entry.snapshot(query_type))
	}

	/// Snapshots for every recorded query type, in no particular order.
	pub fn all_stats(&self) -> Vec<QueryStatsSnapshot> {
		self.stats
			.iter()
			.map(|entry| entry.value().snapshot(entry.key()))
			.collect()
	}

	/// Total executions recorded across all query types.
	pub fn total_queries(&self) -> u64 {
		self.total_count.load(Ordering::Relaxed)
	}

	/// Total execution time recorded across all query types.
	pub fn total_time(&self) -> Duration {
		Duration::from_millis(self.total_ms.load(Ordering::Relaxed))
	}

	/// The configured slow-query threshold.
	pub fn slow_threshold(&self) -> Duration {
		self.threshold
	}

	/// Drop every counter, including the overall totals.
	pub fn reset(&self) {
		self.stats.clear();
		self.total_count.store(0, Ordering::Relaxed);
		self.total_ms.store(0, Ordering::Relaxed);
	}
}

impl Default for QueryPerformanceMonitor {
	fn default() -> Self {
		Self::new()
	}
}

/// Measures one query execution against a monitor.
#[derive(Debug)]
pub struct QueryTimer<'a> {
	monitor: &'a QueryPerformanceMonitor,
	query_type: String,
	started: Instant,
}

impl QueryTimer<'_> {
	/// Stop the clock and record the elapsed time.
	pub fn finish(self) -> Duration {
		let elapsed = self.started.elapsed();
		self.monitor.record(&self.query_type, elapsed);
		elapsed
	}
}
