//! Time-to-live cache in front of any [`DataPort`].
//!
//! Entries are keyed by symbol and served until they are older than the
//! TTL. Failed fetches are not cached.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::domain::error::VotecastError;
use crate::domain::series::PriceSeries;
use crate::ports::data_port::DataPort;

struct Entry {
    series: PriceSeries,
    fetched_at: Instant,
}

pub struct CachedDataPort<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl<P: DataPort> CachedDataPort<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop the cached series for `symbol`; returns whether one was cached.
    pub fn invalidate(&self, symbol: &str) -> bool {
        self.entries().remove(symbol).is_some()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P: DataPort> DataPort for CachedDataPort<P> {
    fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, VotecastError> {
        if let Some(entry) = self.entries().get(symbol) {
            if entry.fetched_at.elapsed() < self.ttl {
                debug!(symbol, "series cache hit");
                return Ok(entry.series.clone());
            }
        }

        debug!(symbol, "series cache miss");
        let series = self.inner.fetch_series(symbol)?;
        self.entries().insert(
            symbol.to_string(),
            Entry {
                series: series.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(series)
    }

    fn list_symbols(&self) -> Result<Vec<String>, VotecastError> {
        self.inner.list_symbols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PricePoint;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl DataPort for Counting {
        fn fetch_series(&self, symbol: &str) -> Result<PriceSeries, VotecastError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol == "MISSING" {
                return Err(VotecastError::NoData {
                    symbol: symbol.to_string(),
                });
            }
            let point = PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 1.0,
            };
            PriceSeries::new(symbol, vec![point], None)
        }

        fn list_symbols(&self) -> Result<Vec<String>, VotecastError> {
            Ok(vec!["SPY".to_string()])
        }
    }

    fn calls(cache: &CachedDataPort<Counting>) -> usize {
        cache.inner.calls.load(Ordering::SeqCst)
    }

    #[test]
    fn second_fetch_served_from_cache() {
        let cache = CachedDataPort::new(Counting::default(), Duration::from_secs(3600));
        cache.fetch_series("SPY").unwrap();
        let series = cache.fetch_series("SPY").unwrap();
        assert_eq!(series.symbol(), "SPY");
        assert_eq!(calls(&cache), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_ttl_always_refetches() {
        let cache = CachedDataPort::new(Counting::default(), Duration::ZERO);
        cache.fetch_series("SPY").unwrap();
        cache.fetch_series("SPY").unwrap();
        assert_eq!(calls(&cache), 2);
    }

    #[test]
    fn invalidate_forces_refetch() {
        let cache = CachedDataPort::new(Counting::default(), Duration::from_secs(3600));
        cache.fetch_series("SPY").unwrap();
        assert!(cache.invalidate("SPY"));
        assert!(!cache.invalidate("SPY"));
        cache.fetch_series("SPY").unwrap();
        assert_eq!(calls(&cache), 2);
    }

    #[test]
    fn clear_empties_cache() {
        let cache = CachedDataPort::new(Counting::default(), Duration::from_secs(3600));
        cache.fetch_series("SPY").unwrap();
        cache.fetch_series("QQQ").unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = CachedDataPort::new(Counting::default(), Duration::from_secs(3600));
        assert!(cache.fetch_series("MISSING").is_err());
        assert!(cache.fetch_series("MISSING").is_err());
        assert_eq!(calls(&cache), 2);
        assert!(cache.is_empty());
    }
}
