//! # Load Statistics
//!
//! Concurrency-safe accumulator mapping canonical project path to elapsed
//! load duration. Writers insert from many traversal tasks at once; keys
//! follow insert-once semantics and are never overwritten. A snapshot view
//! is exposed for slow-project diagnostics after a load completes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Per-project load durations accumulated by concurrent writers.
#[derive(Debug, Default)]
pub struct LoadStatistics {
    load_times: Mutex<HashMap<String, Duration>>,
}

impl LoadStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `(key, duration)` if `key` is not already recorded.
    ///
    /// Returns whether the insertion happened. Existing entries are never
    /// overwritten, so racing writers for the same key settle on the first
    /// duration recorded.
    pub fn record_if_absent(&self, key: &str, duration: Duration) -> bool {
        let mut times = self.load_times.lock().unwrap();
        if times.contains_key(key) {
            return false;
        }
        times.insert(key.to_string(), duration);
        true
    }

    /// Current mapping of canonical path to load duration.
    ///
    /// Iteration order of the returned map is unspecified.
    pub fn snapshot(&self) -> HashMap<String, Duration> {
        self.load_times.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.load_times.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.load_times.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_if_absent_inserts_new_key() {
        let stats = LoadStatistics::new();
        assert!(stats.record_if_absent("/a.proj", Duration::from_millis(5)));
        assert_eq!(stats.len(), 1);
        assert_eq!(
            stats.snapshot().get("/a.proj"),
            Some(&Duration::from_millis(5))
        );
    }

    #[test]
    fn test_record_if_absent_never_overwrites() {
        let stats = LoadStatistics::new();
        assert!(stats.record_if_absent("/a.proj", Duration::from_millis(5)));
        assert!(!stats.record_if_absent("/a.proj", Duration::from_millis(9)));
        assert_eq!(
            stats.snapshot().get("/a.proj"),
            Some(&Duration::from_millis(5))
        );
    }

    #[test]
    fn test_empty_snapshot() {
        let stats = LoadStatistics::new();
        assert!(stats.is_empty());
        assert!(stats.snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_inserts_settle_on_one_entry_per_key() {
        let stats = Arc::new(LoadStatistics::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        stats.record_if_absent(
                            &format!("/proj/{}.proj", i),
                            Duration::from_micros(worker),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.len(), 100);
    }
}
