use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Collections are considered stale after 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A fetched payload and when it was fetched.
///
/// Freshness is measured on tokio's monotonic clock so it is immune to wall
/// clock changes (and can be driven by a paused clock in tests).
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    pub data: T,
    pub fetched_at: Instant,
}

impl<T> CachedData<T> {
    pub fn new(data: T, now: Instant) -> Self {
        Self {
            data,
            fetched_at: now,
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// "just now", "12m ago", "3h ago", "2d ago"
pub fn age_display(since: DateTime<Utc>) -> String {
    let minutes = (Utc::now() - since).num_minutes();
    if minutes < 1 {
        // Also covers clock skew (negative ages)
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// Single-slot cache for a whole collection.
#[derive(Debug)]
pub struct TtlCell<T> {
    ttl: Duration,
    entry: Option<CachedData<T>>,
}

impl<T> TtlCell<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// The payload, only while it is younger than the TTL.
    pub fn fresh(&self, now: Instant) -> Option<&T> {
        self.entry
            .as_ref()
            .filter(|cached| cached.is_fresh(now, self.ttl))
            .map(|cached| &cached.data)
    }

    pub fn put(&mut self, payload: T, now: Instant) {
        self.entry = Some(CachedData::new(payload, now));
    }

    /// Remove the entry entirely; the next read is a miss, not a stale hit.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}

/// Cache partitioned by a parent id. A missing key means never fetched or
/// invalidated, never "empty collection".
#[derive(Debug)]
pub struct KeyedTtlCache<T> {
    ttl: Duration,
    entries: HashMap<String, CachedData<T>>,
}

impl<T> KeyedTtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn fresh(&self, key: &str, now: Instant) -> Option<&T> {
        self.entries
            .get(key)
            .filter(|cached| cached.is_fresh(now, self.ttl))
            .map(|cached| &cached.data)
    }

    pub fn put(&mut self, key: &str, payload: T, now: Instant) {
        self.entries
            .insert(key.to_string(), CachedData::new(payload, now));
    }

    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_display_rounding() {
        assert_eq!(age_display(Utc::now() - chrono::Duration::minutes(12)), "12m ago");
        assert_eq!(age_display(Utc::now() - chrono::Duration::minutes(95)), "2h ago");
        assert_eq!(age_display(Utc::now() - chrono::Duration::hours(25)), "1d ago");
        assert_eq!(age_display(Utc::now() + chrono::Duration::minutes(5)), "just now");
    }

    #[test]
    fn test_freshness_is_strictly_less_than_ttl() {
        let start = Instant::now();
        let ttl = Duration::from_secs(300);
        let cached = CachedData::new("payload", start);

        assert!(cached.is_fresh(start + Duration::from_secs(299), ttl));
        assert!(!cached.is_fresh(start + ttl, ttl));
    }

    #[test]
    fn test_cell_put_fresh_invalidate() {
        let start = Instant::now();
        let mut cell = TtlCell::new(DEFAULT_TTL);
        assert!(cell.is_empty());
        assert_eq!(cell.fresh(start), None);

        cell.put(vec!["e1"], start);
        let later = start + Duration::from_secs(10);
        assert_eq!(cell.fresh(later), Some(&vec!["e1"]));

        cell.invalidate();
        assert!(cell.is_empty());
        assert_eq!(cell.fresh(later), None);
    }

    #[test]
    fn test_stale_cell_is_kept_but_not_fresh() {
        let start = Instant::now();
        let mut cell = TtlCell::new(Duration::from_secs(60));
        cell.put(1, start);

        let stale = start + Duration::from_secs(61);
        assert!(!cell.is_empty());
        assert_eq!(cell.fresh(stale), None);
    }

    #[test]
    fn test_put_resets_fetched_at() {
        let start = Instant::now();
        let mut cell = TtlCell::new(Duration::from_secs(60));
        cell.put(1, start);
        cell.put(2, start + Duration::from_secs(50));

        assert_eq!(cell.fresh(start + Duration::from_secs(100)), Some(&2));
    }

    #[test]
    fn test_keyed_cache_invalidates_only_one_key() {
        let now = Instant::now();
        let mut cache = KeyedTtlCache::new(DEFAULT_TTL);
        cache.put("ev-a", vec!["img1"], now);
        cache.put("ev-b", vec!["img2"], now);

        cache.invalidate("ev-a");

        assert!(!cache.contains("ev-a"));
        assert_eq!(cache.fresh("ev-a", now), None);
        assert_eq!(cache.fresh("ev-b", now), Some(&vec!["img2"]));
        assert_eq!(cache.len(), 1);
    }
}
