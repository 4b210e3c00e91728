use std::time::{Duration, Instant};

/// Freshness bookkeeping shared by both cache shapes
#[derive(Debug, Clone, Default)]
pub struct Freshness {
    fresh: bool,
    updated_at: Option<Instant>,
    ttl: Option<Duration>,
}

impl Freshness {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Default::default()
        }
    }

    pub fn mark_fresh(&mut self) {
        self.fresh = true;
        self.updated_at = Some(Instant::now());
    }

    /// Fresh since the last successful update, and not past the TTL
    pub fn is_fresh(&self) -> bool {
        if !self.fresh {
            return false;
        }
        match (self.ttl, self.updated_at) {
            (Some(ttl), Some(updated_at)) => updated_at.elapsed() < ttl,
            _ => true,
        }
    }

    pub fn is_never_updated(&self) -> bool {
        self.updated_at.is_none()
    }

    pub fn invalidate(&mut self) {
        self.fresh = false;
    }
}

/// Ordered in-memory list owned by a single repository
#[derive(Debug, Clone)]
pub struct ItemsCache<T> {
    items: Vec<T>,
    freshness: Freshness,
}

impl<T> Default for ItemsCache<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            freshness: Freshness::default(),
        }
    }
}

impl<T: Clone> ItemsCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            items: Vec::new(),
            freshness: Freshness::with_ttl(ttl),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace everything with a fresh server snapshot
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
        self.freshness.mark_fresh();
    }

    /// Append a following page; freshness is unchanged
    pub fn append(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.extend(items);
    }

    /// Apply `f` to every item matching `predicate`, returns how many matched
    pub fn update_where(
        &mut self,
        predicate: impl Fn(&T) -> bool,
        mut f: impl FnMut(&mut T),
    ) -> usize {
        let mut updated = 0;
        for item in self.items.iter_mut().filter(|item| predicate(item)) {
            f(item);
            updated += 1;
        }
        updated
    }

    /// Remove every item matching `predicate`, returns how many were removed
    pub fn remove_where(&mut self, predicate: impl Fn(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.freshness.invalidate();
    }

    pub fn is_fresh(&self) -> bool {
        self.freshness.is_fresh()
    }

    pub fn is_never_updated(&self) -> bool {
        self.freshness.is_never_updated()
    }

    pub fn invalidate(&mut self) {
        self.freshness.invalidate();
    }
}

/// Optional singleton owned by a single repository
#[derive(Debug, Clone)]
pub struct SingleItemCache<T> {
    item: Option<T>,
    freshness: Freshness,
}

impl<T> Default for SingleItemCache<T> {
    fn default() -> Self {
        Self {
            item: None,
            freshness: Freshness::default(),
        }
    }
}

impl<T: Clone> SingleItemCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            item: None,
            freshness: Freshness::with_ttl(ttl),
        }
    }

    pub fn item(&self) -> Option<&T> {
        self.item.as_ref()
    }

    pub fn set(&mut self, item: T) {
        self.item = Some(item);
        self.freshness.mark_fresh();
    }

    /// Put back a persisted item; it does not count as an update
    pub fn restore(&mut self, item: T) {
        self.item = Some(item);
    }

    pub fn clear(&mut self) {
        self.item = None;
        self.freshness.invalidate();
    }

    pub fn is_fresh(&self) -> bool {
        self.freshness.is_fresh()
    }

    pub fn is_never_updated(&self) -> bool {
        self.freshness.is_never_updated()
    }

    pub fn invalidate(&mut self) {
        self.freshness.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cache_is_stale_and_never_updated() {
        let cache: ItemsCache<u32> = ItemsCache::new();
        assert!(!cache.is_fresh());
        assert!(cache.is_never_updated());
    }

    #[test]
    fn test_replace_marks_fresh() {
        let mut cache = ItemsCache::new();
        cache.replace(vec![1, 2]);

        assert!(cache.is_fresh());
        assert!(!cache.is_never_updated());
        assert_eq!(cache.items(), &[1, 2]);

        cache.invalidate();
        assert!(!cache.is_fresh());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_append_keeps_freshness() {
        let mut cache = ItemsCache::new();
        cache.append(vec![1]);
        assert!(!cache.is_fresh());

        cache.replace(vec![1]);
        cache.append(vec![2, 3]);
        assert!(cache.is_fresh());
        assert_eq!(cache.items(), &[1, 2, 3]);
    }

    #[test]
    fn test_ttl_expiry() {
        let mut cache = ItemsCache::with_ttl(Duration::from_millis(0));
        cache.replace(vec![1]);
        assert!(!cache.is_fresh());

        let mut cache = ItemsCache::with_ttl(Duration::from_secs(60));
        cache.replace(vec![1]);
        assert!(cache.is_fresh());
    }

    #[test]
    fn test_update_and_remove_where() {
        let mut cache = ItemsCache::new();
        cache.replace(vec![1, 2, 3, 4]);

        assert_eq!(cache.update_where(|i| i % 2 == 0, |i| *i *= 10), 2);
        assert_eq!(cache.items(), &[1, 20, 3, 40]);

        assert_eq!(cache.remove_where(|i| *i > 10), 2);
        assert_eq!(cache.items(), &[1, 3]);
    }

    #[test]
    fn test_single_item_restore_is_not_an_update() {
        let mut cache = SingleItemCache::new();
        cache.restore("stored");

        assert_eq!(cache.item(), Some(&"stored"));
        assert!(cache.is_never_updated());
        assert!(!cache.is_fresh());

        cache.set("remote");
        assert!(cache.is_fresh());
        assert_eq!(cache.item(), Some(&"remote"));
    }
}
