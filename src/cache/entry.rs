//! Cache Entry Module
//!
//! Defines the value containers held by both caches and the size capability
//! the byte-budgeted cache relies on.

use std::time::Duration;

use tokio::time::Instant;

/// Stand-in lifetime for TTLs too large to add to an `Instant` (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

// == Byte Size ==
/// Reports how many bytes a value occupies for budget accounting.
pub trait ByteSize {
    fn byte_len(&self) -> usize;
}

impl ByteSize for String {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteSize for &'static str {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteSize for Vec<u8> {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl ByteSize for Box<[u8]> {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl<T: ByteSize + ?Sized> ByteSize for std::sync::Arc<T> {
    fn byte_len(&self) -> usize {
        (**self).byte_len()
    }
}

// == Empty Value ==
/// A payload-free value that declares its own size.
///
/// Useful to reserve room for a key (or a known amount of memory held
/// elsewhere) without storing anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyValue(pub usize);

impl EmptyValue {
    /// A value occupying no bytes beyond its key.
    pub const ZERO: EmptyValue = EmptyValue(0);
}

impl ByteSize for EmptyValue {
    fn byte_len(&self) -> usize {
        self.0
    }
}

// == LRU Entry ==
/// A value resident in the LRU cache. The key lives in the recency map.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    pub value: V,
    /// Refreshed on every hit and overwrite
    pub last_access: Instant,
}

impl<V: ByteSize> Entry<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            last_access: Instant::now(),
        }
    }

    /// Bytes charged against the budget: key length plus value length.
    pub fn size(&self, key: &str) -> u64 {
        (key.len() + self.value.byte_len()) as u64
    }

    /// True when the entry has not been touched for longer than `max_idle`.
    pub fn is_stale(&self, now: Instant, max_idle: Duration) -> bool {
        now.saturating_duration_since(self.last_access) > max_idle
    }
}

// == TTL Item ==
/// A value held by a TTL shard together with its expiration instant.
#[derive(Debug, Clone)]
pub struct Item<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> Item<V> {
    /// Creates an item expiring `ttl` from now. A zero TTL is already expired.
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = if ttl.is_zero() {
            now.checked_sub(Duration::from_nanos(1)).unwrap_or(now)
        } else {
            // A TTL past the clock's range never expires in practice
            now.checked_add(ttl)
                .or_else(|| now.checked_add(FAR_FUTURE))
                .unwrap_or(now)
        };
        Self { value, expires_at }
    }

    /// An item is expired once `now` has moved past its expiration instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_size_counts_key_and_value() {
        let entry = Entry::new("value".to_string());
        assert_eq!(entry.size("key"), 8);
    }

    #[test]
    fn test_zero_size_value_still_charges_key() {
        let entry = Entry::new(EmptyValue::ZERO);
        assert_eq!(entry.size("abcd"), 4);
    }

    #[test]
    fn test_byte_len_impls() {
        assert_eq!(vec![1u8, 2, 3].byte_len(), 3);
        assert_eq!("hello".byte_len(), 5);
        assert_eq!(std::sync::Arc::new("xy".to_string()).byte_len(), 2);
        assert_eq!(vec![0u8; 4].into_boxed_slice().byte_len(), 4);
        assert_eq!(EmptyValue(7).byte_len(), 7);
    }

    #[test]
    fn test_entry_staleness_boundary() {
        let entry = Entry::new(EmptyValue::ZERO);
        let minute = Duration::from_secs(60);

        assert!(!entry.is_stale(entry.last_access + minute, minute));
        assert!(entry.is_stale(entry.last_access + minute + Duration::from_millis(1), minute));
    }

    #[test]
    fn test_item_expiration_boundary() {
        let item = Item::new("v", Duration::from_secs(10));

        // Expired strictly after the expiration instant
        assert!(!item.is_expired_at(item.expires_at));
        assert!(item.is_expired_at(item.expires_at + Duration::from_nanos(1)));
        assert!(!item.is_expired());
    }

    #[test]
    fn test_item_ttl_remaining() {
        let item = Item::new(1, Duration::from_secs(10));
        let remaining = item.ttl_remaining();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let item = Item::new("forever", Duration::MAX);
        assert!(!item.is_expired());
        assert!(item.ttl_remaining() >= FAR_FUTURE - Duration::from_secs(1));
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let item = Item::new("v", Duration::ZERO);
        assert!(item.is_expired());
        assert_eq!(item.ttl_remaining(), Duration::ZERO);
    }
}
