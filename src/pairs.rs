//! Incremental key/record pair building for bulk calls.

/// Capacity allocated when a pair list is first written to.
pub const DEFAULT_CAPACITY: usize = 5;

/// Allocate empty key and value vectors with room for `size` pairs.
pub fn new_pairs<K, V>(size: usize) -> (Vec<K>, Vec<V>) {
    (Vec::with_capacity(size), Vec::with_capacity(size))
}

/// Append a pair, creating either vector with the default capacity if absent.
pub fn add<K, V>(
    keys: Option<Vec<K>>,
    values: Option<Vec<V>>,
    key: K,
    value: V,
) -> (Vec<K>, Vec<V>) {
    let mut keys = keys.unwrap_or_else(|| Vec::with_capacity(DEFAULT_CAPACITY));
    let mut values = values.unwrap_or_else(|| Vec::with_capacity(DEFAULT_CAPACITY));
    keys.push(key);
    values.push(value);
    (keys, values)
}

/// Parallel key and value vectors kept in insertion order.
///
/// Nothing is allocated until the first push. Duplicate keys are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairs<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
}

impl<K, V> Default for Pairs<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Pairs<K, V> {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with_capacity(size: usize) -> Self {
        let (keys, values) = new_pairs(size);
        Self { keys, values }
    }

    pub fn push(&mut self, key: K, value: V) {
        if self.keys.capacity() == 0 {
            self.keys.reserve_exact(DEFAULT_CAPACITY);
        }
        if self.values.capacity() == 0 {
            self.values.reserve_exact(DEFAULT_CAPACITY);
        }
        self.keys.push(key);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn keys_mut(&mut self) -> &mut [K] {
        &mut self.keys
    }

    pub fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    /// Borrow the keys mutably and the values shared at the same time.
    pub fn split_mut(&mut self) -> (&mut [K], &[V]) {
        (&mut self.keys, &self.values)
    }

    pub fn into_parts(self) -> (Vec<K>, Vec<V>) {
        (self.keys, self.values)
    }
}

impl<K, V> FromIterator<(K, V)> for Pairs<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut pairs = Pairs::new();
        pairs.extend(iter);
        pairs
    }
}

impl<K, V> Extend<(K, V)> for Pairs<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.push(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_allocates_default_capacity() {
        let (keys, values) = add::<u32, &str>(None, None, 1, "a");
        assert_eq!(keys, vec![1]);
        assert_eq!(values, vec!["a"]);
        assert!(keys.capacity() >= DEFAULT_CAPACITY);
        assert!(values.capacity() >= DEFAULT_CAPACITY);
    }

    #[test]
    fn test_add_appends_to_existing() {
        let (keys, values) = add(None, None, 1, "a");
        let (keys, values) = add(Some(keys), Some(values), 2, "b");
        let (keys, values) = add(Some(keys), Some(values), 1, "c");
        assert_eq!(keys, vec![1, 2, 1]);
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_new_pairs_capacity() {
        let (keys, values): (Vec<u8>, Vec<u8>) = new_pairs(32);
        assert!(keys.is_empty() && values.is_empty());
        assert!(keys.capacity() >= 32);
    }

    #[test]
    fn test_pairs_lazy_allocation() {
        let mut pairs: Pairs<String, u32> = Pairs::new();
        assert_eq!(pairs.keys.capacity(), 0);
        pairs.push("k".to_string(), 7);
        assert!(pairs.keys.capacity() >= DEFAULT_CAPACITY);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_pairs_keep_order_and_duplicates() {
        let pairs: Pairs<&str, i32> = vec![("b", 1), ("a", 2), ("b", 3)].into_iter().collect();
        assert_eq!(pairs.keys(), &["b", "a", "b"]);
        assert_eq!(pairs.values(), &[1, 2, 3]);
        let (keys, values) = pairs.into_parts();
        assert_eq!(keys.len(), values.len());
    }
}
