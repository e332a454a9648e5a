//! 固定容量的 LRU 缓存
//!
//! 读和写都会刷新最近使用时间；容量满且插入新 key 时，淘汰最久未使用的条目。

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// LRU 缓存
///
/// 由编排层独占持有，不做内部加锁。
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    entries: HashMap<K, (V, u64)>,
    /// 使用序号 -> key，序号越小越久未使用
    recency: BTreeMap<u64, K>,
    tick: u64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// 创建缓存，容量至少为 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            recency: BTreeMap::new(),
            tick: 0,
        }
    }

    /// 读取并刷新；不存在时无副作用
    pub fn get(&mut self, key: &K) -> Option<V> {
        let next = self.next_tick();
        let (value, used_at) = self.entries.get_mut(key)?;
        self.recency.remove(used_at);
        *used_at = next;
        self.recency.insert(next, key.clone());
        Some(value.clone())
    }

    /// 写入；已存在时替换并刷新，容量满时先淘汰最久未使用的条目
    pub fn put(&mut self, key: K, value: V) {
        let next = self.next_tick();
        if let Some((old_value, used_at)) = self.entries.get_mut(&key) {
            *old_value = value;
            self.recency.remove(used_at);
            *used_at = next;
            self.recency.insert(next, key);
            return;
        }

        if self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        self.recency.insert(next, key.clone());
        self.entries.insert(key, (value, next));
    }

    /// 是否包含 key（不刷新）
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 从最久未使用到最近使用的 key 列表
    pub fn keys_lru_order(&self) -> Vec<K> {
        self.recency.values().cloned().collect()
    }

    fn evict_lru(&mut self) {
        if let Some((_, key)) = self.recency.pop_first() {
            self.entries.remove(&key);
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_evicts_exactly_the_lru_key() {
        for capacity in 1..=8 {
            let mut cache = BoundedCache::new(capacity);
            for i in 0..=capacity {
                cache.put(i, i * 10);
            }
            assert_eq!(cache.len(), capacity);
            assert!(!cache.contains(&0), "容量 {} 时应淘汰 key 0", capacity);
            for i in 1..=capacity {
                assert!(cache.contains(&i));
            }
        }
    }

    #[test]
    fn test_get_refreshes_recency() {
        let capacity = 4;
        let mut cache = BoundedCache::new(capacity);
        for i in 0..capacity {
            cache.put(i, i);
        }
        assert_eq!(cache.get(&0), Some(0));

        // 再插入 capacity - 1 个新 key，0 是最近访问过的，不会被淘汰
        for i in 100..100 + capacity - 1 {
            cache.put(i, i);
        }
        assert!(cache.contains(&0));
        assert_eq!(cache.len(), capacity);

        // 第 capacity 个新 key 才会淘汰它
        cache.put(999, 999);
        assert!(!cache.contains(&0));
    }

    #[test]
    fn test_put_existing_replaces_and_refreshes() {
        let mut cache = BoundedCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 10);
        cache.put("c", 3);

        assert_eq!(cache.get(&"a"), Some(10));
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"c"), Some(3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_miss_has_no_side_effect() {
        let mut cache = BoundedCache::new(2);
        cache.put(1, "one");
        cache.put(2, "two");
        assert_eq!(cache.get(&3), None);
        assert_eq!(cache.keys_lru_order(), vec![1, 2]);

        cache.get(&1);
        assert_eq!(cache.keys_lru_order(), vec![2, 1]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut cache = BoundedCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put("x", 1);
        cache.put("y", 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"y"), Some(2));
    }
}
