//! 按功能划分的结果缓存

use std::collections::HashMap;

use crate::config::CacheConfig;
use crate::infrastructure::BoundedCache;
use crate::models::{FeatureId, FeatureResult};

/// 缓存键：功能 + 规范化后的输入
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub feature: FeatureId,
    pub canonical: String,
}

/// 每个功能一个有界缓存，由生成器独占
pub struct FeatureCaches {
    caches: HashMap<FeatureId, BoundedCache<String, FeatureResult>>,
    hits: usize,
    misses: usize,
}

impl FeatureCaches {
    pub fn new(config: &CacheConfig) -> Self {
        let caches = FeatureId::ALL
            .iter()
            .map(|&feature| (feature, BoundedCache::new(config.capacity_for(feature))))
            .collect();
        Self {
            caches,
            hits: 0,
            misses: 0,
        }
    }

    /// 命中时刷新该条目的新近度
    pub fn get(&mut self, key: &Fingerprint) -> Option<FeatureResult> {
        let found = self
            .caches
            .get_mut(&key.feature)
            .and_then(|cache| cache.get(&key.canonical));
        match found {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        found
    }

    pub fn put(&mut self, key: Fingerprint, result: FeatureResult) {
        if let Some(cache) = self.caches.get_mut(&key.feature) {
            cache.put(key.canonical, result);
        }
    }

    pub fn len(&self, feature: FeatureId) -> usize {
        self.caches.get(&feature).map_or(0, BoundedCache::len)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
