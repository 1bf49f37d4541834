//! 内存存储
//!
//! 使用 DashMap 实现的并发内存存储，单条记录的读改写在分片锁内完成。

use dashmap::DashMap;
use std::sync::Arc;

/// 通用内存存储
#[derive(Debug)]
pub struct MemoryStore<T> {
    data: Arc<DashMap<String, T>>,
}

impl<T: Clone> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
        }
    }

    /// 插入或覆盖
    pub fn insert(&self, id: &str, value: T) {
        self.data.insert(id.to_string(), value);
    }

    /// 返回数据的克隆，不持有锁
    pub fn get(&self, id: &str) -> Option<T> {
        self.data.get(id).map(|v| v.clone())
    }

    /// 原地修改单条记录，记录不存在时返回 `None`
    pub fn update<R, F>(&self, id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.data.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    /// 仅在 key 不存在时插入，返回最终保存的值
    pub fn get_or_insert_with<F>(&self, id: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.data.entry(id.to_string()).or_insert_with(f).clone()
    }

    /// 按条件筛选数据
    pub fn list_by<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.data
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }
}

impl<T: Clone> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}
