use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// 存储错误类型
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Duplicate key: {0}")]
    Duplicate(String),
}

/// 按插入顺序保存实体的内存存储
///
/// id 为主键，另维护一个唯一键二级索引（如用户名/邮箱）。
/// 每个服务在启动时构造自己的实例并注入处理器，测试可以用独立实例。
#[derive(Debug, Clone)]
pub struct MemoryStore<T> {
    inner: Arc<RwLock<StoreInner<T>>>,
}

#[derive(Debug)]
struct StoreInner<T> {
    // 插入顺序，列表响应按这个顺序返回
    order: Vec<String>,
    items: HashMap<String, T>,
    unique_keys: HashSet<String>,
}

impl<T: Clone> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                order: Vec::new(),
                items: HashMap::new(),
                unique_keys: HashSet::new(),
            })),
        }
    }

    /// 按插入顺序返回全部实体
    pub fn list(&self) -> Vec<T> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .order
            .iter()
            .filter_map(|id| inner.items.get(id).cloned())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<T> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.items.get(id).cloned()
    }

    /// 检查唯一键是否已被占用
    pub fn exists_by_key(&self, key: &str) -> bool {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.unique_keys.contains(key)
    }

    /// 插入实体，id 或任一唯一键已存在时返回冲突
    pub fn insert(&self, id: &str, item: T, unique_keys: &[String]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");

        if inner.items.contains_key(id) {
            return Err(StoreError::Duplicate(id.to_string()));
        }
        for key in unique_keys {
            if inner.unique_keys.contains(key) {
                return Err(StoreError::Duplicate(key.clone()));
            }
        }

        inner.order.push(id.to_string());
        inner.items.insert(id.to_string(), item);
        for key in unique_keys {
            inner.unique_keys.insert(key.clone());
        }
        Ok(())
    }

    /// 就地修改实体，返回修改后的副本
    pub fn update<F>(&self, id: &str, f: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let item = inner.items.get_mut(id)?;
        f(item);
        Some(item.clone())
    }

    /// 在同一临界区内校验并修改实体
    ///
    /// 校验和写入之间不释放锁，并发调用不会基于同一旧值各自通过
    /// 校验。闭包返回 Err 时必须未做任何改动。
    pub fn try_update<F, E>(&self, id: &str, f: F) -> Option<Result<T, E>>
    where
        F: FnOnce(&mut T) -> Result<(), E>,
    {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let item = inner.items.get_mut(id)?;
        match f(item) {
            Ok(()) => Some(Ok(item.clone())),
            Err(e) => Some(Err(e)),
        }
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
