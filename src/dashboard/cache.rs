use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

/// 资源类型，缓存槽位按它寻址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Users,
    Products,
    Orders,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Users,
        ResourceKind::Products,
        ResourceKind::Orders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Users => "users",
            ResourceKind::Products => "products",
            ResourceKind::Orders => "orders",
        }
    }

    /// 该资源归属的服务逻辑名
    pub fn service_name(&self) -> &'static str {
        match self {
            ResourceKind::Users => "user",
            ResourceKind::Products => "product",
            ResourceKind::Orders => "order",
        }
    }

    /// 列表接口路径
    pub fn list_path(&self) -> &'static str {
        match self {
            ResourceKind::Users => "/users",
            ResourceKind::Products => "/products",
            ResourceKind::Orders => "/orders",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 各资源类型的本地快照缓存
///
/// 实体按服务端返回顺序整槽保存，字段不透明（只依赖 id）。
/// 成功拉取整槽替换，失败不动旧值，只记录 last-error 侧信道，
/// 永远不做部分合并。
#[derive(Debug, Clone, Default)]
pub struct EntityCache {
    slots: Arc<DashMap<ResourceKind, Vec<Value>>>,
    last_errors: Arc<DashMap<ResourceKind, String>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 整槽替换，并清掉该槽位的历史错误
    pub fn replace(&self, kind: ResourceKind, entities: Vec<Value>) {
        self.slots.insert(kind, entities);
        self.last_errors.remove(&kind);
    }

    /// 当前快照的副本，从未成功拉取过则为空
    pub fn snapshot(&self, kind: ResourceKind) -> Vec<Value> {
        self.slots
            .get(&kind)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn len(&self, kind: ResourceKind) -> usize {
        self.slots
            .get(&kind)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    pub fn record_error(&self, kind: ResourceKind, message: String) {
        self.last_errors.insert(kind, message);
    }

    /// 最近一次失败拉取的错误消息（成功后清除）
    pub fn last_error(&self, kind: ResourceKind) -> Option<String> {
        self.last_errors.get(&kind).map(|entry| entry.value().clone())
    }
}
