use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use super::cache::{EntityCache, ResourceKind};
use super::error::FetchError;
use super::health::HealthMonitor;
use super::options::{self, OptionSets};
use super::registry::ServiceRegistry;

/// 列表和变更接口共用的响应信封
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Value,
    message: Option<String>,
}

/// 服务聚合客户端
///
/// 持有服务注册表、健康状态表、实体缓存和派生选项集。
/// 页面加载和变更成功后的刷新走同一条重建路径，
/// 状态如何（重新）构建只有一个事实来源。
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    registry: ServiceRegistry,
    health: HealthMonitor,
    cache: EntityCache,
    options: Arc<RwLock<OptionSets>>,
}

impl DashboardClient {
    pub fn new(registry: ServiceRegistry) -> Self {
        Self {
            http: reqwest::Client::new(),
            registry,
            health: HealthMonitor::new(),
            cache: EntityCache::new(),
            options: Arc::new(RwLock::new(OptionSets::default())),
        }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// 当前派生选项集的副本
    pub async fn options(&self) -> OptionSets {
        self.options.read().await.clone()
    }

    /// 一轮健康探测：遍历注册表逐个探测
    ///
    /// 单个服务的失败在 probe 内部转换为 Unhealthy，不会阻断其余服务。
    pub async fn run_probe_cycle(&self) {
        tracing::info!("Checking all services health...");
        for descriptor in self.registry.iter() {
            self.health.probe(&self.http, descriptor).await;
        }
    }

    /// 拉取一个资源集合并整槽替换对应缓存
    ///
    /// 成功 = HTTP 2xx 且信封 success == true。失败时缓存保持旧值
    /// （可能陈旧但完整），错误写入侧信道并返回给调用方。
    pub async fn fetch_collection(&self, kind: ResourceKind) -> Result<Vec<Value>, FetchError> {
        tracing::info!(resource = %kind, "Fetching collection...");
        match self.try_fetch(kind).await {
            Ok(entities) => {
                self.cache.replace(kind, entities.clone());
                tracing::info!(resource = %kind, count = entities.len(), "Fetched collection");
                Ok(entities)
            }
            Err(e) => {
                self.cache.record_error(kind, e.to_string());
                tracing::error!(resource = %kind, error = %e, "Error fetching collection");
                Err(e)
            }
        }
    }

    async fn try_fetch(&self, kind: ResourceKind) -> Result<Vec<Value>, FetchError> {
        let descriptor = self
            .registry
            .get(kind.service_name())
            .ok_or_else(|| FetchError::UnknownService(kind.service_name().to_string()))?;

        let url = format!("{}{}", descriptor.base_address, kind.list_path());
        let response = self.http.get(&url).send().await?;
        let http_ok = response.status().is_success();
        let envelope: Envelope = response.json().await?;

        if !(http_ok && envelope.success) {
            return Err(FetchError::Service(envelope.message.unwrap_or_else(|| {
                format!("Failed to fetch {kind}")
            })));
        }

        match envelope.data {
            Value::Array(entities) => Ok(entities),
            _ => Err(FetchError::Service(format!("Failed to fetch {kind}"))),
        }
    }

    /// 加载初始数据：依次 users -> products -> orders，最后重建选项集
    ///
    /// 串行是有意的顺序保证：选项集只在全部拉取落地后构建一次，
    /// 不会基于撕裂的中间状态。单个资源失败不中断其余资源。
    pub async fn load_initial_data(&self) {
        for kind in ResourceKind::ALL {
            // 失败已在 fetch_collection 里记录，继续后续资源
            let _ = self.fetch_collection(kind).await;
        }
        self.rebuild_options().await;
    }

    /// 每次缓存变更后整体重建派生选项集
    pub async fn rebuild_options(&self) {
        let rebuilt = options::build_option_sets(&self.cache);
        *self.options.write().await = rebuilt;
    }

    /// 注册用户工作流：提交成功后刷新用户缓存并重建选项集
    ///
    /// 提交失败时向调用方呈现信封消息，不碰任何缓存。创建成功
    /// 之后的刷新失败是独立的拉取错误：缓存相对新实体保持陈旧，
    /// 等下一次成功拉取，不做补偿回滚。
    pub async fn register_user(&self, form: &RegistrationForm) -> Result<Value, FetchError> {
        tracing::info!(username = %form.username, "Registering new user...");
        let created = self.submit("user", "/register", form).await?;
        tracing::info!(username = %form.username, "User registered successfully");

        let _ = self.fetch_collection(ResourceKind::Users).await;
        self.rebuild_options().await;
        Ok(created)
    }

    /// 创建订单工作流：提交成功后只刷新订单缓存
    pub async fn create_order(&self, draft: &OrderDraft) -> Result<Value, FetchError> {
        tracing::info!(user_id = %draft.user_id, "Creating new order...");
        let created = self.submit("order", "/orders", draft).await?;
        tracing::info!("Order created successfully");

        let _ = self.fetch_collection(ResourceKind::Orders).await;
        self.rebuild_options().await;
        Ok(created)
    }

    /// 向指定服务 POST 一个表单并解析信封
    async fn submit<T: Serialize>(
        &self,
        service_name: &str,
        path: &str,
        body: &T,
    ) -> Result<Value, FetchError> {
        let descriptor = self
            .registry
            .get(service_name)
            .ok_or_else(|| FetchError::UnknownService(service_name.to_string()))?;

        let url = format!("{}{}", descriptor.base_address, path);
        let response = self.http.post(&url).json(body).send().await?;
        let http_ok = response.status().is_success();
        let envelope: Envelope = response.json().await?;

        if !(http_ok && envelope.success) {
            return Err(FetchError::Service(envelope.message.unwrap_or_else(|| {
                format!("Request to {service_name} service failed")
            })));
        }

        Ok(envelope.data)
    }
}

/// 用户注册表单
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// 订单草稿
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub user_id: String,
    pub items: Vec<OrderItemDraft>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDraft {
    pub product_id: String,
    pub quantity: u32,
}
