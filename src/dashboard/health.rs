use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;

use super::registry::ServiceDescriptor;

/// 服务健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Unknown,
    Checking,
    Healthy,
    Unhealthy,
}

#[derive(Debug, Deserialize)]
struct HealthEnvelope {
    #[serde(default)]
    status: String,
}

/// 健康状态表：每个已注册服务一个槽位
///
/// 只由探测流程写入；周期可能重叠，同一槽位以最后写入为准。
#[derive(Debug, Clone, Default)]
pub struct HealthMonitor {
    statuses: Arc<DashMap<String, HealthStatus>>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, service_name: &str) -> HealthStatus {
        self.statuses
            .get(service_name)
            .map(|entry| *entry.value())
            .unwrap_or(HealthStatus::Unknown)
    }

    pub fn set_status(&self, service_name: &str, status: HealthStatus) {
        self.statuses.insert(service_name.to_string(), status);
    }

    /// 探测单个服务并写回分类结果
    ///
    /// 2xx 且响应体 status == "healthy" 才算 Healthy，其余情况
    /// （非 2xx、网络失败、JSON 解析失败、状态字段不对）一律归为
    /// Unhealthy。失败在本轮内不重试、不向外传播，等下一个轮询周期。
    pub async fn probe(
        &self,
        http: &reqwest::Client,
        descriptor: &ServiceDescriptor,
    ) -> HealthStatus {
        // 先置为 Checking，给状态徽章即时反馈
        self.set_status(&descriptor.name, HealthStatus::Checking);

        let status = match Self::fetch_health(http, &descriptor.health_url()).await {
            Ok(true) => {
                tracing::info!(service_name = %descriptor.name, "Service is healthy");
                HealthStatus::Healthy
            }
            Ok(false) => {
                tracing::error!(service_name = %descriptor.name, "Service is unhealthy");
                HealthStatus::Unhealthy
            }
            Err(e) => {
                tracing::error!(service_name = %descriptor.name, error = %e, "Service is unhealthy");
                HealthStatus::Unhealthy
            }
        };

        self.set_status(&descriptor.name, status);
        status
    }

    async fn fetch_health(http: &reqwest::Client, url: &str) -> Result<bool, reqwest::Error> {
        let response = http.get(url).send().await?;
        let http_ok = response.status().is_success();
        let body: HealthEnvelope = response.json().await?;
        Ok(http_ok && body.status == "healthy")
    }
}
