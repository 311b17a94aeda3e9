use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// 三个资源服务的监听地址配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub user: ServiceEndpoint,
    pub product: ServiceEndpoint,
    pub order: ServiceEndpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
    /// 健康检查路径（订单服务使用 /orders/health 覆盖默认值）
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// 健康轮询周期（秒）
    pub poll_interval_secs: u64,
}

fn default_health_path() -> String {
    "/health".to_string()
}

impl ServiceEndpoint {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            user: ServiceEndpoint {
                host: "127.0.0.1".to_string(),
                port: 3001,
                health_path: default_health_path(),
            },
            product: ServiceEndpoint {
                host: "127.0.0.1".to_string(),
                port: 3002,
                health_path: default_health_path(),
            },
            order: ServiceEndpoint {
                host: "127.0.0.1".to_string(),
                port: 3003,
                health_path: "/orders/health".to_string(),
            },
        }
    }
}

impl DashboardConfig {
    /// 获取轮询周期时长
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_str = fs::read_to_string("config.toml")?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }
}
