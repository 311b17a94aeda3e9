use crate::config::ServicesConfig;

/// 服务描述符：逻辑名 -> 基础地址 + 健康检查路径
///
/// 进程启动时从静态配置创建，之后不再变更。
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub name: String,
    pub base_address: String,
    pub health_path: String,
}

impl ServiceDescriptor {
    pub fn new(name: &str, base_address: String, health_path: String) -> Self {
        Self {
            name: name.to_string(),
            base_address,
            health_path,
        }
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_address, self.health_path)
    }
}

/// 静态服务注册表，无发现、无重试
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: Vec<ServiceDescriptor>,
}

impl ServiceRegistry {
    pub fn new(services: Vec<ServiceDescriptor>) -> Self {
        Self { services }
    }

    pub fn from_config(config: &ServicesConfig) -> Self {
        Self::new(vec![
            ServiceDescriptor::new(
                "user",
                config.user.base_url(),
                config.user.health_path.clone(),
            ),
            ServiceDescriptor::new(
                "product",
                config.product.base_url(),
                config.product.health_path.clone(),
            ),
            ServiceDescriptor::new(
                "order",
                config.order.base_url(),
                config.order.health_path.clone(),
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter()
    }
}
