use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use microdash::config::Config;
use microdash::dashboard::{DashboardClient, PollScheduler, ServiceRegistry};
use microdash::services::{order, product, user};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "config.toml not loaded, falling back to defaults");
            Config::default()
        }
    };

    // 启动三个资源服务
    serve(
        user::router(user::UserState::seeded()),
        config.services.user.bind_addr(),
    )
    .await?;
    serve(
        product::router(product::ProductState::seeded()),
        config.services.product.bind_addr(),
    )
    .await?;
    serve(
        order::router(order::OrderState::new()),
        config.services.order.bind_addr(),
    )
    .await?;

    // 仪表盘加载路径：先探测一轮健康状态，再顺序拉取初始数据
    let registry = ServiceRegistry::from_config(&config.services);
    let client = Arc::new(DashboardClient::new(registry));
    client.run_probe_cycle().await;
    client.load_initial_data().await;

    // 固定周期的健康轮询，独立于用户操作
    let scheduler = PollScheduler::start(client.clone(), config.dashboard.poll_interval());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    scheduler.shutdown().await;
    Ok(())
}

async fn serve(router: axum::Router, addr: String) -> Result<(), Box<dyn Error>> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Service listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "Server error");
        }
    });
    Ok(())
}
