mod common;

use std::sync::Arc;
use std::time::Duration;

use microdash::dashboard::{
    DashboardClient, FetchError, HealthStatus, OrderDraft, OrderItemDraft, PollScheduler,
    RegistrationForm, ResourceKind, ServiceDescriptor, ServiceRegistry, build_option_sets,
};
use microdash::services::{order, product, user};
use serde_json::json;
use tokio::task::JoinHandle;

/// 启动全部三个服务并构造指向它们的注册表
async fn spawn_cluster() -> (ServiceRegistry, [JoinHandle<()>; 3]) {
    let (user_base, user_handle) =
        common::spawn_service(user::router(user::UserState::seeded())).await;
    let (product_base, product_handle) =
        common::spawn_service(product::router(product::ProductState::seeded())).await;
    let (order_base, order_handle) =
        common::spawn_service(order::router(order::OrderState::new())).await;

    let registry = ServiceRegistry::new(vec![
        ServiceDescriptor::new("user", user_base, "/health".to_string()),
        ServiceDescriptor::new("product", product_base, "/health".to_string()),
        // 订单服务的健康检查路径覆盖为 /orders/health
        ServiceDescriptor::new("order", order_base, "/orders/health".to_string()),
    ]);
    (registry, [user_handle, product_handle, order_handle])
}

#[tokio::test]
async fn test_probe_cycle_marks_live_services_healthy() {
    let (registry, _handles) = spawn_cluster().await;
    let client = DashboardClient::new(registry);

    // 探测前所有槽位都是 Unknown
    for name in ["user", "product", "order"] {
        assert_eq!(client.health().status(name), HealthStatus::Unknown);
    }

    client.run_probe_cycle().await;

    for name in ["user", "product", "order"] {
        assert_eq!(client.health().status(name), HealthStatus::Healthy);
    }
}

#[tokio::test]
async fn test_probe_failure_does_not_block_other_services() {
    let (user_base, _user_handle) =
        common::spawn_service(user::router(user::UserState::seeded())).await;
    let (order_base, _order_handle) =
        common::spawn_service(order::router(order::OrderState::new())).await;
    // 商品服务不可达
    let dead_base = common::unreachable_address().await;

    let registry = ServiceRegistry::new(vec![
        ServiceDescriptor::new("user", user_base, "/health".to_string()),
        ServiceDescriptor::new("product", dead_base, "/health".to_string()),
        ServiceDescriptor::new("order", order_base, "/orders/health".to_string()),
    ]);
    let client = DashboardClient::new(registry);

    client.run_probe_cycle().await;

    // 同一轮里其它服务仍然得到正确分类
    assert_eq!(client.health().status("user"), HealthStatus::Healthy);
    assert_eq!(client.health().status("product"), HealthStatus::Unhealthy);
    assert_eq!(client.health().status("order"), HealthStatus::Healthy);
}

#[tokio::test]
async fn test_probe_classifies_wrong_payload_as_unhealthy() {
    let (user_base, _handle) =
        common::spawn_service(user::router(user::UserState::seeded())).await;

    // 200 但响应体没有 status == "healthy"
    let wrong_body = ServiceRegistry::new(vec![ServiceDescriptor::new(
        "user",
        user_base.clone(),
        "/users".to_string(),
    )]);
    let client = DashboardClient::new(wrong_body);
    client.run_probe_cycle().await;
    assert_eq!(client.health().status("user"), HealthStatus::Unhealthy);

    // 非 2xx
    let not_found = ServiceRegistry::new(vec![ServiceDescriptor::new(
        "user",
        user_base,
        "/no-such-health".to_string(),
    )]);
    let client = DashboardClient::new(not_found);
    client.run_probe_cycle().await;
    assert_eq!(client.health().status("user"), HealthStatus::Unhealthy);
}

#[tokio::test]
async fn test_load_initial_data_populates_caches_and_options() {
    let (registry, _handles) = spawn_cluster().await;
    let client = DashboardClient::new(registry);

    client.load_initial_data().await;

    assert_eq!(client.cache().len(ResourceKind::Users), 2);
    assert_eq!(client.cache().len(ResourceKind::Products), 5);
    assert_eq!(client.cache().len(ResourceKind::Orders), 0);

    let options = client.options().await;
    assert_eq!(options.user_options.len(), 2);
    assert_eq!(options.user_options[0].label, "John Doe (john_doe)");
    assert_eq!(options.product_options.len(), 5);
    assert_eq!(options.product_options[0].label, "Laptop Pro - $1299.99");
}

#[tokio::test]
async fn test_cache_is_replaced_not_merged() {
    let (registry, _handles) = spawn_cluster().await;
    let user_base = registry.get("user").expect("user descriptor").base_address.clone();
    let client = DashboardClient::new(registry);

    let first = client
        .fetch_collection(ResourceKind::Users)
        .await
        .expect("first fetch");
    assert_eq!(first.len(), 2);

    // 绕过客户端直接注册第三个用户
    reqwest::Client::new()
        .post(format!("{user_base}/register"))
        .json(&json!({
            "username": "alice",
            "email": "a@x.com",
            "firstName": "Alice",
            "lastName": "A",
        }))
        .send()
        .await
        .expect("register request");

    let second = client
        .fetch_collection(ResourceKind::Users)
        .await
        .expect("second fetch");

    // 整槽替换：正好 3 条，无重复、无残留
    assert_eq!(second.len(), 3);
    assert_eq!(client.cache().len(ResourceKind::Users), 3);
    let mut ids: Vec<&str> = second.iter().filter_map(|u| u["id"].as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_failed_fetch_leaves_previous_cache_untouched() {
    let (registry, [user_handle, _p, _o]) = spawn_cluster().await;
    let client = DashboardClient::new(registry);

    client.load_initial_data().await;
    assert_eq!(client.cache().len(ResourceKind::Users), 2);
    assert!(client.cache().last_error(ResourceKind::Users).is_none());

    // 停掉用户服务后再拉取
    user_handle.abort();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let result = client.fetch_collection(ResourceKind::Users).await;
    assert!(result.is_err());

    // 旧快照保持原样（陈旧但完整），错误进入侧信道
    assert_eq!(client.cache().len(ResourceKind::Users), 2);
    assert!(client.cache().last_error(ResourceKind::Users).is_some());
}

#[tokio::test]
async fn test_fetch_error_message_comes_from_envelope() {
    let (product_base, _handle) =
        common::spawn_service(product::router(product::ProductState::seeded())).await;

    // "user" 指向商品服务：GET /users 命中信封 404
    let registry = ServiceRegistry::new(vec![ServiceDescriptor::new(
        "user",
        product_base,
        "/health".to_string(),
    )]);
    let client = DashboardClient::new(registry);

    let err = client
        .fetch_collection(ResourceKind::Users)
        .await
        .expect_err("fetch should fail");
    assert!(matches!(err, FetchError::Service(_)));
    assert_eq!(err.to_string(), "Endpoint not found");
    assert_eq!(
        client.cache().last_error(ResourceKind::Users).as_deref(),
        Some("Endpoint not found")
    );
}

#[tokio::test]
async fn test_register_user_workflow_refreshes_cache_and_options() {
    let (registry, _handles) = spawn_cluster().await;
    let client = DashboardClient::new(registry);
    client.load_initial_data().await;

    let created = client
        .register_user(&RegistrationForm {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "A".to_string(),
        })
        .await
        .expect("registration succeeds");
    assert!(created["id"].as_str().is_some_and(|id| !id.is_empty()));

    // 用户缓存和派生选项都已刷新
    assert_eq!(client.cache().len(ResourceKind::Users), 3);
    let options = client.options().await;
    assert_eq!(options.user_options.len(), 3);
    assert!(
        options
            .user_options
            .iter()
            .any(|o| o.label == "Alice A (alice)")
    );
}

#[tokio::test]
async fn test_register_failure_surfaces_message_without_cache_mutation() {
    let (registry, _handles) = spawn_cluster().await;
    let client = DashboardClient::new(registry);
    client.load_initial_data().await;

    // 与种子用户同名
    let err = client
        .register_user(&RegistrationForm {
            username: "john_doe".to_string(),
            email: "other@example.com".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
        })
        .await
        .expect_err("duplicate registration fails");

    assert_eq!(
        err.to_string(),
        "User with this username or email already exists"
    );
    assert_eq!(client.cache().len(ResourceKind::Users), 2);
    assert_eq!(client.options().await.user_options.len(), 2);
}

#[tokio::test]
async fn test_create_order_workflow_refreshes_orders_only() {
    let (registry, _handles) = spawn_cluster().await;
    let client = DashboardClient::new(registry);
    client.load_initial_data().await;

    let created = client
        .create_order(&OrderDraft {
            user_id: "1".to_string(),
            items: vec![OrderItemDraft {
                product_id: "2".to_string(),
                quantity: 2,
            }],
        })
        .await
        .expect("order creation succeeds");
    assert_eq!(created["status"], "CONFIRMED");

    // 只有订单缓存被刷新，用户/商品缓存不动
    assert_eq!(client.cache().len(ResourceKind::Orders), 1);
    assert_eq!(client.cache().len(ResourceKind::Users), 2);
    assert_eq!(client.cache().len(ResourceKind::Products), 5);
}

#[tokio::test]
async fn test_create_order_for_unknown_user_succeeds() {
    let (registry, _handles) = spawn_cluster().await;
    let client = DashboardClient::new(registry);
    client.load_initial_data().await;

    // 订单服务不校验 userId 是否存在于用户缓存
    let created = client
        .create_order(&OrderDraft {
            user_id: "ghost-user".to_string(),
            items: vec![OrderItemDraft {
                product_id: "1".to_string(),
                quantity: 1,
            }],
        })
        .await
        .expect("order creation succeeds without referential integrity");
    assert_eq!(created["userId"], "ghost-user");
    assert_eq!(client.cache().len(ResourceKind::Orders), 1);
}

#[tokio::test]
async fn test_option_sets_are_consistent_with_cache() {
    let (registry, _handles) = spawn_cluster().await;
    let client = DashboardClient::new(registry);
    client.load_initial_data().await;

    let options = build_option_sets(client.cache());

    for (kind, set) in [
        (ResourceKind::Users, &options.user_options),
        (ResourceKind::Products, &options.product_options),
    ] {
        let snapshot = client.cache().snapshot(kind);
        // 选项数与缓存条数一致，且每个 value 都是缓存里的实体 id
        assert_eq!(set.len(), snapshot.len());
        for option in set {
            assert!(
                snapshot
                    .iter()
                    .any(|entity| entity["id"].as_str() == Some(option.value.as_str()))
            );
        }
    }
}

#[tokio::test]
async fn test_poll_scheduler_runs_cycles_and_cancels() {
    let (registry, _handles) = spawn_cluster().await;
    let client = Arc::new(DashboardClient::new(registry));

    let scheduler = PollScheduler::start(client.clone(), Duration::from_millis(50));

    // 等两三个周期
    tokio::time::sleep(Duration::from_millis(180)).await;
    for name in ["user", "product", "order"] {
        assert_eq!(client.health().status(name), HealthStatus::Healthy);
    }

    // 取消后等待在途探测收尾
    scheduler.shutdown().await;
}
