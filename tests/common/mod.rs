use axum::Router;
use hyper::Request;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::{JoinHandle, JoinSet};
use tower::ServiceExt;

/// 在随机端口上启动一个服务路由，返回基础地址和服务任务句柄
///
/// 连接任务挂在服务任务内部的 JoinSet 上，abort 句柄时
/// 已建立的 keep-alive 连接会一并关闭，而不只是停止 accept。
pub async fn spawn_service(router: Router) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        let mut connections = JoinSet::new();
        loop {
            let (stream, _) = listener.accept().await.expect("accept");
            let router = router.clone();
            connections.spawn(async move {
                let service =
                    service_fn(move |req: Request<Incoming>| router.clone().oneshot(req));
                let _ = hyper::server::conn::http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });
    (format!("http://{addr}"), handle)
}

/// 分配一个当前没有任何服务监听的地址，用于模拟不可达服务
#[allow(dead_code)]
pub async fn unreachable_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
