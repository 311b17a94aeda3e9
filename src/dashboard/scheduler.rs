use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::client::DashboardClient;

/// 固定周期的健康轮询任务
///
/// 只触发健康探测，不碰实体缓存。无退避、无抖动；每轮探测
/// spawn 出去执行，慢探测不会推迟下一个周期，周期之间允许
/// 重叠，同一状态槽位以最后写入为准。
#[derive(Debug)]
pub struct PollScheduler {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl PollScheduler {
    /// 启动轮询，返回可取消的句柄
    pub fn start(client: Arc<DashboardClient>, period: Duration) -> Self {
        let token = CancellationToken::new();
        let tracker = TaskTracker::new();

        let loop_token = token.clone();
        let loop_tracker = tracker.clone();
        tracker.spawn(async move {
            let mut interval = tokio::time::interval(period);
            // interval 的第一跳立即触发，启动路径已经探测过一轮，跳过
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = interval.tick() => {
                        let client = client.clone();
                        loop_tracker.spawn(async move {
                            client.run_probe_cycle().await;
                        });
                    }
                }
            }
            tracing::debug!("Poll scheduler stopped");
        });

        Self { token, tracker }
    }

    /// 停止轮询并等待在途探测结束
    pub async fn shutdown(self) {
        self.token.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
