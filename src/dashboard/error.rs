/// 聚合客户端错误类型
///
/// 非成功信封和网络失败都收敛到这里，向上只作为日志和错误负载
/// 呈现，绝不抛出到发起它的工作流之外。
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// 网络失败或响应体不是合法 JSON
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// 信封报告的业务失败，消息来自服务端 message 字段或通用描述
    #[error("{0}")]
    Service(String),
    #[error("Unknown service: {0}")]
    UnknownService(String),
}
