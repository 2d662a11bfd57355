//! 前端错误类型
//!
//! 守卫失败不会出现在这里：未认证 / 无权限都被解析为重定向（见 `guard`）。

/// 持久化存储错误
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 当前环境没有可用的 LocalStorage（隐私模式、非浏览器环境等）
    #[error("local storage is unavailable")]
    Unavailable,

    #[error("failed to write key `{key}`: {reason}")]
    Write { key: String, reason: String },

    #[error("failed to remove key `{key}`: {reason}")]
    Remove { key: String, reason: String },
}

/// 会话存储错误
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to serialize user profile: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 空凭据无法构成一个已认证会话
    #[error("refusing to store an empty token")]
    EmptyToken,
}

/// HTTP 错误类型
///
/// 非 2xx 响应不属于错误，会原样返回给调用方；只有类型化的便捷接口
/// （如 [`ApiClient::call`](crate::api::ApiClient::call)）才会产生 `Status`。
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// 请求构建失败
    #[error("failed to build request: {0}")]
    RequestBuildFailed(String),

    /// 网络请求失败
    #[error("network error: {0}")]
    NetworkError(String),

    /// 响应解析失败
    #[error("failed to parse response: {0}")]
    ResponseParseFailed(String),

    /// 请求体序列化失败
    #[error("failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 登录接口返回 2xx，但缺少 access_token / role
    #[error("login response is missing credentials: {0}")]
    InvalidLoginResponse(String),

    /// 类型化接口收到非 2xx 响应
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Session(#[from] SessionError),
}
