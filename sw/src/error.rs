use crate::lifecycle::{LifecycleEvent, WorkerState};

/// 缓存代理错误
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// 网络请求失败（未拿到响应）
    #[error("fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    /// 缓存存储读写失败
    #[error("cache storage error: {0}")]
    Storage(String),

    /// 清单中某个资源无法获取，整个安装失败
    #[error("install of `{generation}` failed on {url}: {reason}")]
    InstallFailed {
        generation: String,
        url: String,
        reason: String,
    },

    /// 当前状态不接受该事件
    #[error("event {event:?} is not valid in state {state:?}")]
    InvalidTransition {
        state: WorkerState,
        event: LifecycleEvent,
    },
}
