//! 停车管理应用的离线缓存 Service Worker
//!
//! - `lifecycle`: 生命周期状态机（纯逻辑）
//! - `manager`: 执行状态机产生的副作用，拦截请求
//! - `backend`: 缓存存储与网络的抽象
//! - `web`: 浏览器绑定（仅 wasm32）

pub mod backend;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod manager;

#[cfg(target_arch = "wasm32")]
mod web;

pub use config::CacheConfig;
pub use error::CacheError;
pub use lifecycle::{Effect, LifecycleEvent, Transition, WorkerState};
pub use manager::CacheManager;
