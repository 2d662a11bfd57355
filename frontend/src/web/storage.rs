//! LocalStorage 封装模块
//!
//! `KeyValueStore` 是会话的持久化边界。浏览器中由 `window.localStorage`
//! 实现；测试中由内存实现替代。存储访问是同步的，因此路由守卫永远不会在
//! 读到一半的会话上做决策。

use crate::error::StorageError;

/// 字符串键值存储
pub trait KeyValueStore {
    /// 获取存储的字符串值，不存在或读取失败时返回 `None`
    fn get(&self, key: &str) -> Option<String>;

    /// 设置存储值
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// 删除键值对；键不存在时同样返回 `Ok`
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// 本地存储操作封装
///
/// 无状态的句柄：所有副本都指向同一个 `window.localStorage`。
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    /// 获取 LocalStorage 实例
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(StorageError::Unavailable)
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().ok()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Remove {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }
}

// =========================================================
// 测试环境实现 (MemoryStore)
// =========================================================

#[cfg(test)]
pub use memory::MemoryStore;
