//! 会话存储
//!
//! 唯一持有认证身份（token / role / profile）的地方。状态本身就是持久化存储，
//! 所有 `SessionStore` 副本读写的是同一份数据，因此 `login` 返回后任何组件
//! 读到的都是新会话。

use crate::error::SessionError;
use crate::web::KeyValueStore;
use tracing::{info, warn};
use vpark_shared::{
    Role, SESSION_STORAGE_KEYS, STORAGE_KEY_ROLE, STORAGE_KEY_TOKEN, STORAGE_KEY_USER_DATA,
    UserProfile,
};

/// 当前标签页的认证身份
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub profile: Option<UserProfile>,
}

/// 会话存储服务
///
/// 只做本地状态与持久化，不发起任何网络请求。
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStore<S> {
    storage: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// 写入新会话
    ///
    /// 任何一次写入失败都会撤销已写入的键，不会留下半个会话。
    /// 未提供 profile 时会清除上一个会话遗留的 `userData`。
    pub fn login(
        &self,
        token: &str,
        role: Role,
        profile: Option<&UserProfile>,
    ) -> Result<(), SessionError> {
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        let profile_json = profile.map(serde_json::to_string).transpose()?;

        let mut written: Vec<&str> = Vec::with_capacity(SESSION_STORAGE_KEYS.len());
        let result = self
            .write(STORAGE_KEY_TOKEN, token, &mut written)
            .and_then(|_| self.write(STORAGE_KEY_ROLE, role.as_str(), &mut written))
            .and_then(|_| match &profile_json {
                Some(json) => self.write(STORAGE_KEY_USER_DATA, json, &mut written),
                None => self.storage.remove(STORAGE_KEY_USER_DATA),
            });

        if let Err(err) = result {
            warn!(error = %err, "session write failed, rolling back");
            for key in written {
                if let Err(rollback_err) = self.storage.remove(key) {
                    warn!(key, error = %rollback_err, "rollback failed, session key left behind");
                }
            }
            return Err(err.into());
        }

        info!(%role, "session established");
        Ok(())
    }

    fn write<'k>(
        &self,
        key: &'k str,
        value: &str,
        written: &mut Vec<&'k str>,
    ) -> Result<(), crate::error::StorageError> {
        self.storage.set(key, value)?;
        written.push(key);
        Ok(())
    }

    /// 清除会话（幂等）
    ///
    /// 每个键都会尝试删除；返回遇到的第一个错误。
    pub fn logout(&self) -> Result<(), SessionError> {
        let mut first_err = None;
        for key in SESSION_STORAGE_KEYS {
            if let Err(err) = self.storage.remove(key) {
                warn!(key, error = %err, "failed to clear session key");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err.into()),
            None => {
                info!("session cleared");
                Ok(())
            }
        }
    }

    /// 当前凭据（空字符串视为不存在）
    pub fn token(&self) -> Option<String> {
        self.storage
            .get(STORAGE_KEY_TOKEN)
            .filter(|token| !token.is_empty())
    }

    /// 当前角色；未认证时为 `None`
    pub fn role(&self) -> Option<Role> {
        self.token()?;
        self.stored_role()
    }

    fn stored_role(&self) -> Option<Role> {
        let raw = self.storage.get(STORAGE_KEY_ROLE)?;
        match raw.parse() {
            Ok(role) => Some(role),
            Err(err) => {
                warn!(error = %err, "ignoring unrecognised stored role");
                None
            }
        }
    }

    /// token 非空且 role 可识别。
    ///
    /// 比"只看 token 是否非空"更严格：两者总是一起写入，只剩 token
    /// （例如存储被外部改动、或回滚失败）也视为未认证，守卫不会在
    /// `/login` 与角色首页之间来回跳转。
    pub fn is_authenticated(&self) -> bool {
        self.role().is_some()
    }

    /// 已认证用户的资料，解析失败时为 `None`
    pub fn profile(&self) -> Option<UserProfile> {
        self.token()?;
        let raw = self.storage.get(STORAGE_KEY_USER_DATA)?;
        serde_json::from_str(&raw)
            .map_err(|e| warn!(error = %e, "ignoring unreadable stored profile"))
            .ok()
    }

    /// 一次性读取完整会话
    pub fn snapshot(&self) -> Option<Session> {
        let token = self.token()?;
        let role = self.stored_role()?;
        Some(Session {
            token,
            role,
            profile: self.profile(),
        })
    }
}
