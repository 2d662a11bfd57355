//! 导航守卫
//!
//! 每次路由切换前同步求值一次，结果只有三种：放行、去登录页、去角色首页。
//! 认证与角色是两道独立的关卡，先查认证。守卫只读会话，从不修改。

use crate::session::SessionStore;
use crate::web::KeyValueStore;
use crate::web::route::{AccessRequirement, AppRoute};
use tracing::{debug, info};
use vpark_shared::Role;

/// 守卫决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// 未认证访问受保护路由
    RedirectToLogin,
    /// 已认证但角色不符，去往该角色的默认首页
    RedirectToRoleHome(AppRoute),
}

impl GuardDecision {
    /// 纯决策函数
    ///
    /// `role` 为 `None` 表示未认证。
    pub fn decide(access: AccessRequirement, role: Option<Role>) -> Self {
        if !access.requires_auth {
            return Self::Allow;
        }
        let Some(role) = role else {
            return Self::RedirectToLogin;
        };
        match access.required_role {
            Some(required) if required != role => {
                Self::RedirectToRoleHome(AppRoute::role_home(Some(role)))
            }
            _ => Self::Allow,
        }
    }

    /// 最终应当渲染的路由
    pub fn destination(&self, requested: AppRoute) -> AppRoute {
        match self {
            Self::Allow => requested,
            Self::RedirectToLogin => AppRoute::login(),
            Self::RedirectToRoleHome(home) => *home,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// 绑定到会话存储的导航守卫
#[derive(Debug, Clone, Copy)]
pub struct RouteGuard<S> {
    session: SessionStore<S>,
}

impl<S: KeyValueStore> RouteGuard<S> {
    pub fn new(session: SessionStore<S>) -> Self {
        Self { session }
    }

    /// 对一次导航求值
    pub fn evaluate(&self, target: AppRoute) -> GuardDecision {
        let access = target.access();
        // 公开路由不需要读会话
        let role = if access.requires_auth {
            self.session.role()
        } else {
            None
        };

        let decision = GuardDecision::decide(access, role);
        match decision {
            GuardDecision::Allow => debug!(route = %target, "navigation allowed"),
            GuardDecision::RedirectToLogin => {
                info!(route = %target, "access denied, redirecting to login")
            }
            GuardDecision::RedirectToRoleHome(home) => {
                info!(route = %target, home = %home, "role mismatch, redirecting to role home")
            }
        }
        decision
    }
}
