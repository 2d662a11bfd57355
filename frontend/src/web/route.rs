//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由及其访问要求。

use std::fmt::Display;
use vpark_shared::Role;

/// 路由的访问要求（配置期确定，不可变）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRequirement {
    pub requires_auth: bool,
    /// `None` 表示任意已认证角色均可
    pub required_role: Option<Role>,
}

impl AccessRequirement {
    pub const PUBLIC: Self = Self {
        requires_auth: false,
        required_role: None,
    };

    pub const fn role(role: Role) -> Self {
        Self {
            requires_auth: true,
            required_role: Some(role),
        }
    }
}

/// 应用路由枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppRoute {
    #[default]
    Home,
    Login,
    Register,
    /// 管理员面板
    AdminDashboard,
    /// 普通用户面板
    UserDashboard,
    Profile,
    RecentHistory,
    /// 页面未找到（兜底路由，无访问要求）
    NotFound,
}

/// 路由表条目
#[derive(Debug, Clone, Copy)]
pub struct RouteEntry {
    pub path: &'static str,
    pub route: AppRoute,
    pub access: AccessRequirement,
}

/// 有序路由表，先匹配先得；未命中的路径落到 [`AppRoute::NotFound`]
pub const ROUTE_TABLE: &[RouteEntry] = &[
    RouteEntry {
        path: "/",
        route: AppRoute::Home,
        access: AccessRequirement::PUBLIC,
    },
    RouteEntry {
        path: "/login",
        route: AppRoute::Login,
        access: AccessRequirement::PUBLIC,
    },
    RouteEntry {
        path: "/register",
        route: AppRoute::Register,
        access: AccessRequirement::PUBLIC,
    },
    RouteEntry {
        path: "/admin",
        route: AppRoute::AdminDashboard,
        access: AccessRequirement::role(Role::Admin),
    },
    RouteEntry {
        path: "/dashboard",
        route: AppRoute::UserDashboard,
        access: AccessRequirement::role(Role::User),
    },
    RouteEntry {
        path: "/profile",
        route: AppRoute::Profile,
        access: AccessRequirement::role(Role::User),
    },
    RouteEntry {
        path: "/recent-history",
        route: AppRoute::RecentHistory,
        access: AccessRequirement::role(Role::User),
    },
];

/// 去掉 query / fragment 和末尾的 `/`
pub fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举
    pub fn from_path(path: &str) -> Self {
        let path = normalize_path(path);
        ROUTE_TABLE
            .iter()
            .find(|entry| entry.path == path)
            .map(|entry| entry.route)
            .unwrap_or(Self::NotFound)
    }

    fn entry(&self) -> Option<&'static RouteEntry> {
        ROUTE_TABLE.iter().find(|entry| entry.route == *self)
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> &'static str {
        self.entry().map(|entry| entry.path).unwrap_or("/404")
    }

    /// **核心守卫输入：该路由的访问要求**
    pub fn access(&self) -> AccessRequirement {
        self.entry()
            .map(|entry| entry.access)
            .unwrap_or(AccessRequirement::PUBLIC)
    }

    /// 认证失败时的重定向目标
    pub fn login() -> Self {
        Self::Login
    }

    /// 角色的默认首页：管理员去管理面板，其余角色去用户面板
    pub fn role_home(role: Option<Role>) -> Self {
        match role {
            Some(Role::Admin) => Self::AdminDashboard,
            _ => Self::UserDashboard,
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}
