//! 停车管理应用的浏览器端
//!
//! 会话是唯一的认证事实来源，其余部分都从它读取：
//! - `session`: token / role / profile 的持久化
//! - `api`: 自动附带凭据的 HTTP 客户端
//! - `guard` + `web::route`: 路由表与访问控制
//! - `web::router`: History API 上的客户端路由
//! - `auth`: 把会话映射成 Leptos 信号

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod session;
mod components {
    pub mod login;
    pub mod shell;
}

use crate::auth::AuthContext;
use crate::components::login::LoginPage;
use crate::components::shell::Page;
use crate::config::ApiConfig;

use leptos::prelude::*;

// 浏览器 API 的实现集中在 web 下，其余模块通过 trait 使用
pub mod web {
    mod http;
    pub mod route;
    pub mod router;
    mod storage;

    pub use http::{FetchTransport, HeaderList, HttpRequest, HttpResponse, HttpTransport};
    pub use storage::{KeyValueStore, LocalStorage};

    #[cfg(test)]
    pub use http::MockTransport;
    #[cfg(test)]
    pub use storage::MemoryStore;
}

use web::route::AppRoute;
use web::router::{Router, RouterOutlet};

/// 每个路由对应的页面
///
/// 业务页面（车位、预约、统计）只占位，数据由各自页面按需加载。
fn page_for(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Home => view! {
            <Page title="Find a parking spot">
                <p>"Log in to book a spot or manage parking lots."</p>
            </Page>
        }
        .into_any(),
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Register => view! { <Page title="Create an account"><p>"Registration form"</p></Page> }.into_any(),
        AppRoute::AdminDashboard => view! { <Page title="Admin dashboard"><p>"Parking lots and users"</p></Page> }.into_any(),
        AppRoute::UserDashboard => view! { <Page title="Dashboard"><p>"Available lots and active reservations"</p></Page> }.into_any(),
        AppRoute::Profile => view! { <Page title="Profile"><p>"Account details"</p></Page> }.into_any(),
        AppRoute::RecentHistory => view! { <Page title="Recent history"><p>"Past reservations"</p></Page> }.into_any(),
        AppRoute::NotFound => view! {
            <Page title="Page not found">
                <p>"The page you requested does not exist."</p>
            </Page>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 创建认证上下文（从 LocalStorage 恢复会话）
    let auth_ctx = AuthContext::new(ApiConfig::default());
    provide_context(auth_ctx);

    // 2. 守卫与会话信号注入路由服务
    let guard = auth_ctx.guard();
    let session = auth_ctx.session_signal();

    view! {
        <Router guard=guard session=session>
            <RouterOutlet matcher=page_for />
        </Router>
    }
}
