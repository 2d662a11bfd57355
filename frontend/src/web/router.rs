//! 客户端路由
//!
//! 所有 `window.history` / `window.location` 访问都在这里。
//! 每次路由变化都走同一条路径：解析 URL，交给守卫，放行或重定向，再更新信号。
//! 触发源有三个：应用内导航、浏览器后退/前进、会话变化。

use leptos::prelude::*;
use tracing::debug;
use wasm_bindgen::prelude::*;

use super::route::{AppRoute, normalize_path};
use crate::auth::{AppGuard, AuthState};

/// 写入地址栏的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryMode {
    /// 新增一条记录（正常导航）
    Push,
    /// 覆盖当前记录（重定向，被拒绝的地址不留在历史中）
    Replace,
}

fn location_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

fn write_history(url: &str, mode: HistoryMode) {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        return;
    };
    let result = match mode {
        HistoryMode::Push => history.push_state_with_url(&JsValue::NULL, "", Some(url)),
        HistoryMode::Replace => history.replace_state_with_url(&JsValue::NULL, "", Some(url)),
    };
    if result.is_err() {
        debug!(url, ?mode, "history update rejected");
    }
}

/// 路由解析结果
struct Resolved {
    route: AppRoute,
    url: String,
    redirected: bool,
}

fn resolve(guard: &AppGuard, path: &str) -> Resolved {
    let requested = AppRoute::from_path(path);
    let decision = guard.evaluate(requested);
    if decision.is_allowed() {
        return Resolved {
            route: requested,
            url: normalize_path(path).to_string(),
            redirected: false,
        };
    }
    let route = decision.destination(requested);
    debug!(from = %requested, to = %route, "navigation redirected");
    Resolved {
        route,
        url: route.to_path().to_string(),
        redirected: true,
    }
}

/// 路由服务，经 Context 共享
#[derive(Clone, Copy)]
pub struct RouterService {
    route: ReadSignal<AppRoute>,
    set_route: WriteSignal<AppRoute>,
    guard: StoredValue<AppGuard>,
}

impl RouterService {
    fn new(guard: AppGuard) -> Self {
        // 首屏直达的地址也要过守卫
        let landing = resolve(&guard, &location_path());
        if landing.redirected {
            write_history(&landing.url, HistoryMode::Replace);
        }
        let (route, set_route) = signal(landing.route);
        Self {
            route,
            set_route,
            guard: StoredValue::new(guard),
        }
    }

    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.route
    }

    /// 应用内导航
    pub fn navigate(&self, path: &str) {
        let resolved = resolve(&self.guard.get_value(), path);
        let mode = if resolved.redirected {
            HistoryMode::Replace
        } else {
            HistoryMode::Push
        };
        write_history(&resolved.url, mode);
        self.set_route.set(resolved.route);
    }

    /// 浏览器后退/前进：地址栏已经变了，只在重定向时覆盖
    fn listen_popstate(&self) {
        let service = *self;
        let on_popstate = Closure::<dyn Fn()>::new(move || {
            let resolved = resolve(&service.guard.get_value(), &location_path());
            if resolved.redirected {
                write_history(&resolved.url, HistoryMode::Replace);
            }
            service.set_route.set(resolved.route);
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", on_popstate.as_ref().unchecked_ref());
        }
        // 监听器与页面同寿命
        on_popstate.forget();
    }

    /// 登录 / 注销后重新检查当前页面
    fn follow_session(&self, session: Signal<AuthState>) {
        let service = *self;
        Effect::new(move |_| {
            session.track();
            let current = service.route.get_untracked();
            let decision = service.guard.get_value().evaluate(current);
            if !decision.is_allowed() {
                let target = decision.destination(current);
                debug!(from = %current, to = %target, "session changed, leaving page");
                write_history(target.to_path(), HistoryMode::Replace);
                service.set_route.set(target);
            }
        });
    }
}

pub fn use_router() -> RouterService {
    use_context::<RouterService>().expect("RouterService must be provided by <Router>")
}

pub fn use_navigate() -> impl Fn(&str) + Clone {
    let router = use_router();
    move |path: &str| router.navigate(path)
}

// ============================================================================
// 组件
// ============================================================================

/// 根组件：创建路由服务并放入 Context
#[component]
pub fn Router(
    guard: AppGuard,
    /// 会话快照；变化时当前页面会被重新求值
    session: Signal<AuthState>,
    children: Children,
) -> impl IntoView {
    let service = RouterService::new(guard);
    service.listen_popstate();
    service.follow_session(session);
    provide_context(service);

    children()
}

/// 渲染当前路由对应的视图
#[component]
pub fn RouterOutlet(matcher: fn(AppRoute) -> AnyView) -> impl IntoView {
    let router = use_router();
    move || matcher(router.current_route().get())
}

/// 站内链接，点击时不刷新页面
#[component]
pub fn Link(#[prop(into)] to: String, children: Children) -> impl IntoView {
    let router = use_router();
    let target = to.clone();

    view! {
        <a
            href=to
            on:click=move |ev: web_sys::MouseEvent| {
                ev.prevent_default();
                router.navigate(&target);
            }
        >
            {children()}
        </a>
    }
}
