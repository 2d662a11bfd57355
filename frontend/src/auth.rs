//! 认证模块
//!
//! 把 `SessionStore` 的状态映射为 Leptos 信号，与路由系统解耦。
//! 路由服务通过注入的会话信号得知登录 / 注销，再交给守卫重新求值。

use crate::api::ApiClient;
use crate::config::ApiConfig;
use crate::error::HttpError;
use crate::guard::RouteGuard;
use crate::session::{Session, SessionStore};
use crate::web::{FetchTransport, LocalStorage};
use leptos::prelude::*;
use vpark_shared::protocol::LoginRequest;
use vpark_shared::{Role, UserProfile};

/// 浏览器中使用的具体类型
pub type AppSession = SessionStore<LocalStorage>;
pub type AppApi = ApiClient<FetchTransport, LocalStorage>;
pub type AppGuard = RouteGuard<LocalStorage>;

/// 认证状态（`SessionStore` 的只读投影）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthState {
    /// 是否已认证
    pub is_authenticated: bool,
    pub role: Option<Role>,
    /// 仅用于展示
    pub profile: Option<UserProfile>,
}

impl From<Option<Session>> for AuthState {
    fn from(session: Option<Session>) -> Self {
        match session {
            Some(session) => Self {
                is_authenticated: true,
                role: Some(session.role),
                profile: session.profile,
            },
            None => Self::default(),
        }
    }
}

/// 认证上下文
///
/// 包含读写信号和 API 客户端，通过 Context 在组件间共享。
#[derive(Clone, Copy)]
pub struct AuthContext {
    /// 认证状态（只读）
    pub state: ReadSignal<AuthState>,
    /// 设置认证状态（写入）
    set_state: WriteSignal<AuthState>,
    api: StoredValue<AppApi>,
}

impl AuthContext {
    /// 创建新的认证上下文，并从 LocalStorage 恢复上次的会话
    pub fn new(config: ApiConfig) -> Self {
        let session = AppSession::new(LocalStorage);
        let (state, set_state) = signal(AuthState::from(session.snapshot()));
        let api = StoredValue::new(AppApi::new(config, FetchTransport, session));
        Self {
            state,
            set_state,
            api,
        }
    }

    pub fn api(&self) -> AppApi {
        self.api.get_value()
    }

    /// 绑定到同一会话的导航守卫
    pub fn guard(&self) -> AppGuard {
        RouteGuard::new(*self.api().session())
    }

    /// 获取会话信号（用于路由服务注入）
    pub fn session_signal(&self) -> Signal<AuthState> {
        let state = self.state;
        Signal::derive(move || state.get())
    }

    /// 重新读取存储，同步到信号
    pub fn refresh(&self) {
        let snapshot = self.api().session().snapshot();
        self.set_state.set(AuthState::from(snapshot));
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 登录并刷新状态
///
/// # Returns
/// 成功时返回登录后的角色；被后端拒绝时返回 `HttpError::Status`
pub async fn login(ctx: &AuthContext, credentials: LoginRequest) -> Result<Role, HttpError> {
    let api = ctx.api();
    let response = api.login(&credentials).await?;
    ctx.refresh();

    if !response.ok() {
        return Err(HttpError::Status {
            status: response.status(),
            body: response.body,
        });
    }
    api.session()
        .role()
        .ok_or_else(|| HttpError::InvalidLoginResponse("session was not stored".to_string()))
}

/// 注销并清除状态
///
/// 导航将由路由服务的会话监听自动处理。
pub fn logout(ctx: &AuthContext) {
    if let Err(err) = ctx.api().logout() {
        tracing::warn!(error = %err, "logout did not clear every key");
    }
    ctx.refresh();
}
