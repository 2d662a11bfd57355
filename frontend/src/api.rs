//! 带凭据的 HTTP 客户端
//!
//! 每个请求在发出时（而不是在客户端构造时）从 `SessionStore` 读取 token。
//! 客户端是透明的：不缓存、不重试、不刷新 token，非 2xx 响应原样返回。
//!
//! 请求头合并规则（所有方法共用 [`ApiClient::build_request`]）：
//! 1. 按顺序保留调用方提供的请求头；
//! 2. 有请求体时设置 `Content-Type: application/json`，覆盖调用方的同名头；
//! 3. 删除调用方的所有 `Authorization` 头，再在存在 token 时追加
//!    `Authorization: Bearer <token>`。调用方自带的凭据永远不会被发送。

use crate::config::ApiConfig;
use crate::error::{HttpError, SessionError};
use crate::session::SessionStore;
use crate::web::{HeaderList, HttpRequest, HttpResponse, HttpTransport, KeyValueStore};
use serde::Serialize;
use tracing::{debug, info, warn};
use vpark_shared::protocol::{
    Acknowledgement, ApiRequest, CheckUsernameRequest, HttpMethod, LoginRequest, LoginResponse,
    RegisterRequest,
};
use vpark_shared::{BEARER_PREFIX, CONTENT_TYPE_JSON, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE};

/// 调用方可附加的请求选项
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: HeaderList,
}

impl RequestOptions {
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient<T, S> {
    config: ApiConfig,
    transport: T,
    session: SessionStore<S>,
}

impl<T: HttpTransport, S: KeyValueStore> ApiClient<T, S> {
    pub fn new(config: ApiConfig, transport: T, session: SessionStore<S>) -> Self {
        Self {
            config,
            transport,
            session,
        }
    }

    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    /// 构建出站请求：唯一实现请求头合并规则的地方
    ///
    /// `credential` 为 `None` 时请求不携带 `Authorization`。
    pub fn build_request(
        &self,
        method: HttpMethod,
        resource: &str,
        body: Option<String>,
        caller_headers: &[(String, String)],
        credential: Option<&str>,
    ) -> HttpRequest {
        let mut request = HttpRequest::new(&self.config.url(resource), method);
        request.headers = caller_headers.to_vec();

        if let Some(body) = body {
            request = request
                .with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON)
                .with_body(body);
        }

        match credential {
            Some(token) => request.with_header(
                HEADER_AUTHORIZATION,
                &format!("{}{}", BEARER_PREFIX, token),
            ),
            None => request.without_header(HEADER_AUTHORIZATION),
        }
    }

    async fn dispatch(
        &self,
        method: HttpMethod,
        resource: &str,
        body: Option<String>,
        options: RequestOptions,
    ) -> Result<HttpResponse, HttpError> {
        let token = self.session.token();
        if token.is_none() {
            // 后端会拒绝这个请求，这里不提前拦截
            warn!(method = method.as_str(), resource, "sending request without credential");
        }

        let request =
            self.build_request(method, resource, body, &options.headers, token.as_deref());
        debug!(method = method.as_str(), url = %request.url, "dispatching request");

        let response = self.transport.send(request).await?;
        debug!(status = response.status(), resource, "response received");
        Ok(response)
    }

    fn encode<B: Serialize + ?Sized>(body: &B) -> Result<String, HttpError> {
        Ok(serde_json::to_string(body)?)
    }

    // =========================================================
    // 通用动词
    // =========================================================

    pub async fn get(&self, resource: &str) -> Result<HttpResponse, HttpError> {
        self.get_with(resource, RequestOptions::default()).await
    }

    pub async fn get_with(
        &self,
        resource: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, HttpError> {
        self.dispatch(HttpMethod::Get, resource, None, options).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        body: &B,
    ) -> Result<HttpResponse, HttpError> {
        let body = Self::encode(body)?;
        self.dispatch(HttpMethod::Post, resource, Some(body), RequestOptions::default())
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        body: &B,
    ) -> Result<HttpResponse, HttpError> {
        let body = Self::encode(body)?;
        self.dispatch(HttpMethod::Put, resource, Some(body), RequestOptions::default())
            .await
    }

    pub async fn delete(&self, resource: &str) -> Result<HttpResponse, HttpError> {
        self.dispatch(HttpMethod::Delete, resource, None, RequestOptions::default())
            .await
    }

    // =========================================================
    // 认证
    // =========================================================

    /// 登录
    ///
    /// 不读取已有 token。2xx 响应会被解析并写入 `SessionStore`，随后原样返回；
    /// 非 2xx 响应直接返回，会话保持不变。
    pub async fn login(&self, credentials: &LoginRequest) -> Result<HttpResponse, HttpError> {
        let body = Self::encode(credentials)?;
        let request = self.build_request(
            LoginRequest::METHOD,
            LoginRequest::PATH,
            Some(body),
            &[],
            None,
        );
        let response = self.transport.send(request).await?;

        if !response.ok() {
            info!(status = response.status(), "login rejected");
            return Ok(response);
        }

        let payload: LoginResponse = serde_json::from_str(response.text())
            .map_err(|e| HttpError::InvalidLoginResponse(e.to_string()))?;
        self.session
            .login(&payload.access_token, payload.role, payload.user.as_ref())?;

        info!(role = %payload.role, "login succeeded");
        Ok(response)
    }

    /// 注销（仅清除本地会话）
    pub fn logout(&self) -> Result<(), SessionError> {
        self.session.logout()
    }

    // =========================================================
    // 类型化接口
    // =========================================================

    /// 调用一个类型化接口，非 2xx 响应转换为 [`HttpError::Status`]
    pub async fn call<R: ApiRequest>(&self, request: &R) -> Result<R::Response, HttpError> {
        let body = match R::METHOD {
            HttpMethod::Post | HttpMethod::Put => Some(Self::encode(request)?),
            HttpMethod::Get | HttpMethod::Delete => None,
        };
        let response = self
            .dispatch(R::METHOD, R::PATH, body, RequestOptions::default())
            .await?;

        if !response.ok() {
            return Err(HttpError::Status {
                status: response.status(),
                body: response.body,
            });
        }
        response.json()
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Acknowledgement, HttpError> {
        self.call(request).await
    }

    /// 用户名是否可用
    pub async fn check_username(&self, username: &str) -> Result<bool, HttpError> {
        let request = CheckUsernameRequest {
            username: username.to_string(),
        };
        Ok(self.call(&request).await?.available)
    }
}

#[cfg(test)]
mod tests;
