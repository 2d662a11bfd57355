//! HTTP 请求封装模块
//!
//! `HttpTransport` 是出站请求的抽象边界：浏览器中由 `gloo-net` 的 fetch
//! 实现，测试中由记录请求的 Mock 实现。传输层只负责“发出去、拿回来”，
//! 不关心凭据，也不解释状态码。

use crate::error::HttpError;
use serde::de::DeserializeOwned;
use std::rc::Rc;
use vpark_shared::protocol::HttpMethod;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 请求头列表，按插入顺序保存，键名大小写不敏感
pub type HeaderList = Vec<(String, String)>;

/// 通用 HTTP 请求结构
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HeaderList,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    /// 读取请求头（大小写不敏感）
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// 设置请求头，替换所有同名（大小写不敏感）的旧值
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// 删除所有同名请求头
    pub fn without_header(mut self, key: &str) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderList,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// 获取 HTTP 状态码
    pub fn status(&self) -> u16 {
        self.status
    }

    /// 检查响应是否成功 (2xx)
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_str(&self.body).map_err(|e| HttpError::ResponseParseFailed(e.to_string()))
    }
}

/// HTTP 传输层 (Trait)
/// (?Send) 是因为浏览器环境下 fetch 的 Future 不是 Send 的
#[async_trait::async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, HttpError>;
}

#[async_trait::async_trait(?Send)]
impl<T: HttpTransport + ?Sized> HttpTransport for Rc<T> {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).send(req).await
    }
}

// =========================================================
// 实现层: Fetch 客户端 (Production)
// =========================================================

/// 基于 `gloo-net` 的浏览器 fetch 传输
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

#[async_trait::async_trait(?Send)]
impl HttpTransport for FetchTransport {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        use gloo_net::http::{Method, RequestBuilder};

        let method = match req.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        };

        let mut builder = RequestBuilder::new(&req.url).method(method);
        for (key, value) in &req.headers {
            builder = builder.header(key, value);
        }

        let request = match req.body {
            Some(body) => builder.body(body),
            None => builder.build(),
        }
        .map_err(|e| HttpError::RequestBuildFailed(e.to_string()))?;

        let response = request
            .send()
            .await
            .map_err(|e| HttpError::NetworkError(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().entries().collect();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::ResponseParseFailed(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// =========================================================
// 测试环境实现 (MockTransport)
// =========================================================

#[cfg(test)]
pub use mock::MockTransport;

#[cfg(test)]
mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// 记录每个出站请求，并按顺序回放预设响应（未预设时返回 200 `{}`）
    #[derive(Debug, Default)]
    pub struct MockTransport {
        pub requests: RefCell<Vec<HttpRequest>>,
        responses: RefCell<VecDeque<Result<HttpResponse, HttpError>>>,
    }

    impl MockTransport {
        pub fn new() -> Rc<Self> {
            Rc::new(Self::default())
        }

        pub fn respond_with(&self, response: HttpResponse) {
            self.responses.borrow_mut().push_back(Ok(response));
        }

        pub fn fail_with(&self, error: HttpError) {
            self.responses.borrow_mut().push_back(Err(error));
        }

        pub fn last_request(&self) -> HttpRequest {
            self.requests
                .borrow()
                .last()
                .cloned()
                .expect("no request was sent")
        }
    }

    #[async_trait::async_trait(?Send)]
    impl HttpTransport for MockTransport {
        async fn send(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
            self.requests.borrow_mut().push(req);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::new(200, "{}")))
        }
    }
}
