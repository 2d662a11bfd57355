use crate::error::CacheError;
use async_trait::async_trait;
use std::rc::Rc;

// =========================================================
// 抽象接口定义
// =========================================================

/// 能作为缓存键的请求
pub trait CacheKey {
    fn method(&self) -> String;
    fn url(&self) -> String;
}

/// 网络访问
///
/// (?Send) 是因为 Service Worker 环境下的 JS Future 不是 Send 的
#[async_trait(?Send)]
pub trait ResourceFetcher {
    type Request: CacheKey;
    type Response;

    /// 为清单中的 URL 构造 GET 请求
    fn request_for(&self, url: &str) -> Result<Self::Request, CacheError>;

    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, CacheError>;

    /// 2xx 响应才允许进入缓存
    fn is_success(&self, response: &Self::Response) -> bool;
}

/// 按名字分代的缓存存储，键为请求 URL
#[async_trait(?Send)]
pub trait CacheBackend {
    type Response;

    async fn put(&self, generation: &str, url: &str, response: Self::Response)
    -> Result<(), CacheError>;

    async fn lookup(&self, generation: &str, url: &str)
    -> Result<Option<Self::Response>, CacheError>;

    /// 枚举所有代的名字
    async fn generations(&self) -> Result<Vec<String>, CacheError>;

    /// 删除一整代，返回它是否存在
    async fn delete(&self, generation: &str) -> Result<bool, CacheError>;
}

#[async_trait(?Send)]
impl<T: CacheBackend + ?Sized> CacheBackend for Rc<T> {
    type Response = T::Response;

    async fn put(
        &self,
        generation: &str,
        url: &str,
        response: Self::Response,
    ) -> Result<(), CacheError> {
        (**self).put(generation, url, response).await
    }

    async fn lookup(
        &self,
        generation: &str,
        url: &str,
    ) -> Result<Option<Self::Response>, CacheError> {
        (**self).lookup(generation, url).await
    }

    async fn generations(&self) -> Result<Vec<String>, CacheError> {
        (**self).generations().await
    }

    async fn delete(&self, generation: &str) -> Result<bool, CacheError> {
        (**self).delete(generation).await
    }
}

#[async_trait(?Send)]
impl<T: ResourceFetcher + ?Sized> ResourceFetcher for Rc<T> {
    type Request = T::Request;
    type Response = T::Response;

    fn request_for(&self, url: &str) -> Result<Self::Request, CacheError> {
        (**self).request_for(url)
    }

    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, CacheError> {
        (**self).fetch(request).await
    }

    fn is_success(&self, response: &Self::Response) -> bool {
        (**self).is_success(response)
    }
}

// =========================================================
// 测试环境实现
// =========================================================
