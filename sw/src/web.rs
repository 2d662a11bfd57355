//! Service Worker 全局作用域绑定
//!
//! 把 `install` / `activate` / `fetch` 事件接到 [`CacheManager`] 上，
//! 并提供基于 `CacheStorage` 和全局 `fetch` 的实现。

use crate::backend::{CacheBackend, CacheKey, ResourceFetcher};
use crate::{CacheConfig, CacheError, CacheManager, WorkerState};
use async_trait::async_trait;
use js_sys::{Array, Promise};
use std::rc::Rc;
use tracing::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise};
use web_sys::{
    Cache, CacheStorage, ExtendableEvent, FetchEvent, Request, Response, ServiceWorkerGlobalScope,
};

type WebManager = CacheManager<WebCacheBackend, WebFetcher>;

fn describe(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn storage_error(err: JsValue) -> CacheError {
    CacheError::Storage(describe(err))
}

fn to_js(err: CacheError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// =========================================================
// CacheStorage
// =========================================================

pub struct WebCacheBackend {
    storage: CacheStorage,
}

impl WebCacheBackend {
    pub fn new(scope: &ServiceWorkerGlobalScope) -> Result<Self, CacheError> {
        let storage = scope.caches().map_err(storage_error)?;
        Ok(Self { storage })
    }

    async fn open(&self, generation: &str) -> Result<Cache, CacheError> {
        let cache = JsFuture::from(self.storage.open(generation))
            .await
            .map_err(storage_error)?;
        Ok(cache.unchecked_into())
    }
}

#[async_trait(?Send)]
impl CacheBackend for WebCacheBackend {
    type Response = Response;

    async fn put(&self, generation: &str, url: &str, response: Response) -> Result<(), CacheError> {
        let cache = self.open(generation).await?;
        JsFuture::from(cache.put_with_str(url, &response))
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn lookup(&self, generation: &str, url: &str) -> Result<Option<Response>, CacheError> {
        let cache = self.open(generation).await?;
        let found = JsFuture::from(cache.match_with_str(url))
            .await
            .map_err(storage_error)?;
        if found.is_undefined() {
            Ok(None)
        } else {
            Ok(Some(found.unchecked_into()))
        }
    }

    async fn generations(&self) -> Result<Vec<String>, CacheError> {
        let keys = JsFuture::from(self.storage.keys())
            .await
            .map_err(storage_error)?;
        Ok(Array::from(&keys).iter().filter_map(|k| k.as_string()).collect())
    }

    async fn delete(&self, generation: &str) -> Result<bool, CacheError> {
        let deleted = JsFuture::from(self.storage.delete(generation))
            .await
            .map_err(storage_error)?;
        Ok(deleted.as_bool().unwrap_or(false))
    }
}

// =========================================================
// 网络
// =========================================================

impl CacheKey for Request {
    fn method(&self) -> String {
        Request::method(self)
    }

    fn url(&self) -> String {
        Request::url(self)
    }
}

pub struct WebFetcher {
    scope: ServiceWorkerGlobalScope,
}

impl WebFetcher {
    pub fn new(scope: ServiceWorkerGlobalScope) -> Self {
        Self { scope }
    }
}

#[async_trait(?Send)]
impl ResourceFetcher for WebFetcher {
    type Request = Request;
    type Response = Response;

    fn request_for(&self, url: &str) -> Result<Request, CacheError> {
        Request::new_with_str(url).map_err(|e| CacheError::Fetch {
            url: url.to_string(),
            reason: describe(e),
        })
    }

    async fn fetch(&self, request: &Request) -> Result<Response, CacheError> {
        let response = JsFuture::from(self.scope.fetch_with_request(request))
            .await
            .map_err(|e| CacheError::Fetch {
                url: request.url(),
                reason: describe(e),
            })?;
        Ok(response.unchecked_into())
    }

    fn is_success(&self, response: &Response) -> bool {
        response.ok()
    }
}

// =========================================================
// 事件绑定
// =========================================================

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    vpark_shared::logging::init(vpark_shared::logging::DEFAULT_FILTER);

    let scope: ServiceWorkerGlobalScope = js_sys::global().unchecked_into();
    let backend = WebCacheBackend::new(&scope).map_err(to_js)?;
    let manager = Rc::new(CacheManager::new(
        CacheConfig::default(),
        backend,
        WebFetcher::new(scope.clone()),
    ));
    info!(generation = manager.generation(), "service worker script evaluated");

    on_install(&scope, manager.clone())?;
    on_activate(&scope, manager.clone())?;
    on_fetch(&scope, manager)?;
    Ok(())
}

fn on_install(scope: &ServiceWorkerGlobalScope, manager: Rc<WebManager>) -> Result<(), JsValue> {
    let closure = Closure::<dyn Fn(ExtendableEvent)>::new(move |event: ExtendableEvent| {
        let manager = manager.clone();
        let promise = future_to_promise(async move {
            manager.install().await.map_err(to_js)?;
            Ok(JsValue::UNDEFINED)
        });
        if let Err(err) = event.wait_until(&promise) {
            warn!(error = %describe(err), "waitUntil rejected for install");
        }
    });
    scope.add_event_listener_with_callback("install", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn on_activate(scope: &ServiceWorkerGlobalScope, manager: Rc<WebManager>) -> Result<(), JsValue> {
    let clients = scope.clients();
    let closure = Closure::<dyn Fn(ExtendableEvent)>::new(move |event: ExtendableEvent| {
        let manager = manager.clone();
        let clients = clients.clone();
        let promise = future_to_promise(async move {
            manager.activate().await.map_err(to_js)?;
            // 立即接管已打开的页面
            JsFuture::from(clients.claim()).await?;
            Ok(JsValue::UNDEFINED)
        });
        if let Err(err) = event.wait_until(&promise) {
            warn!(error = %describe(err), "waitUntil rejected for activate");
        }
    });
    scope.add_event_listener_with_callback("activate", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn on_fetch(scope: &ServiceWorkerGlobalScope, manager: Rc<WebManager>) -> Result<(), JsValue> {
    let closure = Closure::<dyn Fn(FetchEvent)>::new(move |event: FetchEvent| {
        let manager = manager.clone();
        let request = event.request();
        let promise: Promise = future_to_promise(async move {
            // 宿主重启了已激活的 worker：不会再收到 install/activate
            if manager.state() == WorkerState::Installing {
                manager.resume().await.map_err(to_js)?;
            }
            let response = manager.handle_fetch(&request).await.map_err(to_js)?;
            Ok(response.into())
        });
        if let Err(err) = event.respond_with(&promise) {
            warn!(error = %describe(err), "respondWith rejected");
        }
    });
    scope.add_event_listener_with_callback("fetch", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}
