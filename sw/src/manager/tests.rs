use super::*;
use crate::backend::mock::{MemoryCacheBackend, MockFetcher, MockRequest, MockResponse};
use std::rc::Rc;

const V1: &str = "vehicle-parking-app-v1";
const V2: &str = "vehicle-parking-app-v2";

type TestManager = CacheManager<Rc<MemoryCacheBackend>, Rc<MockFetcher>>;

fn setup(generation: &str, manifest: &[&str]) -> (TestManager, Rc<MemoryCacheBackend>, Rc<MockFetcher>) {
    let backend = MemoryCacheBackend::new();
    let fetcher = MockFetcher::new();
    for url in manifest {
        fetcher.serve(url, MockResponse::ok(&format!("network {url}")));
    }
    let manager = CacheManager::new(
        CacheConfig::new(generation, manifest.iter().copied()),
        backend.clone(),
        fetcher.clone(),
    );
    (manager, backend, fetcher)
}

async fn bring_up(manager: &TestManager) {
    manager.install().await.unwrap();
    manager.activate().await.unwrap();
}

#[tokio::test]
async fn install_caches_every_manifest_entry() {
    let (manager, backend, _) = setup(V1, &["/", "/index.html", "/static/css/main.css"]);

    manager.install().await.unwrap();

    assert_eq!(manager.state(), WorkerState::Waiting);
    assert_eq!(backend.entry_count(V1), 3);
}

#[tokio::test]
async fn install_failure_leaves_no_partial_generation() {
    let (manager, backend, fetcher) = setup(V1, &["/", "/index.html", "/missing.js"]);
    fetcher.unreachable("/missing.js");

    let err = manager.install().await.unwrap_err();

    assert!(matches!(err, CacheError::InstallFailed { ref url, .. } if url == "/missing.js"));
    assert_eq!(manager.state(), WorkerState::Redundant);
    assert!(backend.names().is_empty());
}

#[tokio::test]
async fn non_success_status_fails_install() {
    let (manager, backend, fetcher) = setup(V1, &["/", "/index.html"]);
    fetcher.serve(
        "/index.html",
        MockResponse {
            status: 500,
            body: String::new(),
        },
    );

    assert!(manager.install().await.is_err());
    assert_eq!(backend.entry_count(V1), 0);
}

#[tokio::test]
async fn storage_failure_mid_install_discards_generation() {
    let (manager, backend, _) = setup(V1, &["/", "/index.html", "/app.js"]);
    backend.fail_puts_after(1);

    let err = manager.install().await.unwrap_err();

    assert!(matches!(err, CacheError::Storage(_)));
    assert_eq!(manager.state(), WorkerState::Redundant);
    assert!(!backend.names().contains(&V1.to_string()));
}

#[tokio::test]
async fn failed_upgrade_keeps_previous_generation_serving() {
    let (old, backend, fetcher) = setup(V1, &["/"]);
    bring_up(&old).await;

    fetcher.unreachable("/app-v2.js");
    let new = CacheManager::new(
        CacheConfig::new(V2, ["/", "/app-v2.js"]),
        backend.clone(),
        fetcher.clone(),
    );
    assert!(new.install().await.is_err());

    assert_eq!(backend.names(), vec![V1.to_string()]);
    assert_eq!(old.state(), WorkerState::Active);
    let before = fetcher.call_count();
    let response = old.handle_fetch(&MockRequest::get("/")).await.unwrap();
    assert_eq!(response.body, "network /");
    assert_eq!(fetcher.call_count(), before);
}

#[tokio::test]
async fn activation_purges_every_other_generation() {
    let (manager, backend, _) = setup(V2, &["/"]);
    backend.seed(V1, &[("/", "old shell")]);
    backend.seed("unrelated-cache", &[("/x", "x")]);

    bring_up(&manager).await;

    assert_eq!(manager.state(), WorkerState::Active);
    assert_eq!(backend.names(), vec![V2.to_string()]);
}

#[tokio::test]
async fn cache_hit_does_not_touch_network() {
    let (manager, backend, fetcher) = setup(V1, &["/index.html"]);
    bring_up(&manager).await;
    backend.seed(V1, &[("/index.html", "cached shell")]);
    let before = fetcher.call_count();

    let response = manager
        .handle_fetch(&MockRequest::get("/index.html"))
        .await
        .unwrap();

    assert_eq!(response.body, "cached shell");
    assert_eq!(fetcher.call_count(), before);
}

#[tokio::test]
async fn cache_miss_goes_to_network_without_storing() {
    let (manager, backend, fetcher) = setup(V1, &["/"]);
    bring_up(&manager).await;
    fetcher.serve("/api/parking-lots", MockResponse::ok("[]"));
    let before = fetcher.call_count();

    let response = manager
        .handle_fetch(&MockRequest::get("/api/parking-lots"))
        .await
        .unwrap();

    assert_eq!(response.body, "[]");
    assert_eq!(fetcher.call_count(), before + 1);
    assert_eq!(fetcher.calls.borrow().last().map(String::as_str), Some("/api/parking-lots"));
    assert_eq!(backend.entry_count(V1), 1);
}

#[tokio::test]
async fn network_errors_on_miss_propagate() {
    let (manager, _, fetcher) = setup(V1, &["/"]);
    bring_up(&manager).await;
    fetcher.unreachable("/api/auth/login");

    let err = manager
        .handle_fetch(&MockRequest::get("/api/auth/login"))
        .await
        .unwrap_err();

    assert!(matches!(err, CacheError::Fetch { .. }));
}

#[tokio::test]
async fn non_get_requests_bypass_cache() {
    let (manager, backend, fetcher) = setup(V1, &["/"]);
    bring_up(&manager).await;
    backend.seed(V1, &[("/api/auth/login", "stale")]);
    fetcher.serve("/api/auth/login", MockResponse::ok("fresh"));

    let response = manager
        .handle_fetch(&MockRequest::post("/api/auth/login"))
        .await
        .unwrap();

    assert_eq!(response.body, "fresh");
}

#[tokio::test]
async fn waiting_worker_does_not_serve_from_cache() {
    let (manager, _, fetcher) = setup(V1, &["/"]);
    manager.install().await.unwrap();
    let before = fetcher.call_count();

    manager.handle_fetch(&MockRequest::get("/")).await.unwrap();

    assert_eq!(fetcher.call_count(), before + 1);
}

#[tokio::test]
async fn resumed_worker_serves_existing_generation() {
    let (manager, backend, fetcher) = setup(V1, &["/"]);
    backend.seed(V1, &[("/", "cached")]);

    manager.resume().await.unwrap();
    let response = manager.handle_fetch(&MockRequest::get("/")).await.unwrap();

    assert_eq!(manager.state(), WorkerState::Active);
    assert_eq!(response.body, "cached");
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn reinstall_over_existing_generation_keeps_it_on_failure() {
    let (manager, backend, fetcher) = setup(V1, &["/", "/broken.js"]);
    backend.seed(V1, &[("/", "previous")]);
    fetcher.unreachable("/broken.js");

    assert!(manager.install().await.is_err());

    assert_eq!(backend.entry_count(V1), 1);
}

#[tokio::test]
async fn superseded_worker_stops_serving_cache() {
    let (manager, _, fetcher) = setup(V1, &["/"]);
    bring_up(&manager).await;

    manager.supersede().await.unwrap();
    let before = fetcher.call_count();
    manager.handle_fetch(&MockRequest::get("/")).await.unwrap();

    assert_eq!(manager.state(), WorkerState::Redundant);
    assert_eq!(fetcher.call_count(), before + 1);
}

#[tokio::test]
async fn lifecycle_events_out_of_order_are_rejected() {
    let (manager, _, _) = setup(V1, &["/"]);

    let err = manager.activate().await.unwrap_err();

    assert!(matches!(err, CacheError::InvalidTransition { .. }));
    assert_eq!(manager.state(), WorkerState::Installing);
}

#[tokio::test]
async fn worker_restarted_while_waiting_still_purges_on_activate() {
    let (installer, backend, fetcher) = setup(V2, &["/", "/index.html"]);
    backend.seed(V1, &[("/", "old shell")]);
    installer.install().await.unwrap();
    drop(installer);

    // 宿主重新执行脚本，新实例直接收到 activate
    let restarted = CacheManager::new(
        CacheConfig::new(V2, ["/", "/index.html"]),
        backend.clone(),
        fetcher.clone(),
    );
    restarted.activate().await.unwrap();

    assert_eq!(restarted.state(), WorkerState::Active);
    assert_eq!(backend.names(), vec![V2.to_string()]);
    assert_eq!(backend.entry_count(V2), 2);
}

#[tokio::test]
async fn activate_without_installed_generation_is_rejected() {
    let (manager, backend, _) = setup(V2, &["/"]);
    backend.seed(V1, &[("/", "old shell")]);

    let err = manager.activate().await.unwrap_err();

    assert!(matches!(err, CacheError::InvalidTransition { .. }));
    assert_eq!(backend.names(), vec![V1.to_string()]);
}
