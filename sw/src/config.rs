//! 缓存代配置
//!
//! 版本号在构建时通过 `VPARK_CACHE_VERSION` 注入；每次发布新的静态资源都应
//! 提升版本，否则新 worker 会沿用同名缓存。

const CACHE_PREFIX: &str = "vehicle-parking-app-";
const DEFAULT_CACHE_VERSION: &str = "v1";

/// 应用外壳 + 静态资源
const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/vpark-frontend.js",
    "/vpark-frontend_bg.wasm",
    "/static/css/main.css",
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css",
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/js/bootstrap.bundle.min.js",
];

/// 一代缓存：名字 + 预取清单
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub name: String,
    pub manifest: Vec<String>,
}

impl CacheConfig {
    pub fn new(name: impl Into<String>, manifest: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            manifest: manifest.into_iter().map(Into::into).collect(),
        }
    }

    /// 带版本号的缓存名
    pub fn generation_name(version: &str) -> String {
        format!("{}{}", CACHE_PREFIX, version)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let version = option_env!("VPARK_CACHE_VERSION").unwrap_or(DEFAULT_CACHE_VERSION);
        Self::new(Self::generation_name(version), DEFAULT_MANIFEST.iter().copied())
    }
}
