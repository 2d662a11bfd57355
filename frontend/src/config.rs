//! 运行时配置
//!
//! 浏览器里没有环境变量，可覆盖项在构建时通过 `option_env!` 注入。

/// 默认 API 根地址
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// API 客户端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 拼接资源路径，保证两者之间恰好一个 `/`
    pub fn url(&self, resource: &str) -> String {
        if resource.starts_with('/') {
            format!("{}{}", self.base_url, resource)
        } else {
            format!("{}/{}", self.base_url, resource)
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(option_env!("VPARK_API_BASE_URL").unwrap_or(DEFAULT_API_BASE_URL))
    }
}
