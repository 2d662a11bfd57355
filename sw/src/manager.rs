use crate::backend::{CacheBackend, CacheKey, ResourceFetcher};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::lifecycle::{Effect, LifecycleEvent, WorkerState};
use futures::future::try_join_all;
use std::cell::Cell;
use tracing::{debug, info, warn};

/// 离线缓存代理
///
/// 每个实例对应一个 worker 版本和它的一代缓存。生命周期事件由宿主环境串行
/// 驱动；请求拦截可以并发，但只读缓存。
pub struct CacheManager<C, F> {
    config: CacheConfig,
    backend: C,
    fetcher: F,
    state: Cell<WorkerState>,
    /// 本次安装是否新建了这一代缓存（决定安装失败时能否删除）
    owns_generation: Cell<bool>,
}

impl<C, F> CacheManager<C, F>
where
    C: CacheBackend,
    F: ResourceFetcher<Response = C::Response>,
{
    pub fn new(config: CacheConfig, backend: C, fetcher: F) -> Self {
        Self {
            config,
            backend,
            fetcher,
            state: Cell::new(WorkerState::Installing),
            owns_generation: Cell::new(false),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    pub fn generation(&self) -> &str {
        &self.config.name
    }

    // =========================================================
    // 生命周期
    // =========================================================

    /// `install`：拉取整个清单并写入新一代缓存
    ///
    /// 任一资源失败则整代丢弃，worker 进入 redundant，旧一代不受影响。
    pub async fn install(&self) -> Result<(), CacheError> {
        match self.dispatch(LifecycleEvent::Install).await {
            Ok(()) => self.dispatch(LifecycleEvent::InstallComplete).await,
            Err(err @ CacheError::InvalidTransition { .. }) => Err(err),
            Err(err) => {
                warn!(generation = %self.config.name, error = %err, "install failed, discarding generation");
                if let Err(discard_err) = self.dispatch(LifecycleEvent::InstallFailed).await {
                    warn!(error = %discard_err, "failed to discard partial generation");
                }
                Err(err)
            }
        }
    }

    /// `activate`：删除其他所有代，然后开始从缓存服务
    ///
    /// 清理失败只记录日志，激活照常完成。
    /// 安装后等待期间 worker 可能被宿主回收，重启后的实例直接收到 activate；
    /// 只要这一代缓存已经存在，就视为安装完成。
    pub async fn activate(&self) -> Result<(), CacheError> {
        if self.state.get() == WorkerState::Installing && self.generation_exists().await {
            info!(generation = %self.config.name, "worker restarted after install");
            self.dispatch(LifecycleEvent::Restarted).await?;
        }
        match self.dispatch(LifecycleEvent::Activate).await {
            Ok(()) => {}
            Err(err @ CacheError::InvalidTransition { .. }) => return Err(err),
            Err(err) => warn!(error = %err, "stale cache purge incomplete"),
        }
        self.dispatch(LifecycleEvent::ActivateComplete).await
    }

    /// 宿主重启了已激活的 worker
    pub async fn resume(&self) -> Result<(), CacheError> {
        self.dispatch(LifecycleEvent::Resumed).await
    }

    /// 新版本已接管
    pub async fn supersede(&self) -> Result<(), CacheError> {
        self.dispatch(LifecycleEvent::Superseded).await
    }

    async fn generation_exists(&self) -> bool {
        match self.backend.generations().await {
            Ok(names) => names.iter().any(|name| name == &self.config.name),
            Err(err) => {
                warn!(error = %err, "failed to list cache generations");
                false
            }
        }
    }

    async fn dispatch(&self, event: LifecycleEvent) -> Result<(), CacheError> {
        let from = self.state.get();
        let transition = from.on_event(event)?;
        debug!(?from, to = ?transition.next, ?event, "lifecycle transition");
        self.state.set(transition.next);

        for effect in transition.effects {
            self.run(effect).await?;
        }
        Ok(())
    }

    async fn run(&self, effect: Effect) -> Result<(), CacheError> {
        match effect {
            Effect::PopulateGeneration => self.populate().await,
            Effect::DiscardGeneration => self.discard().await,
            Effect::PurgeStaleGenerations => self.purge_stale().await,
        }
    }

    // =========================================================
    // 副作用
    // =========================================================

    async fn populate(&self) -> Result<(), CacheError> {
        let name = &self.config.name;
        let existed = self.backend.generations().await?.iter().any(|g| g == name);
        if existed {
            warn!(generation = %name, "generation already exists, installing over it");
        }
        self.owns_generation.set(!existed);

        let requests = self
            .config
            .manifest
            .iter()
            .map(|url| Ok((url, self.fetcher.request_for(url)?)))
            .collect::<Result<Vec<_>, CacheError>>()?;

        // 先全部取回，再统一写入：任何失败都不会留下半代缓存
        let fetched = try_join_all(requests.iter().map(|(url, request)| async move {
            let response = self.fetcher.fetch(request).await.map_err(|e| {
                CacheError::InstallFailed {
                    generation: name.clone(),
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            })?;
            if !self.fetcher.is_success(&response) {
                return Err(CacheError::InstallFailed {
                    generation: name.clone(),
                    url: url.to_string(),
                    reason: "non-success status".to_string(),
                });
            }
            Ok((*url, response))
        }))
        .await?;

        for (url, response) in fetched {
            self.backend.put(name, url, response).await?;
        }
        info!(generation = %name, resources = self.config.manifest.len(), "cache generation populated");
        Ok(())
    }

    async fn discard(&self) -> Result<(), CacheError> {
        if !self.owns_generation.get() {
            return Ok(());
        }
        if self.backend.delete(&self.config.name).await? {
            info!(generation = %self.config.name, "discarded partial generation");
        }
        Ok(())
    }

    async fn purge_stale(&self) -> Result<(), CacheError> {
        let stale: Vec<String> = self
            .backend
            .generations()
            .await?
            .into_iter()
            .filter(|name| name != &self.config.name)
            .collect();

        for name in stale {
            match self.backend.delete(&name).await {
                Ok(_) => info!(generation = %name, "deleted stale cache"),
                Err(err) => warn!(generation = %name, error = %err, "failed to delete stale cache"),
            }
        }
        Ok(())
    }

    // =========================================================
    // 请求拦截
    // =========================================================

    /// 缓存优先：命中则不访问网络；未命中直接转发，响应原样返回且不写回缓存
    pub async fn handle_fetch(&self, request: &F::Request) -> Result<F::Response, CacheError> {
        if self.state.get().serves_from_cache() && request.method().eq_ignore_ascii_case("GET") {
            let url = request.url();
            match self.backend.lookup(&self.config.name, &url).await {
                Ok(Some(response)) => {
                    debug!(%url, "cache hit");
                    return Ok(response);
                }
                Ok(None) => debug!(%url, "cache miss"),
                Err(err) => warn!(%url, error = %err, "cache lookup failed, using network"),
            }
        }
        self.fetcher.fetch(request).await
    }
}

#[cfg(test)]
mod tests;
