//! Service Worker 生命周期状态机
//!
//! 纯函数：`(状态, 事件) -> (下一状态, 副作用)`，不触碰网络和存储，
//! 副作用由 [`CacheManager`](crate::CacheManager) 执行。
//!
//! ```text
//! installing --InstallComplete--> waiting --Activate--> activating --ActivateComplete--> active
//!     |                                                                                   |
//!     +--InstallFailed--> redundant <------------------Superseded-------------------------+
//! ```
//!
//! 重启后的 worker 总是从 installing 开始：`Restarted` 跳到 waiting，`Resumed` 跳到 active。

use crate::error::CacheError;

/// Worker 状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    /// 安装完成，等待旧版本让出控制权
    Waiting,
    Activating,
    /// 当前代缓存生效，拦截请求时优先读缓存
    Active,
    /// 安装失败或已被新版本取代
    Redundant,
}

/// 宿主环境驱动的生命周期事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `install` 事件开始
    Install,
    /// 清单全部写入
    InstallComplete,
    /// 清单中任一资源失败
    InstallFailed,
    /// `activate` 事件开始
    Activate,
    ActivateComplete,
    /// 新版本已激活
    Superseded,
    /// 宿主重启了一个早已激活的 worker（内存状态丢失，不会再收到 install/activate）
    Resumed,
    /// 宿主重启了已安装、尚未激活的 worker（接下来会收到 activate）
    Restarted,
}

/// 状态转换产生的副作用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// 拉取清单并写入新一代缓存（全有或全无）
    PopulateGeneration,
    /// 删除本次安装创建的那一代缓存
    DiscardGeneration,
    /// 删除名字与当前代不同的所有缓存
    PurgeStaleGenerations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: WorkerState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: WorkerState) -> Self {
        Self {
            next,
            effects: Vec::new(),
        }
    }

    fn with(next: WorkerState, effect: Effect) -> Self {
        Self {
            next,
            effects: vec![effect],
        }
    }
}

impl WorkerState {
    pub fn on_event(self, event: LifecycleEvent) -> Result<Transition, CacheError> {
        use LifecycleEvent as E;
        use WorkerState as S;

        let transition = match (self, event) {
            (S::Installing, E::Install) => Transition::with(S::Installing, Effect::PopulateGeneration),
            (S::Installing, E::InstallComplete) => Transition::to(S::Waiting),
            (S::Installing, E::InstallFailed) => {
                Transition::with(S::Redundant, Effect::DiscardGeneration)
            }
            (S::Installing, E::Resumed) => Transition::to(S::Active),
            (S::Installing, E::Restarted) => Transition::to(S::Waiting),
            (S::Waiting, E::Activate) => {
                Transition::with(S::Activating, Effect::PurgeStaleGenerations)
            }
            (S::Activating, E::ActivateComplete) => Transition::to(S::Active),
            (S::Waiting | S::Activating | S::Active, E::Superseded) => Transition::to(S::Redundant),
            (state, event) => return Err(CacheError::InvalidTransition { state, event }),
        };
        Ok(transition)
    }

    /// 拦截请求时是否读取缓存
    pub fn serves_from_cache(&self) -> bool {
        matches!(self, WorkerState::Active)
    }
}
