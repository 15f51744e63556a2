//! XEditLib 会话
//!
//! `Session` 持有唯一的已加载原生库实例和句柄管理栈，
//! 负责 加载 → 初始化 → 配置 → 工作 → 释放句柄 → 结束 → 卸载 的完整生命周期。
//! 功能分组（初始化配置、元素值、元素、主文件）分别在子模块中以 `impl Session` 实现。

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::SessionConfig;
use crate::error::{Result, XelibError};
use crate::handles::{HandleStack, ScopeToken};
use crate::native::{DllLoader, Handle, LibraryLoader, NativeApi, NULL_HANDLE};

mod context;
mod element_values;
mod elements;
mod masters;
mod scope;
mod setup;

pub use scope::HandleScope;

/// 进程内是否已有会话持有 XEditLib
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Loading,
    Ready,
    Closing,
}

/// XEditLib 会话
///
/// # 使用示例
///
/// ```rust,ignore
/// use xelib::{Session, SessionConfig, GameMode};
///
/// let config = SessionConfig::new()
///     .with_game_mode(GameMode::SkyrimSpecialEdition)
///     .with_plugins(["Skyrim.esm", "Update.esm"]);
///
/// let mut session = Session::new(config);
/// let masters = session.run(|session| {
///     let mut scope = session.manage_handles();
///     let file = scope.file_by_name("Update.esm")?;
///     scope.get_master_names(file, OnError::Raise)
/// })?;
/// ```
pub struct Session {
    config: SessionConfig,
    loader: Box<dyn LibraryLoader>,
    api: Option<Box<dyn NativeApi>>,
    handles: HandleStack,
    state: SessionState,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("library", &self.loader.describe())
            .field("state", &self.state)
            .field("handles", &self.handles)
            .finish()
    }
}

/// 句柄释放回调；库未加载时视为释放失败
fn native_release(api: Option<&dyn NativeApi>) -> impl FnMut(Handle) -> bool + '_ {
    move |handle| api.map_or(false, |api| api.release(handle))
}

impl Session {
    /// 使用配置中的 `library_path` 从文件系统加载 XEditLib
    pub fn new(config: SessionConfig) -> Self {
        let loader = DllLoader::new(config.library_path.clone());
        Self::with_loader(config, loader)
    }

    /// 使用自定义加载器（测试 mock 等）
    pub fn with_loader(config: SessionConfig, loader: impl LibraryLoader + 'static) -> Self {
        Self {
            config,
            loader: Box::new(loader),
            api: None,
            handles: HandleStack::new(),
            state: SessionState::Closed,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.api.is_some()
    }

    pub fn handles(&self) -> &HandleStack {
        &self.handles
    }

    /// 原生函数表
    ///
    /// # 错误
    /// 会话未打开时返回 `StateError`。
    pub fn api(&self) -> Result<&dyn NativeApi> {
        self.api.as_deref().ok_or_else(|| {
            XelibError::state("XEditLib must be used inside an open session; call `open` or `run` first")
        })
    }

    /// 打开会话
    ///
    /// 加载失败时回到 `Closed`；加载之后的任何失败都会先完成清理再返回错误。
    pub fn open(&mut self) -> Result<()> {
        if self.state != SessionState::Closed {
            return Err(XelibError::state("session already open; XEditLib is already loaded"));
        }
        if SESSION_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(XelibError::state(
                "another session is already open; XEditLib is already loaded in this process",
            ));
        }

        self.state = SessionState::Loading;
        tracing::info!(library = %self.loader.describe(), "opening XEditLib session");

        let api = match self.loader.load() {
            Ok(api) => api,
            Err(err) => {
                self.state = SessionState::Closed;
                SESSION_ACTIVE.store(false, Ordering::Release);
                return Err(err);
            }
        };
        self.api = Some(api);

        if let Err(err) = self.start() {
            tracing::error!(error = %err, "session start failed; tearing down");
            self.teardown();
            return Err(err);
        }

        self.state = SessionState::Ready;
        tracing::info!("XEditLib session ready");
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.initialize()?;

        if let Some(mode) = self.config.game_mode {
            self.set_game_mode(mode)?;
        }

        if let Some(path) = &self.config.game_path {
            self.apply_game_path(path)?;
        }

        if self.config.load_plugins {
            let load_order = self.config.load_order();
            self.load_plugins(&load_order, self.config.smart_load)?;
            self.wait_for_loader()?;
        }

        Ok(())
    }

    /// 关闭会话：释放全部句柄、结束库、卸载库
    ///
    /// # 错误
    /// 会话未打开时返回 `StateError`。
    pub fn close(&mut self) -> Result<()> {
        if self.state != SessionState::Ready {
            return Err(XelibError::state(format!(
                "cannot close session in state {:?}; XEditLib is not loaded",
                self.state
            )));
        }

        self.teardown();
        Ok(())
    }

    /// 尽力清理，单个句柄或结束调用失败不会中断后续步骤
    fn teardown(&mut self) {
        self.state = SessionState::Closing;

        let released = self.release_all_handles();
        tracing::debug!(released, "released all handles");

        if let Some(api) = self.api.as_deref() {
            if !api.finalize() {
                tracing::warn!("XEditLib finalization reported failure");
            }
        }

        // 丢弃即卸载
        self.api = None;
        self.handles.reset();
        self.state = SessionState::Closed;
        SESSION_ACTIVE.store(false, Ordering::Release);
        tracing::info!("XEditLib session closed");
    }

    /// 在会话中执行闭包，无论成功与否都会关闭会话
    ///
    /// 闭包的错误优先于关闭时的错误。
    pub fn run<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        self.open()?;
        let result = f(self);

        let closed = self.close();
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                tracing::error!(error = %close_err, "failed to close session after error");
                Err(err)
            }
        }
    }

    // === 句柄管理 ===

    /// 把句柄记入当前层（空句柄忽略）
    pub fn track_handle(&mut self, handle: Handle) -> Handle {
        if handle != NULL_HANDLE {
            self.handles.track(handle);
        }
        handle
    }

    /// 释放句柄，返回句柄是否被记录过
    ///
    /// 原生释放失败被忽略。未被记录的句柄（例如直接通过 `marshal` 取得的）
    /// 同样交给库释放，但句柄栈不变。
    pub fn release_handle(&mut self, handle: Handle) -> bool {
        let mut release = native_release(self.api.as_deref());
        if handle != NULL_HANDLE && !self.handles.contains(handle) {
            if !release(handle) {
                tracing::debug!(handle, "native release of untracked handle failed");
            }
            return false;
        }
        self.handles.release(handle, release)
    }

    pub fn release_handles<I>(&mut self, handles: I) -> usize
    where
        I: IntoIterator<Item = Handle>,
    {
        handles
            .into_iter()
            .filter(|&handle| self.release_handle(handle))
            .count()
    }

    pub fn release_current_handles(&mut self) -> usize {
        self.handles
            .release_current_layer(native_release(self.api.as_deref()))
    }

    pub fn release_all_handles(&mut self) -> usize {
        self.handles
            .release_all_layers(native_release(self.api.as_deref()))
    }

    /// 把句柄移到外面一层，返回是否成功
    pub fn promote_handle(&mut self, handle: Handle) -> bool {
        self.handles.promote(handle).is_some()
    }

    pub fn enter_scope(&mut self) -> ScopeToken {
        self.handles.enter_scope()
    }

    pub fn exit_scope(&mut self, token: ScopeToken) -> Result<usize> {
        self.handles
            .exit_scope(token, native_release(self.api.as_deref()))
    }

    /// 进入新的句柄作用域，返回的守卫在析构时释放该作用域的句柄
    pub fn manage_handles(&mut self) -> HandleScope<'_> {
        HandleScope::new(self)
    }

    /// 在新的句柄作用域中执行闭包
    pub fn with_handles<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> Result<T>,
    {
        let mut scope = self.manage_handles();
        let result = f(&mut scope);
        let exited = scope.exit();

        match (result, exited) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), _) => Err(err),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.api.is_some() {
            tracing::warn!("session dropped while open; closing");
            self.teardown();
        }
    }
}
