use std::path::{Path, PathBuf};
use std::time::Instant;

use super::Session;
use crate::error::{OnError, Result, XelibError};
use crate::marshal;
use crate::native::{GameMode, LoaderStatus};

impl Session {
    pub fn initialize(&self) -> Result<()> {
        let api = self.api()?;
        marshal::verify(
            "InitXEdit",
            api.initialize(),
            || "Failed to initialize XEditLib".to_string(),
            OnError::Raise,
        )?;
        Ok(())
    }

    pub fn finalize(&self) -> Result<()> {
        let api = self.api()?;
        marshal::verify(
            "CloseXEdit",
            api.finalize(),
            || "Failed to finalize XEditLib".to_string(),
            OnError::Raise,
        )?;
        Ok(())
    }

    pub fn set_game_mode(&self, mode: GameMode) -> Result<()> {
        let api = self.api()?;
        marshal::verify(
            "SetGameMode",
            api.set_game_mode(mode.code()),
            || format!("Failed to set game mode to {}", mode),
            OnError::Raise,
        )?;
        tracing::debug!(%mode, "game mode set");
        Ok(())
    }

    /// 游戏安装路径
    ///
    /// 会话打开时由库根据游戏模式查询；未打开时返回配置中的值。
    pub fn game_path(&self) -> Result<Option<PathBuf>> {
        let Ok(api) = self.api() else {
            return Ok(self.config.game_path.clone());
        };

        let mode = self.config.game_mode.unwrap_or(GameMode::SkyrimSpecialEdition);
        let path = marshal::get_string(
            api,
            "GetGamePath",
            |len| api.get_game_path(mode.code(), len),
            || format!("Failed to get game path for {}", mode),
            OnError::Raise,
        )?;

        Ok((!path.is_empty()).then(|| PathBuf::from(path)))
    }

    /// 设置游戏安装路径；会话已打开时同时传给库
    pub fn set_game_path(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if self.is_loaded() {
            self.apply_game_path(&path)?;
        }
        self.config.game_path = Some(path);
        Ok(())
    }

    pub(super) fn apply_game_path(&self, path: &Path) -> Result<()> {
        let api = self.api()?;
        let text = path.to_string_lossy();
        marshal::verify(
            "SetGamePath",
            api.set_game_path(&text),
            || format!("Failed to set game path to {}", text),
            OnError::Raise,
        )?;
        Ok(())
    }

    /// 开始加载插件（异步，需轮询加载器状态）
    pub fn load_plugins(&self, load_order: &str, smart_load: bool) -> Result<()> {
        let api = self.api()?;
        marshal::verify(
            "LoadPlugins",
            api.load_plugins(load_order, smart_load),
            || format!("Failed to load plugins: {}", load_order.replace("\r\n", ", ")),
            OnError::Raise,
        )?;
        Ok(())
    }

    pub fn loader_status(&self) -> Result<LoaderStatus> {
        let api = self.api()?;
        let status = marshal::get_byte(
            "GetLoaderStatus",
            |status| api.get_loader_status(status),
            || "Failed to get loader status".to_string(),
            OnError::Raise,
        )?;
        Ok(LoaderStatus::from_byte(status))
    }

    /// 按固定间隔轮询，直到加载器不再处于 Active 状态
    ///
    /// # 错误
    /// - 超过配置的等待上限时返回 `LoaderTimeout`
    /// - 加载器报告错误时返回 `CallError`，附带库的异常信息
    pub fn wait_for_loader(&self) -> Result<LoaderStatus> {
        let interval = self.config.poll_interval();
        let timeout = self.config.load_timeout();
        let started = Instant::now();

        loop {
            let status = self.loader_status()?;
            match status {
                LoaderStatus::Active => {}
                LoaderStatus::Error => {
                    let message = self.exception_message().unwrap_or_default();
                    return Err(XelibError::call(
                        "LoadPlugins",
                        format!("Plugin loader reported an error: {}", message),
                    ));
                }
                done => {
                    tracing::info!(elapsed = ?started.elapsed(), "plugins loaded");
                    return Ok(done);
                }
            }

            if let Some(limit) = timeout {
                let waited = started.elapsed();
                if waited >= limit {
                    return Err(XelibError::LoaderTimeout { waited });
                }
            }

            std::thread::sleep(interval);
        }
    }

    pub fn loaded_file_names(&self, on_error: OnError) -> Result<Vec<String>> {
        let api = self.api()?;
        marshal::get_string_array(
            api,
            "GetLoadedFileNames",
            |len| api.get_loaded_file_names(len),
            || "Failed to get loaded file names".to_string(),
            on_error,
        )
    }

    /// 库记录的最近一次异常信息
    pub fn exception_message(&self) -> Result<String> {
        let api = self.api()?;
        marshal::get_string(
            api,
            "GetExceptionMessage",
            |len| api.get_exception_message(len),
            String::new,
            OnError::Ignore,
        )
    }
}
