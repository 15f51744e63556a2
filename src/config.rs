use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::native::GameMode;

/// 默认的动态库文件名
pub const DEFAULT_LIBRARY: &str = "XEditLib.dll";

/// 会话配置
///
/// 可以从 JSON 文件加载，缺省字段使用默认值：
///
/// ```json
/// {
///     "game_mode": "SSE",
///     "plugins": ["Skyrim.esm", "Update.esm", "MyMod.esp"],
///     "load_timeout_ms": 300000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// XEditLib.dll 路径
    pub library_path: PathBuf,
    /// 游戏模式，None 时保持库的默认值
    pub game_mode: Option<GameMode>,
    /// 游戏安装路径，None 时由库根据游戏模式查询
    pub game_path: Option<PathBuf>,
    /// 按加载顺序排列的插件文件名
    pub plugins: Vec<String>,
    /// 打开会话时是否加载插件
    pub load_plugins: bool,
    /// 传给 LoadPlugins 的 smartLoad 参数
    pub smart_load: bool,
    /// 加载器状态轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 等待插件加载完成的上限（毫秒），None 表示无限等待
    pub load_timeout_ms: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            library_path: PathBuf::from(DEFAULT_LIBRARY),
            game_mode: Some(GameMode::SkyrimSpecialEdition),
            game_path: None,
            plugins: Vec::new(),
            load_plugins: true,
            smart_load: true,
            poll_interval_ms: 100,
            load_timeout_ms: Some(600_000),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = path.into();
        self
    }

    pub fn with_game_mode(mut self, mode: GameMode) -> Self {
        self.game_mode = Some(mode);
        self
    }

    pub fn with_game_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.game_path = Some(path.into());
        self
    }

    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_load_plugins(mut self, load: bool) -> Self {
        self.load_plugins = load;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.load_timeout_ms = timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }

    /// LoadPlugins 需要的加载顺序文本（每行一个插件）
    pub fn load_order(&self) -> String {
        self.plugins.join("\r\n")
    }
}
