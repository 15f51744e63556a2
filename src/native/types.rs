use serde::{Deserialize, Serialize};
use std::fmt;

/// XEditLib 句柄（Delphi Cardinal）
pub type Handle = u32;

/// Delphi WordBool，非 0 为 true
pub type WordBool = u16;

/// 空句柄，XEditLib 从不分配
pub const NULL_HANDLE: Handle = 0;

/// 支持的游戏
///
/// 数值与 XEditLib 的 `TGameMode` 一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    #[serde(rename = "FNV")]
    FalloutNewVegas,
    #[serde(rename = "FO3")]
    Fallout3,
    #[serde(rename = "TES4")]
    Oblivion,
    #[serde(rename = "TES5")]
    Skyrim,
    #[serde(rename = "SSE")]
    SkyrimSpecialEdition,
    #[serde(rename = "FO4")]
    Fallout4,
}

impl GameMode {
    pub fn code(self) -> i32 {
        match self {
            GameMode::FalloutNewVegas => 0,
            GameMode::Fallout3 => 1,
            GameMode::Oblivion => 2,
            GameMode::Skyrim => 3,
            GameMode::SkyrimSpecialEdition => 4,
            GameMode::Fallout4 => 5,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::FalloutNewVegas => "FNV",
            GameMode::Fallout3 => "FO3",
            GameMode::Oblivion => "TES4",
            GameMode::Skyrim => "TES5",
            GameMode::SkyrimSpecialEdition => "SSE",
            GameMode::Fallout4 => "FO4",
        };
        write!(f, "{}", name)
    }
}

/// 插件加载器状态（`GetLoaderStatus` 的输出字节）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderStatus {
    Inactive,
    Active,
    Done,
    Error,
}

impl LoaderStatus {
    /// 未知的状态值视为错误
    pub fn from_byte(value: u8) -> Self {
        match value {
            0 => LoaderStatus::Inactive,
            1 => LoaderStatus::Active,
            2 => LoaderStatus::Done,
            _ => LoaderStatus::Error,
        }
    }
}
