/// 默认的 XEditLib 加载器
use std::path::{Path, PathBuf};

use super::library::XEditLib;
use super::traits::{LibraryLoader, NativeApi};
use crate::error::{Result, XelibError};

/// 从文件系统加载 XEditLib.dll
#[derive(Debug, Clone)]
pub struct DllLoader {
    path: PathBuf,
    search_paths: Vec<PathBuf>,
}

impl DllLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            search_paths: Self::default_search_paths(),
        }
    }

    /// 追加搜索目录（相对路径时使用）
    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// 当前目录优先，其次是可执行文件所在目录
    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }

        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            paths.push(exe_dir);
        }

        paths
    }

    /// 解析库文件的实际位置
    ///
    /// 绝对路径原样使用；相对路径依次在搜索目录中查找。
    pub fn resolve(&self) -> Option<PathBuf> {
        if self.path.is_absolute() {
            return self.path.exists().then(|| self.path.clone());
        }

        self.search_paths
            .iter()
            .map(|dir| dir.join(&self.path))
            .find(|candidate| candidate.exists())
    }
}

impl LibraryLoader for DllLoader {
    fn load(&self) -> Result<Box<dyn NativeApi>> {
        let path = self.resolve().ok_or_else(|| XelibError::Load {
            path: self.path.clone(),
            reason: format!("not found in {} search path(s)", self.search_paths.len()),
        })?;

        let library = XEditLib::open(&path)?;
        Ok(Box::new(library))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
