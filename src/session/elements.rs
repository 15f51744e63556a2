use super::Session;
use crate::error::{OnError, Result};
use crate::marshal;
use crate::native::Handle;

impl Session {
    /// 按文件名查找已加载的插件，返回的句柄记入当前层
    pub fn file_by_name(&mut self, name: &str) -> Result<Handle> {
        let api = self.api()?;
        let handle = marshal::get_handle(
            "FileByName",
            |res| api.file_by_name(name, res),
            || format!("Failed to find file: {}", name),
            OnError::Raise,
        )?;
        Ok(self.track_handle(handle))
    }

    /// 获取 `path` 处的子元素，返回的句柄记入当前层
    ///
    /// `OnError::Ignore` 时找不到元素返回空句柄 0。
    pub fn get_element(&mut self, id: Handle, path: &str, on_error: OnError) -> Result<Handle> {
        let api = self.api()?;
        let handle = marshal::get_handle(
            "GetElement",
            |res| api.get_element(id, path, res),
            || format!("Failed to get element at {}", self.element_context(id, path)),
            on_error,
        )?;
        Ok(self.track_handle(handle))
    }

    /// 获取引用指向的记录，返回的句柄记入当前层
    pub fn get_links_to(&mut self, id: Handle, path: &str, on_error: OnError) -> Result<Handle> {
        let api = self.api()?;
        let handle = marshal::get_handle(
            "GetLinksTo",
            |res| api.get_links_to(id, path, res),
            || format!("Failed to get reference at {}", self.element_context(id, path)),
            on_error,
        )?;
        Ok(self.track_handle(handle))
    }
}
