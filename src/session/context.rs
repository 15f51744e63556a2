//! 错误信息中使用的元素描述

use super::Session;
use crate::native::Handle;

impl Session {
    /// 元素路径；查询失败时退回句柄数值，因而可以安全地用于错误信息
    pub fn safe_element_path(&self, id: Handle) -> String {
        match self.path(id) {
            Ok(path) if !path.is_empty() => path,
            _ => id.to_string(),
        }
    }

    pub fn element_context(&self, id: Handle, path: &str) -> String {
        if path.is_empty() {
            self.safe_element_path(id)
        } else {
            format!("{}, \"{}\"", self.safe_element_path(id), path)
        }
    }

    pub fn flag_context(&self, id: Handle, path: &str, name: &str) -> String {
        format!("{}, \"{}\\{}\"", self.safe_element_path(id), path, name)
    }
}
