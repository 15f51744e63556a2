use super::Session;
use crate::error::{OnError, Result};
use crate::marshal;
use crate::native::Handle;

/// 由游戏硬编码记录生成的伪文件，不能作为主文件
const HARDCODED_SUFFIX: &str = ".Hardcoded.dat";

impl Session {
    pub fn clean_masters(&self, id: Handle, on_error: OnError) -> Result<bool> {
        let api = self.api()?;
        marshal::verify(
            "CleanMasters",
            api.clean_masters(id),
            || format!("Failed to clean masters in: {}", self.safe_element_path(id)),
            on_error,
        )
    }

    pub fn sort_masters(&self, id: Handle, on_error: OnError) -> Result<bool> {
        let api = self.api()?;
        marshal::verify(
            "SortMasters",
            api.sort_masters(id),
            || format!("Failed to sort masters in: {}", self.safe_element_path(id)),
            on_error,
        )
    }

    pub fn add_master(&self, id: Handle, file_name: &str, on_error: OnError) -> Result<bool> {
        let api = self.api()?;
        marshal::verify(
            "AddMaster",
            api.add_master(id, file_name),
            || {
                format!(
                    "Failed to add master {} to file: {}",
                    file_name,
                    self.safe_element_path(id)
                )
            },
            on_error,
        )
    }

    /// 把 `id` 所需的主文件加到文件 `file` 中
    pub fn add_required_masters(
        &self,
        id: Handle,
        file: Handle,
        as_new: bool,
        on_error: OnError,
    ) -> Result<bool> {
        let api = self.api()?;
        marshal::verify(
            "AddRequiredMasters",
            api.add_required_masters(id, file, as_new),
            || {
                format!(
                    "Failed to add required masters for {} to file: {}",
                    self.safe_element_path(id),
                    self.safe_element_path(file)
                )
            },
            on_error,
        )
    }

    /// 主文件句柄，记入当前层
    pub fn get_masters(&mut self, id: Handle, on_error: OnError) -> Result<Vec<Handle>> {
        let api = self.api()?;
        let handles = marshal::get_array(
            api,
            "GetMasters",
            |len| api.get_masters(id, len),
            || format!("Failed to get masters for {}", self.safe_element_path(id)),
            on_error,
        )?;
        Ok(self.track_all(handles))
    }

    /// 依赖该文件的已加载文件句柄，记入当前层
    pub fn get_required_by(&mut self, id: Handle, on_error: OnError) -> Result<Vec<Handle>> {
        let api = self.api()?;
        let handles = marshal::get_array(
            api,
            "GetRequiredBy",
            |len| api.get_required_by(id, len),
            || format!("Failed to get required by for {}", self.safe_element_path(id)),
            on_error,
        )?;
        Ok(self.track_all(handles))
    }

    pub fn get_master_names(&self, id: Handle, on_error: OnError) -> Result<Vec<String>> {
        let api = self.api()?;
        marshal::get_string_array(
            api,
            "GetMasterNames",
            |len| api.get_master_names(id, len),
            || format!("Failed to get master names for {}", self.safe_element_path(id)),
            on_error,
        )
    }

    /// 把加载顺序中排在该文件之前的所有文件添加为主文件
    ///
    /// 返回添加的数量。
    pub fn add_all_masters(&self, id: Handle, on_error: OnError) -> Result<usize> {
        let file_name = self.name(id)?;
        let mut added = 0;

        for loaded in self.loaded_file_names(on_error)? {
            if loaded.ends_with(HARDCODED_SUFFIX) {
                continue;
            }
            if loaded == file_name {
                break;
            }
            if self.add_master(id, &loaded, on_error)? {
                added += 1;
            }
        }

        Ok(added)
    }

    /// 加载顺序中排在该文件之前、尚未成为主文件的文件
    pub fn get_available_masters(&self, id: Handle, on_error: OnError) -> Result<Vec<String>> {
        let file_name = self.name(id)?;
        let current = self.get_master_names(id, on_error)?;

        let available = self
            .loaded_file_names(on_error)?
            .into_iter()
            .take_while(|loaded| *loaded != file_name)
            .filter(|loaded| !current.contains(loaded))
            .collect();

        Ok(available)
    }

    fn track_all(&mut self, handles: Vec<Handle>) -> Vec<Handle> {
        for &handle in &handles {
            self.track_handle(handle);
        }
        handles
    }
}
