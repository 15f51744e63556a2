use std::collections::HashMap;

use super::Session;
use crate::error::{OnError, Result};
use crate::marshal;
use crate::native::{Handle, NativeApi};

impl Session {
    /// 按 id 查询的字符串属性，失败信息为 "{call} failed on {id}"
    fn element_string<F>(&self, call: &str, id: Handle, callback: F) -> Result<String>
    where
        F: FnOnce(&dyn NativeApi, &mut i32) -> bool,
    {
        let api = self.api()?;
        marshal::get_string(
            api,
            call,
            |len| callback(api, len),
            || format!("{} failed on {}", call, id),
            OnError::Raise,
        )
    }

    pub fn name(&self, id: Handle) -> Result<String> {
        self.element_string("Name", id, |api, len| api.name(id, len))
    }

    pub fn long_name(&self, id: Handle) -> Result<String> {
        self.element_string("LongName", id, |api, len| api.long_name(id, len))
    }

    pub fn display_name(&self, id: Handle) -> Result<String> {
        self.element_string("DisplayName", id, |api, len| api.display_name(id, len))
    }

    /// 短路径
    pub fn path(&self, id: Handle) -> Result<String> {
        self.element_string("Path", id, |api, len| api.path(id, true, false, len))
    }

    pub fn long_path(&self, id: Handle) -> Result<String> {
        self.element_string("Path", id, |api, len| api.path(id, false, false, len))
    }

    /// 相对于所在记录的路径
    pub fn local_path(&self, id: Handle) -> Result<String> {
        self.element_string("Path", id, |api, len| api.path(id, false, true, len))
    }

    pub fn signature(&self, id: Handle) -> Result<String> {
        self.element_string("Signature", id, |api, len| api.signature(id, len))
    }

    pub fn sort_key(&self, id: Handle) -> Result<String> {
        self.element_string("SortKey", id, |api, len| api.sort_key(id, len))
    }

    // === 值读写 ===

    pub fn get_value(&self, id: Handle, path: &str, on_error: OnError) -> Result<String> {
        let api = self.api()?;
        marshal::get_string(
            api,
            "GetValue",
            |len| api.get_value(id, path, len),
            || format!("Failed to get element value at {}", self.element_context(id, path)),
            on_error,
        )
    }

    pub fn set_value(&self, id: Handle, path: &str, value: &str) -> Result<()> {
        let api = self.api()?;
        marshal::verify(
            "SetValue",
            api.set_value(id, path, value),
            || format!("Failed to set element value at {}", self.element_context(id, path)),
            OnError::Raise,
        )?;
        Ok(())
    }

    pub fn get_int_value(&self, id: Handle, path: &str, on_error: OnError) -> Result<i32> {
        let api = self.api()?;
        marshal::get_integer(
            "GetIntValue",
            |res| api.get_int_value(id, path, res),
            || format!("Failed to get int value at {}", self.element_context(id, path)),
            on_error,
        )
    }

    pub fn set_int_value(&self, id: Handle, path: &str, value: i32) -> Result<()> {
        let api = self.api()?;
        marshal::verify(
            "SetIntValue",
            api.set_int_value(id, path, value),
            || format!("Failed to set int value at {}", self.element_context(id, path)),
            OnError::Raise,
        )?;
        Ok(())
    }

    pub fn get_uint_value(&self, id: Handle, path: &str, on_error: OnError) -> Result<u32> {
        let api = self.api()?;
        marshal::get_unsigned_integer(
            "GetUIntValue",
            |res| api.get_uint_value(id, path, res),
            || format!("Failed to get uint value at {}", self.element_context(id, path)),
            on_error,
        )
    }

    pub fn set_uint_value(&self, id: Handle, path: &str, value: u32) -> Result<()> {
        let api = self.api()?;
        marshal::verify(
            "SetUIntValue",
            api.set_uint_value(id, path, value),
            || format!("Failed to set uint value at {}", self.element_context(id, path)),
            OnError::Raise,
        )?;
        Ok(())
    }

    pub fn get_float_value(&self, id: Handle, path: &str, on_error: OnError) -> Result<f64> {
        let api = self.api()?;
        marshal::get_double(
            "GetFloatValue",
            |res| api.get_float_value(id, path, res),
            || format!("Failed to get float value at {}", self.element_context(id, path)),
            on_error,
        )
    }

    pub fn set_float_value(&self, id: Handle, path: &str, value: f64) -> Result<()> {
        let api = self.api()?;
        marshal::verify(
            "SetFloatValue",
            api.set_float_value(id, path, value),
            || format!("Failed to set float value at {}", self.element_context(id, path)),
            OnError::Raise,
        )?;
        Ok(())
    }

    // === 标志位 ===

    pub fn get_flag(&self, id: Handle, path: &str, name: &str) -> Result<bool> {
        let api = self.api()?;
        marshal::get_bool(
            "GetFlag",
            |res| api.get_flag(id, path, name, res),
            || format!("Failed to get flag value at {}", self.flag_context(id, path, name)),
            OnError::Raise,
        )
    }

    pub fn set_flag(&self, id: Handle, path: &str, name: &str, state: bool) -> Result<()> {
        let api = self.api()?;
        marshal::verify(
            "SetFlag",
            api.set_flag(id, path, name, state),
            || {
                format!(
                    "Failed to set flag value at {} to {}",
                    self.flag_context(id, path, name),
                    state
                )
            },
            OnError::Raise,
        )?;
        Ok(())
    }

    /// 已启用的标志名（库以逗号分隔返回）
    pub fn get_enabled_flags(&self, id: Handle, path: &str) -> Result<Vec<String>> {
        let api = self.api()?;
        let flags = marshal::get_string(
            api,
            "GetEnabledFlags",
            |len| api.get_enabled_flags(id, path, len),
            || format!("Failed to get enabled flags at {}", self.element_context(id, path)),
            OnError::Raise,
        )?;
        Ok(split_list(&flags))
    }

    pub fn set_enabled_flags<S: AsRef<str>>(&self, id: Handle, path: &str, flags: &[S]) -> Result<()> {
        let api = self.api()?;
        let names: Vec<&str> = flags.iter().map(|flag| flag.as_ref()).collect();
        let joined = names.join(",");
        marshal::verify(
            "SetEnabledFlags",
            api.set_enabled_flags(id, path, &joined),
            || format!("Failed to set enabled flags at {}", self.element_context(id, path)),
            OnError::Raise,
        )?;
        Ok(())
    }

    pub fn get_all_flags(&self, id: Handle, path: &str) -> Result<String> {
        let api = self.api()?;
        marshal::get_string(
            api,
            "GetAllFlags",
            |len| api.get_all_flags(id, path, len),
            || format!("Failed to get all flags at {}", self.element_context(id, path)),
            OnError::Raise,
        )
    }

    pub fn get_enum_options(&self, id: Handle, path: &str) -> Result<Vec<String>> {
        let api = self.api()?;
        let options = marshal::get_string(
            api,
            "GetEnumOptions",
            |len| api.get_enum_options(id, path, len),
            || format!("Failed to get all enum options at {}", self.element_context(id, path)),
            OnError::Raise,
        )?;
        Ok(split_list(&options))
    }

    // === 签名 ===

    pub fn signature_from_name(&self, name: &str) -> Result<String> {
        let api = self.api()?;
        marshal::get_string(
            api,
            "SignatureFromName",
            |len| api.signature_from_name(name, len),
            || format!("Failed to get signature from name: {}", name),
            OnError::Raise,
        )
    }

    pub fn name_from_signature(&self, signature: &str) -> Result<String> {
        let api = self.api()?;
        marshal::get_string(
            api,
            "NameFromSignature",
            |len| api.name_from_signature(signature, len),
            || format!("Failed to get name from signature: {}", signature),
            OnError::Raise,
        )
    }

    /// 签名 → 记录类型名
    pub fn signature_name_map(&self) -> Result<HashMap<String, String>> {
        let api = self.api()?;
        marshal::get_dictionary(
            api,
            "GetSignatureNameMap",
            |len| api.get_signature_name_map(len),
            || "Failed to get signature name map".to_string(),
            OnError::Raise,
        )
    }
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
