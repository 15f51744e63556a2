//! XEditLib 动态库实现
//!
//! 通过 `libloading` 打开 XEditLib.dll 并按名称解析导出函数。
//! 缺失的导出函数只记录警告，首次调用时返回失败。

use libloading::Library;
use std::path::{Path, PathBuf};

use super::traits::NativeApi;
use super::types::{Handle, WordBool};
use crate::error::{Result, XelibError};
use crate::utils::to_wide;

type PWideChar = *const u16;

/// 声明导出函数表：字段名、导出符号、函数签名
macro_rules! export_table {
    ($( $field:ident = $symbol:literal : fn($($arg:ty),*) $(-> $ret:ty)? ; )*) => {
        #[derive(Default)]
        struct Exports {
            $( $field: Option<unsafe extern "system" fn($($arg),*) $(-> $ret)?>, )*
        }

        impl Exports {
            fn resolve(library: &Library) -> Self {
                Self {
                    $( $field: resolve_symbol(library, $symbol), )*
                }
            }

            fn missing(&self) -> Vec<&'static str> {
                let mut missing = Vec::new();
                $( if self.$field.is_none() { missing.push($symbol); } )*
                missing
            }
        }
    };
}

export_table! {
    init_xedit = "InitXEdit": fn();
    close_xedit = "CloseXEdit": fn();
    get_result_string = "GetResultString": fn(*mut u16, i32) -> WordBool;
    get_result_array = "GetResultArray": fn(*mut u32, i32) -> WordBool;
    get_exception_message = "GetExceptionMessage": fn(*mut i32) -> WordBool;
    release = "Release": fn(Handle) -> WordBool;
    set_game_mode = "SetGameMode": fn(i32) -> WordBool;
    get_game_path = "GetGamePath": fn(i32, *mut i32) -> WordBool;
    set_game_path = "SetGamePath": fn(PWideChar) -> WordBool;
    load_plugins = "LoadPlugins": fn(PWideChar, WordBool) -> WordBool;
    get_loader_status = "GetLoaderStatus": fn(*mut u8) -> WordBool;
    get_loaded_file_names = "GetLoadedFileNames": fn(*mut i32) -> WordBool;
    file_by_name = "FileByName": fn(PWideChar, *mut Handle) -> WordBool;
    get_element = "GetElement": fn(Handle, PWideChar, *mut Handle) -> WordBool;
    get_links_to = "GetLinksTo": fn(Handle, PWideChar, *mut Handle) -> WordBool;
    name = "Name": fn(Handle, *mut i32) -> WordBool;
    long_name = "LongName": fn(Handle, *mut i32) -> WordBool;
    display_name = "DisplayName": fn(Handle, *mut i32) -> WordBool;
    path = "Path": fn(Handle, WordBool, WordBool, *mut i32) -> WordBool;
    signature = "Signature": fn(Handle, *mut i32) -> WordBool;
    sort_key = "SortKey": fn(Handle, *mut i32) -> WordBool;
    get_value = "GetValue": fn(Handle, PWideChar, *mut i32) -> WordBool;
    set_value = "SetValue": fn(Handle, PWideChar, PWideChar) -> WordBool;
    get_int_value = "GetIntValue": fn(Handle, PWideChar, *mut i32) -> WordBool;
    set_int_value = "SetIntValue": fn(Handle, PWideChar, i32) -> WordBool;
    get_uint_value = "GetUIntValue": fn(Handle, PWideChar, *mut u32) -> WordBool;
    set_uint_value = "SetUIntValue": fn(Handle, PWideChar, u32) -> WordBool;
    get_float_value = "GetFloatValue": fn(Handle, PWideChar, *mut f64) -> WordBool;
    set_float_value = "SetFloatValue": fn(Handle, PWideChar, f64) -> WordBool;
    get_flag = "GetFlag": fn(Handle, PWideChar, PWideChar, *mut WordBool) -> WordBool;
    set_flag = "SetFlag": fn(Handle, PWideChar, PWideChar, WordBool) -> WordBool;
    get_enabled_flags = "GetEnabledFlags": fn(Handle, PWideChar, *mut i32) -> WordBool;
    set_enabled_flags = "SetEnabledFlags": fn(Handle, PWideChar, PWideChar) -> WordBool;
    get_all_flags = "GetAllFlags": fn(Handle, PWideChar, *mut i32) -> WordBool;
    get_enum_options = "GetEnumOptions": fn(Handle, PWideChar, *mut i32) -> WordBool;
    signature_from_name = "SignatureFromName": fn(PWideChar, *mut i32) -> WordBool;
    name_from_signature = "NameFromSignature": fn(PWideChar, *mut i32) -> WordBool;
    get_signature_name_map = "GetSignatureNameMap": fn(*mut i32) -> WordBool;
    clean_masters = "CleanMasters": fn(Handle) -> WordBool;
    sort_masters = "SortMasters": fn(Handle) -> WordBool;
    add_master = "AddMaster": fn(Handle, PWideChar) -> WordBool;
    add_required_masters = "AddRequiredMasters": fn(Handle, Handle, WordBool) -> WordBool;
    get_masters = "GetMasters": fn(Handle, *mut i32) -> WordBool;
    get_required_by = "GetRequiredBy": fn(Handle, *mut i32) -> WordBool;
    get_master_names = "GetMasterNames": fn(Handle, *mut i32) -> WordBool;
}

fn resolve_symbol<T: Copy>(library: &Library, name: &str) -> Option<T> {
    // SAFETY: 签名与 XEditLib 的导出声明一致
    match unsafe { library.get::<T>(name.as_bytes()) } {
        Ok(symbol) => Some(*symbol),
        Err(err) => {
            tracing::warn!(function = name, error = %err, "missing function in XEditLib");
            None
        }
    }
}

/// 调用 WordBool 返回值的导出函数，缺失时返回 false
macro_rules! invoke {
    ($self:ident . $field:ident ( $($arg:expr),* )) => {
        match $self.exports.$field {
            // SAFETY: 函数指针在 `_library` 存活期间有效，参数缓冲区在调用期间存活
            Some(function) => (unsafe { function($($arg),*) }) != 0,
            None => missing_export(stringify!($field)),
        }
    };
}

fn missing_export(field: &str) -> bool {
    tracing::error!(function = field, "call to unresolved XEditLib export");
    false
}

fn word_bool(value: bool) -> WordBool {
    if value {
        1
    } else {
        0
    }
}

fn buffer_len(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

/// 已加载的 XEditLib
///
/// 函数指针从 `_library` 解析，必须与其同生共死；
/// 丢弃该对象即卸载动态库。
pub struct XEditLib {
    exports: Exports,
    path: PathBuf,
    _library: Library,
}

impl std::fmt::Debug for XEditLib {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XEditLib").field("path", &self.path).finish()
    }
}

impl XEditLib {
    /// 打开 XEditLib 并解析导出函数
    ///
    /// # 错误
    /// 库文件不存在或无法加载时返回 `LoadError`。单个导出函数缺失不会导致失败。
    pub fn open(path: &Path) -> Result<Self> {
        // SAFETY: 加载动态库会执行其初始化代码，调用方选择信任该库
        let library = unsafe { Library::new(path) }.map_err(|err| XelibError::Load {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let exports = Exports::resolve(&library);
        let missing = exports.missing();
        if !missing.is_empty() {
            tracing::warn!(count = missing.len(), path = %path.display(), "XEditLib is missing exports");
        }

        tracing::info!(path = %path.display(), "loaded XEditLib");

        Ok(Self {
            exports,
            path: path.to_path_buf(),
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 未解析的导出函数名
    pub fn missing_exports(&self) -> Vec<&'static str> {
        self.exports.missing()
    }
}

impl Drop for XEditLib {
    fn drop(&mut self) {
        tracing::info!(path = %self.path.display(), "unloading XEditLib");
    }
}

impl NativeApi for XEditLib {
    fn initialize(&self) -> bool {
        match self.exports.init_xedit {
            Some(function) => {
                unsafe { function() };
                true
            }
            None => missing_export("init_xedit"),
        }
    }

    fn finalize(&self) -> bool {
        match self.exports.close_xedit {
            Some(function) => {
                unsafe { function() };
                true
            }
            None => missing_export("close_xedit"),
        }
    }

    fn get_result_string(&self, buffer: &mut [u16]) -> bool {
        let len = buffer_len(buffer.len());
        invoke!(self.get_result_string(buffer.as_mut_ptr(), len))
    }

    fn get_result_array(&self, buffer: &mut [u32]) -> bool {
        let len = buffer_len(buffer.len());
        invoke!(self.get_result_array(buffer.as_mut_ptr(), len))
    }

    fn get_exception_message(&self, len: &mut i32) -> bool {
        invoke!(self.get_exception_message(len))
    }

    fn release(&self, id: Handle) -> bool {
        invoke!(self.release(id))
    }

    fn set_game_mode(&self, mode: i32) -> bool {
        invoke!(self.set_game_mode(mode))
    }

    fn get_game_path(&self, mode: i32, len: &mut i32) -> bool {
        invoke!(self.get_game_path(mode, len))
    }

    fn set_game_path(&self, path: &str) -> bool {
        let path = to_wide(path);
        invoke!(self.set_game_path(path.as_ptr()))
    }

    fn load_plugins(&self, load_order: &str, smart_load: bool) -> bool {
        let load_order = to_wide(load_order);
        invoke!(self.load_plugins(load_order.as_ptr(), word_bool(smart_load)))
    }

    fn get_loader_status(&self, status: &mut u8) -> bool {
        invoke!(self.get_loader_status(status))
    }

    fn get_loaded_file_names(&self, len: &mut i32) -> bool {
        invoke!(self.get_loaded_file_names(len))
    }

    fn file_by_name(&self, name: &str, res: &mut Handle) -> bool {
        let name = to_wide(name);
        invoke!(self.file_by_name(name.as_ptr(), res))
    }

    fn get_element(&self, id: Handle, path: &str, res: &mut Handle) -> bool {
        let path = to_wide(path);
        invoke!(self.get_element(id, path.as_ptr(), res))
    }

    fn get_links_to(&self, id: Handle, path: &str, res: &mut Handle) -> bool {
        let path = to_wide(path);
        invoke!(self.get_links_to(id, path.as_ptr(), res))
    }

    fn name(&self, id: Handle, len: &mut i32) -> bool {
        invoke!(self.name(id, len))
    }

    fn long_name(&self, id: Handle, len: &mut i32) -> bool {
        invoke!(self.long_name(id, len))
    }

    fn display_name(&self, id: Handle, len: &mut i32) -> bool {
        invoke!(self.display_name(id, len))
    }

    fn path(&self, id: Handle, short: bool, local: bool, len: &mut i32) -> bool {
        invoke!(self.path(id, word_bool(short), word_bool(local), len))
    }

    fn signature(&self, id: Handle, len: &mut i32) -> bool {
        invoke!(self.signature(id, len))
    }

    fn sort_key(&self, id: Handle, len: &mut i32) -> bool {
        invoke!(self.sort_key(id, len))
    }

    fn get_value(&self, id: Handle, path: &str, len: &mut i32) -> bool {
        let path = to_wide(path);
        invoke!(self.get_value(id, path.as_ptr(), len))
    }

    fn set_value(&self, id: Handle, path: &str, value: &str) -> bool {
        let path = to_wide(path);
        let value = to_wide(value);
        invoke!(self.set_value(id, path.as_ptr(), value.as_ptr()))
    }

    fn get_int_value(&self, id: Handle, path: &str, res: &mut i32) -> bool {
        let path = to_wide(path);
        invoke!(self.get_int_value(id, path.as_ptr(), res))
    }

    fn set_int_value(&self, id: Handle, path: &str, value: i32) -> bool {
        let path = to_wide(path);
        invoke!(self.set_int_value(id, path.as_ptr(), value))
    }

    fn get_uint_value(&self, id: Handle, path: &str, res: &mut u32) -> bool {
        let path = to_wide(path);
        invoke!(self.get_uint_value(id, path.as_ptr(), res))
    }

    fn set_uint_value(&self, id: Handle, path: &str, value: u32) -> bool {
        let path = to_wide(path);
        invoke!(self.set_uint_value(id, path.as_ptr(), value))
    }

    fn get_float_value(&self, id: Handle, path: &str, res: &mut f64) -> bool {
        let path = to_wide(path);
        invoke!(self.get_float_value(id, path.as_ptr(), res))
    }

    fn set_float_value(&self, id: Handle, path: &str, value: f64) -> bool {
        let path = to_wide(path);
        invoke!(self.set_float_value(id, path.as_ptr(), value))
    }

    fn get_flag(&self, id: Handle, path: &str, name: &str, res: &mut WordBool) -> bool {
        let path = to_wide(path);
        let name = to_wide(name);
        invoke!(self.get_flag(id, path.as_ptr(), name.as_ptr(), res))
    }

    fn set_flag(&self, id: Handle, path: &str, name: &str, state: bool) -> bool {
        let path = to_wide(path);
        let name = to_wide(name);
        invoke!(self.set_flag(id, path.as_ptr(), name.as_ptr(), word_bool(state)))
    }

    fn get_enabled_flags(&self, id: Handle, path: &str, len: &mut i32) -> bool {
        let path = to_wide(path);
        invoke!(self.get_enabled_flags(id, path.as_ptr(), len))
    }

    fn set_enabled_flags(&self, id: Handle, path: &str, flags: &str) -> bool {
        let path = to_wide(path);
        let flags = to_wide(flags);
        invoke!(self.set_enabled_flags(id, path.as_ptr(), flags.as_ptr()))
    }

    fn get_all_flags(&self, id: Handle, path: &str, len: &mut i32) -> bool {
        let path = to_wide(path);
        invoke!(self.get_all_flags(id, path.as_ptr(), len))
    }

    fn get_enum_options(&self, id: Handle, path: &str, len: &mut i32) -> bool {
        let path = to_wide(path);
        invoke!(self.get_enum_options(id, path.as_ptr(), len))
    }

    fn signature_from_name(&self, name: &str, len: &mut i32) -> bool {
        let name = to_wide(name);
        invoke!(self.signature_from_name(name.as_ptr(), len))
    }

    fn name_from_signature(&self, signature: &str, len: &mut i32) -> bool {
        let signature = to_wide(signature);
        invoke!(self.name_from_signature(signature.as_ptr(), len))
    }

    fn get_signature_name_map(&self, len: &mut i32) -> bool {
        invoke!(self.get_signature_name_map(len))
    }

    fn clean_masters(&self, id: Handle) -> bool {
        invoke!(self.clean_masters(id))
    }

    fn sort_masters(&self, id: Handle) -> bool {
        invoke!(self.sort_masters(id))
    }

    fn add_master(&self, id: Handle, file_name: &str) -> bool {
        let file_name = to_wide(file_name);
        invoke!(self.add_master(id, file_name.as_ptr()))
    }

    fn add_required_masters(&self, id: Handle, id2: Handle, as_new: bool) -> bool {
        invoke!(self.add_required_masters(id, id2, word_bool(as_new)))
    }

    fn get_masters(&self, id: Handle, len: &mut i32) -> bool {
        invoke!(self.get_masters(id, len))
    }

    fn get_required_by(&self, id: Handle, len: &mut i32) -> bool {
        invoke!(self.get_required_by(id, len))
    }

    fn get_master_names(&self, id: Handle, len: &mut i32) -> bool {
        invoke!(self.get_master_names(id, len))
    }
}
