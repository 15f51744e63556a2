/// 原生接口层 - trait 定义
///
/// `NativeApi` 是 XEditLib 导出函数表的 Rust 形式：字符串参数为 `&str`，
/// 输出参数为 `&mut`，返回值表示调用是否成功。
/// 所有方法的默认实现都返回失败，与"导出函数缺失"的行为一致，
/// 测试 mock 只需实现用到的函数。

use super::types::{Handle, WordBool};
use crate::error::Result;

/// XEditLib 导出函数表
///
/// # 调用约定
/// - 单步调用：返回是否成功，结果写入输出参数
/// - 两步调用：先输出结果长度，再通过 `get_result_string` /
///   `get_result_array` 把结果复制到调用方提供的缓冲区
pub trait NativeApi {
    // === 生命周期 ===

    fn initialize(&self) -> bool {
        false
    }

    fn finalize(&self) -> bool {
        false
    }

    // === 结果缓冲区 ===

    /// 复制最近一次字符串结果，复制 `buffer.len()` 个 UTF-16 单元
    fn get_result_string(&self, _buffer: &mut [u16]) -> bool {
        false
    }

    /// 复制最近一次数组结果，复制 `buffer.len()` 个元素
    fn get_result_array(&self, _buffer: &mut [u32]) -> bool {
        false
    }

    fn get_exception_message(&self, _len: &mut i32) -> bool {
        false
    }

    fn release(&self, _id: Handle) -> bool {
        false
    }

    // === 初始化配置 ===

    fn set_game_mode(&self, _mode: i32) -> bool {
        false
    }

    fn get_game_path(&self, _mode: i32, _len: &mut i32) -> bool {
        false
    }

    fn set_game_path(&self, _path: &str) -> bool {
        false
    }

    fn load_plugins(&self, _load_order: &str, _smart_load: bool) -> bool {
        false
    }

    fn get_loader_status(&self, _status: &mut u8) -> bool {
        false
    }

    fn get_loaded_file_names(&self, _len: &mut i32) -> bool {
        false
    }

    // === 元素 ===

    fn file_by_name(&self, _name: &str, _res: &mut Handle) -> bool {
        false
    }

    fn get_element(&self, _id: Handle, _path: &str, _res: &mut Handle) -> bool {
        false
    }

    fn get_links_to(&self, _id: Handle, _path: &str, _res: &mut Handle) -> bool {
        false
    }

    // === 元素值 ===

    fn name(&self, _id: Handle, _len: &mut i32) -> bool {
        false
    }

    fn long_name(&self, _id: Handle, _len: &mut i32) -> bool {
        false
    }

    fn display_name(&self, _id: Handle, _len: &mut i32) -> bool {
        false
    }

    fn path(&self, _id: Handle, _short: bool, _local: bool, _len: &mut i32) -> bool {
        false
    }

    fn signature(&self, _id: Handle, _len: &mut i32) -> bool {
        false
    }

    fn sort_key(&self, _id: Handle, _len: &mut i32) -> bool {
        false
    }

    fn get_value(&self, _id: Handle, _path: &str, _len: &mut i32) -> bool {
        false
    }

    fn set_value(&self, _id: Handle, _path: &str, _value: &str) -> bool {
        false
    }

    fn get_int_value(&self, _id: Handle, _path: &str, _res: &mut i32) -> bool {
        false
    }

    fn set_int_value(&self, _id: Handle, _path: &str, _value: i32) -> bool {
        false
    }

    fn get_uint_value(&self, _id: Handle, _path: &str, _res: &mut u32) -> bool {
        false
    }

    fn set_uint_value(&self, _id: Handle, _path: &str, _value: u32) -> bool {
        false
    }

    fn get_float_value(&self, _id: Handle, _path: &str, _res: &mut f64) -> bool {
        false
    }

    fn set_float_value(&self, _id: Handle, _path: &str, _value: f64) -> bool {
        false
    }

    fn get_flag(&self, _id: Handle, _path: &str, _name: &str, _res: &mut WordBool) -> bool {
        false
    }

    fn set_flag(&self, _id: Handle, _path: &str, _name: &str, _state: bool) -> bool {
        false
    }

    fn get_enabled_flags(&self, _id: Handle, _path: &str, _len: &mut i32) -> bool {
        false
    }

    fn set_enabled_flags(&self, _id: Handle, _path: &str, _flags: &str) -> bool {
        false
    }

    fn get_all_flags(&self, _id: Handle, _path: &str, _len: &mut i32) -> bool {
        false
    }

    fn get_enum_options(&self, _id: Handle, _path: &str, _len: &mut i32) -> bool {
        false
    }

    fn signature_from_name(&self, _name: &str, _len: &mut i32) -> bool {
        false
    }

    fn name_from_signature(&self, _signature: &str, _len: &mut i32) -> bool {
        false
    }

    fn get_signature_name_map(&self, _len: &mut i32) -> bool {
        false
    }

    // === 主文件 ===

    fn clean_masters(&self, _id: Handle) -> bool {
        false
    }

    fn sort_masters(&self, _id: Handle) -> bool {
        false
    }

    fn add_master(&self, _id: Handle, _file_name: &str) -> bool {
        false
    }

    fn add_required_masters(&self, _id: Handle, _id2: Handle, _as_new: bool) -> bool {
        false
    }

    fn get_masters(&self, _id: Handle, _len: &mut i32) -> bool {
        false
    }

    fn get_required_by(&self, _id: Handle, _len: &mut i32) -> bool {
        false
    }

    fn get_master_names(&self, _id: Handle, _len: &mut i32) -> bool {
        false
    }
}

/// 原生库加载 trait
///
/// # 职责
/// - 定位并加载 XEditLib，返回其导出函数表
/// - 丢弃返回的对象即卸载库
pub trait LibraryLoader {
    fn load(&self) -> Result<Box<dyn NativeApi>>;

    /// 用于日志和错误信息的库描述
    fn describe(&self) -> String;
}
