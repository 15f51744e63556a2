//! 原生调用封送辅助函数
//!
//! XEditLib 的大多数函数不直接返回结果，而是：
//! - 单步：返回成功标志，结果写入传引用的输出参数
//! - 两步：输出结果长度，再调用 `GetResultString` / `GetResultArray`
//!   把该长度的结果复制到调用方的缓冲区
//!
//! 这里的函数把这些协议转换为带类型的返回值。每个函数接收导出函数名
//! （用于错误信息）、执行原生调用的闭包、按需生成的上下文描述以及 [`OnError`]。

use std::collections::HashMap;

use crate::error::{OnError, Result, XelibError};
use crate::native::{Handle, NativeApi, WordBool};
use crate::utils::from_wide;

fn failed<T>(call: &str, context: impl FnOnce() -> String, on_error: OnError, default: T) -> Result<T> {
    match on_error {
        OnError::Raise => Err(XelibError::call(call, context())),
        OnError::Ignore => {
            tracing::debug!(call, "ignoring failed native call");
            Ok(default)
        }
    }
}

/// 获取字符串结果
///
/// 长度小于 1 时直接返回空字符串，不会调用 `GetResultString`。
pub fn get_string<F, C>(
    api: &dyn NativeApi,
    call: &str,
    callback: F,
    context: C,
    on_error: OnError,
) -> Result<String>
where
    F: FnOnce(&mut i32) -> bool,
    C: FnOnce() -> String,
{
    let mut len = 0i32;
    let ok = callback(&mut len);
    tracing::trace!(call, ok, len, "native call");

    if !ok {
        return failed(call, context, on_error, String::new());
    }
    if len < 1 {
        return Ok(String::new());
    }

    // XEditLib 的字符串是 UTF-16，缓冲区长度必须与结果长度完全一致
    let mut buffer = vec![0u16; len as usize];
    if !api.get_result_string(&mut buffer) {
        return failed(
            "GetResultString",
            || copy_context(context(), call),
            on_error,
            String::new(),
        );
    }

    Ok(from_wide(&buffer))
}

/// 获取数组结果（句柄或数值）
pub fn get_array<F, C>(
    api: &dyn NativeApi,
    call: &str,
    callback: F,
    context: C,
    on_error: OnError,
) -> Result<Vec<u32>>
where
    F: FnOnce(&mut i32) -> bool,
    C: FnOnce() -> String,
{
    let mut len = 0i32;
    let ok = callback(&mut len);
    tracing::trace!(call, ok, len, "native call");

    if !ok {
        return failed(call, context, on_error, Vec::new());
    }
    if len < 1 {
        return Ok(Vec::new());
    }

    let mut buffer = vec![0u32; len as usize];
    if !api.get_result_array(&mut buffer) {
        return failed(
            "GetResultArray",
            || copy_context(context(), call),
            on_error,
            Vec::new(),
        );
    }

    Ok(buffer)
}

fn copy_context(context: String, call: &str) -> String {
    if context.is_empty() {
        format!("copying result of {}", call)
    } else {
        format!("{} (copying result of {})", context, call)
    }
}

/// 获取按行分隔的字符串数组
pub fn get_string_array<F, C>(
    api: &dyn NativeApi,
    call: &str,
    callback: F,
    context: C,
    on_error: OnError,
) -> Result<Vec<String>>
where
    F: FnOnce(&mut i32) -> bool,
    C: FnOnce() -> String,
{
    let text = get_string(api, call, callback, context, on_error)?;
    Ok(split_lines(&text))
}

/// 按 `\r\n`、`\n` 或单独的 `\r` 分行，末尾的换行不产生空行
fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let normalized = text.replace("\r\n", "\n");
    let body = normalized.strip_suffix(LINE_BREAKS).unwrap_or(&normalized);
    body.split(LINE_BREAKS).map(str::to_string).collect()
}

const LINE_BREAKS: &[char] = &['\n', '\r'];

/// 获取 `key=value` 形式的字典
///
/// 按第一个 `=` 分割；重复的键以最后一次出现为准，不含 `=` 的行被跳过。
pub fn get_dictionary<F, C>(
    api: &dyn NativeApi,
    call: &str,
    callback: F,
    context: C,
    on_error: OnError,
) -> Result<HashMap<String, String>>
where
    F: FnOnce(&mut i32) -> bool,
    C: FnOnce() -> String,
{
    let pairs = get_string_array(api, call, callback, context, on_error)?;
    Ok(parse_pairs(call, &pairs))
}

fn parse_pairs(call: &str, pairs: &[String]) -> HashMap<String, String> {
    let mut dictionary = HashMap::with_capacity(pairs.len());
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) => {
                dictionary.insert(key.to_string(), value.to_string());
            }
            None => tracing::warn!(call, entry = %pair, "skipping dictionary entry without '='"),
        }
    }
    dictionary
}

fn get_scalar<T, F, C>(call: &str, callback: F, context: C, on_error: OnError) -> Result<T>
where
    T: Default + std::fmt::Debug,
    F: FnOnce(&mut T) -> bool,
    C: FnOnce() -> String,
{
    let mut value = T::default();
    let ok = callback(&mut value);
    tracing::trace!(call, ok, ?value, "native call");

    if !ok {
        return failed(call, context, on_error, T::default());
    }
    Ok(value)
}

pub fn get_handle<F, C>(call: &str, callback: F, context: C, on_error: OnError) -> Result<Handle>
where
    F: FnOnce(&mut Handle) -> bool,
    C: FnOnce() -> String,
{
    get_scalar(call, callback, context, on_error)
}

pub fn get_integer<F, C>(call: &str, callback: F, context: C, on_error: OnError) -> Result<i32>
where
    F: FnOnce(&mut i32) -> bool,
    C: FnOnce() -> String,
{
    get_scalar(call, callback, context, on_error)
}

pub fn get_unsigned_integer<F, C>(call: &str, callback: F, context: C, on_error: OnError) -> Result<u32>
where
    F: FnOnce(&mut u32) -> bool,
    C: FnOnce() -> String,
{
    get_scalar(call, callback, context, on_error)
}

pub fn get_bool<F, C>(call: &str, callback: F, context: C, on_error: OnError) -> Result<bool>
where
    F: FnOnce(&mut WordBool) -> bool,
    C: FnOnce() -> String,
{
    get_scalar::<WordBool, _, _>(call, callback, context, on_error).map(|value| value != 0)
}

pub fn get_double<F, C>(call: &str, callback: F, context: C, on_error: OnError) -> Result<f64>
where
    F: FnOnce(&mut f64) -> bool,
    C: FnOnce() -> String,
{
    get_scalar(call, callback, context, on_error)
}

pub fn get_byte<F, C>(call: &str, callback: F, context: C, on_error: OnError) -> Result<u8>
where
    F: FnOnce(&mut u8) -> bool,
    C: FnOnce() -> String,
{
    get_scalar(call, callback, context, on_error)
}

/// 检查只返回成功标志的调用
///
/// `Ignore` 时失败返回 `Ok(false)`。
pub fn verify<C>(call: &str, ok: bool, context: C, on_error: OnError) -> Result<bool>
where
    C: FnOnce() -> String,
{
    tracing::trace!(call, ok, "native call");
    if ok {
        Ok(true)
    } else {
        failed(call, context, on_error, false)
    }
}
