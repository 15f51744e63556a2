use encoding_rs::mem::{convert_str_to_utf16, convert_utf16_to_utf8};

/// 转换为以 null 结尾的 UTF-16 字符串（XEditLib 的 PWideChar）
pub fn to_wide(text: &str) -> Vec<u16> {
    // UTF-16 单元数不会超过 UTF-8 字节数
    let mut buffer = vec![0u16; text.len() + 1];
    let written = convert_str_to_utf16(text, &mut buffer[..text.len()]);
    buffer.truncate(written);
    buffer.push(0);
    buffer
}

/// 从 UTF-16 缓冲区解码字符串，遇到第一个 null 字符截断
///
/// 未配对的代理项替换为 U+FFFD。
pub fn from_wide(buffer: &[u16]) -> String {
    let end = buffer.iter().position(|&unit| unit == 0).unwrap_or(buffer.len());
    let units = &buffer[..end];

    let mut bytes = vec![0u8; units.len() * 3];
    let written = convert_utf16_to_utf8(units, &mut bytes);
    bytes.truncate(written);

    String::from_utf8_lossy(&bytes).into_owned()
}

/// 字符串的 UTF-16 长度（不含结尾 null）
pub fn wide_len(text: &str) -> usize {
    text.encode_utf16().count()
}
