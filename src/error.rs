use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 自定义错误类型
#[derive(Error, Debug)]
pub enum XelibError {
    /// 原生调用返回失败
    #[error("{}", describe_call(.call, .context))]
    Call { call: String, context: String },

    /// 会话生命周期错误（重复打开、未打开就关闭等）
    #[error("Session state error: {0}")]
    State(String),

    #[error("Failed to load native library {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Plugin loader still active after {waited:?}")]
    LoaderTimeout { waited: Duration },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, XelibError>;

impl XelibError {
    pub fn call(call: impl Into<String>, context: impl Into<String>) -> Self {
        XelibError::Call {
            call: call.into(),
            context: context.into(),
        }
    }

    pub fn state(message: impl Into<String>) -> Self {
        XelibError::State(message.into())
    }

    pub fn is_call_error(&self) -> bool {
        matches!(self, XelibError::Call { .. })
    }

    pub fn is_state_error(&self) -> bool {
        matches!(self, XelibError::State(_))
    }
}

fn describe_call(call: &str, context: &str) -> String {
    if context.is_empty() {
        format!("Call to {} failed", call)
    } else {
        format!("{}: call to {} failed", context, call)
    }
}

/// 原生调用失败时的处理方式
///
/// `Ignore` 时失败的调用返回对应类型的默认值（空字符串、空数组、0、false），
/// 而不是返回错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnError {
    #[default]
    Raise,
    Ignore,
}

impl OnError {
    pub fn raises(self) -> bool {
        self == OnError::Raise
    }
}
