pub mod config;
pub mod error;
pub mod handles;
pub mod marshal;
pub mod native;
pub mod session;
pub mod utils;

// 重新导出主要结构
pub use config::SessionConfig;
pub use error::{OnError, Result, XelibError};
pub use handles::{HandleStack, ScopeToken};
pub use native::{GameMode, Handle, LibraryLoader, LoaderStatus, NativeApi};
pub use session::{HandleScope, Session, SessionState};
