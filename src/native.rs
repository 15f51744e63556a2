/// 原生库接口层
///
/// 该模块定义 XEditLib 导出函数表的抽象接口，支持依赖注入和测试 mock。
///
/// # 架构设计
///
/// - **traits**: `NativeApi` / `LibraryLoader` trait 定义
/// - **types**: 句柄、游戏模式、加载器状态等基础类型
/// - **library**: 基于 libloading 的 XEditLib 实现
/// - **loader**: 默认的 DLL 加载器
///
/// # 使用示例
///
/// ```rust,ignore
/// use xelib::native::{DllLoader, LibraryLoader};
///
/// let loader = DllLoader::new("XEditLib.dll");
/// let api = loader.load()?;
/// api.initialize();
/// ```
pub mod traits;
pub mod types;
pub mod library;
pub mod loader;

// === 导出 trait 定义 ===
pub use traits::{LibraryLoader, NativeApi};

// === 导出基础类型 ===
pub use types::{GameMode, Handle, LoaderStatus, WordBool, NULL_HANDLE};

// === 导出默认实现 ===
pub use library::XEditLib;
pub use loader::DllLoader;
