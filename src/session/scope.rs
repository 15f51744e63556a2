use std::ops::{Deref, DerefMut};

use super::Session;
use crate::error::Result;
use crate::handles::ScopeToken;

/// 句柄作用域守卫
///
/// 创建时进入新的句柄层，析构时（正常返回、`?` 提前返回或 panic 展开）
/// 释放该层所有未被提升的句柄。守卫可解引用为 `Session`，嵌套作用域
/// 通过在守卫上再次调用 `manage_handles` 创建。
///
/// ```rust,ignore
/// let mut scope = session.manage_handles();
/// let file = scope.file_by_name("MyMod.esp")?;
/// scope.promote_handle(file);
/// // scope 析构时释放其余句柄，file 留在外层
/// ```
pub struct HandleScope<'s> {
    session: &'s mut Session,
    token: Option<ScopeToken>,
}

impl<'s> HandleScope<'s> {
    pub(super) fn new(session: &'s mut Session) -> Self {
        let token = session.enter_scope();
        Self {
            session,
            token: Some(token),
        }
    }

    /// 显式退出作用域，返回释放的句柄数
    pub fn exit(mut self) -> Result<usize> {
        match self.token.take() {
            Some(token) => self.session.exit_scope(token),
            None => Ok(0),
        }
    }
}

impl Deref for HandleScope<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        &*self.session
    }
}

impl DerefMut for HandleScope<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        &mut *self.session
    }
}

impl Drop for HandleScope<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            if let Err(err) = self.session.exit_scope(token) {
                tracing::error!(error = %err, "failed to exit handle scope");
            }
        }
    }
}
