//! 句柄管理栈
//!
//! 按作用域分层记录已打开的 XEditLib 句柄。栈底是会话的根层，
//! 栈顶是当前层；只有当前层接受新句柄，退出作用域时释放当前层的全部句柄。
//! 每个句柄最多属于一层。

use std::collections::BTreeSet;

use crate::error::{Result, XelibError};
use crate::native::Handle;

/// 一层句柄
pub type Layer = BTreeSet<Handle>;

/// `enter_scope` 返回的凭证，用于匹配对应的 `exit_scope`
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a scope must be exited with the token it returned"]
pub struct ScopeToken {
    depth: usize,
}

impl ScopeToken {
    /// 该作用域所在的层数（根层为 1）
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// 句柄管理栈
#[derive(Debug, Clone)]
pub struct HandleStack {
    /// 从外到内，最后一个为当前层；始终至少包含根层
    layers: Vec<Layer>,
}

impl Default for HandleStack {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleStack {
    pub fn new() -> Self {
        Self {
            layers: vec![Layer::new()],
        }
    }

    /// 层数（包括根层）
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn current_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    fn current_layer_mut(&mut self) -> &mut Layer {
        let top = self.layers.len() - 1;
        &mut self.layers[top]
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.layers.iter().any(|layer| layer.contains(&handle))
    }

    /// 句柄所在的层索引（根层为 0）
    pub fn layer_of(&self, handle: Handle) -> Option<usize> {
        self.layers.iter().rposition(|layer| layer.contains(&handle))
    }

    /// 所有层中已打开的句柄
    pub fn all_handles(&self) -> Layer {
        self.layers.iter().flatten().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Layer::is_empty)
    }

    /// 把句柄记入当前层
    ///
    /// 已被任意一层记录的句柄保持原位。
    pub fn track(&mut self, handle: Handle) {
        if self.contains(handle) {
            return;
        }
        self.current_layer_mut().insert(handle);
    }

    /// 释放句柄
    ///
    /// 原生释放失败会被忽略（资源可能已不存在），但句柄总会从所在层移除。
    /// 未记录的句柄不做任何事，返回 false。
    pub fn release<R>(&mut self, handle: Handle, mut native_release: R) -> bool
    where
        R: FnMut(Handle) -> bool,
    {
        let Some(index) = self.layer_of(handle) else {
            return false;
        };

        if !native_release(handle) {
            tracing::debug!(handle, "native release failed; dropping handle anyway");
        }

        self.layers[index].remove(&handle);
        true
    }

    pub fn release_many<R, I>(&mut self, handles: I, mut native_release: R) -> usize
    where
        R: FnMut(Handle) -> bool,
        I: IntoIterator<Item = Handle>,
    {
        handles
            .into_iter()
            .filter(|&handle| self.release(handle, &mut native_release))
            .count()
    }

    /// 释放当前层的全部句柄
    pub fn release_current_layer<R>(&mut self, native_release: R) -> usize
    where
        R: FnMut(Handle) -> bool,
    {
        let handles: Vec<Handle> = self.current_layer().iter().copied().collect();
        self.release_many(handles, native_release)
    }

    /// 释放所有层的全部句柄（仅用于会话结束）
    pub fn release_all_layers<R>(&mut self, native_release: R) -> usize
    where
        R: FnMut(Handle) -> bool,
    {
        let handles: Vec<Handle> = self.all_handles().into_iter().collect();
        self.release_many(handles, native_release)
    }

    /// 进入新作用域：压入一个空的当前层
    pub fn enter_scope(&mut self) -> ScopeToken {
        self.layers.push(Layer::new());
        let token = ScopeToken {
            depth: self.layers.len(),
        };
        tracing::debug!(depth = token.depth, "entered handle scope");
        token
    }

    /// 退出作用域：释放当前层的句柄并弹出
    ///
    /// # 错误
    /// 凭证与当前层不匹配时返回 `StateError`，栈保持不变。
    pub fn exit_scope<R>(&mut self, token: ScopeToken, native_release: R) -> Result<usize>
    where
        R: FnMut(Handle) -> bool,
    {
        if token.depth != self.layers.len() || token.depth < 2 {
            return Err(XelibError::state(format!(
                "handle scope exit at depth {} does not match current depth {}",
                token.depth,
                self.layers.len()
            )));
        }

        let released = self.release_current_layer(native_release);
        self.layers.pop();
        tracing::debug!(depth = token.depth, released, "exited handle scope");
        Ok(released)
    }

    /// 提升句柄：移到外面一层，使其在当前作用域退出后继续存活
    ///
    /// 从当前层向外查找；根层中的句柄无法再提升。
    /// 返回句柄新所在层的索引。
    pub fn promote(&mut self, handle: Handle) -> Option<usize> {
        for index in (1..self.layers.len()).rev() {
            if self.layers[index].remove(&handle) {
                self.layers[index - 1].insert(handle);
                return Some(index - 1);
            }
        }

        tracing::warn!(handle, "failed to promote handle");
        None
    }

    /// 清空所有层，恢复为只有根层
    pub fn reset(&mut self) {
        self.layers.clear();
        self.layers.push(Layer::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(_: Handle) -> bool {
        true
    }

    #[test]
    fn test_new_stack_has_root_layer() {
        let stack = HandleStack::new();
        assert_eq!(stack.depth(), 1);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_matched_scopes_restore_depth() {
        let mut stack = HandleStack::new();
        let outer = stack.enter_scope();
        let inner = stack.enter_scope();
        assert_eq!(stack.depth(), 3);

        stack.exit_scope(inner, ok).unwrap();
        let again = stack.enter_scope();
        stack.exit_scope(again, ok).unwrap();
        stack.exit_scope(outer, ok).unwrap();

        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_mismatched_exit_is_state_error() {
        let mut stack = HandleStack::new();
        let outer = stack.enter_scope();
        let _inner = stack.enter_scope();

        let err = stack.exit_scope(outer, ok).unwrap_err();
        assert!(err.is_state_error());
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn test_track_is_idempotent() {
        let mut stack = HandleStack::new();
        stack.track(5);
        let _scope = stack.enter_scope();
        stack.track(5);
        stack.track(6);
        stack.track(6);

        assert_eq!(stack.layer_of(5), Some(0));
        assert_eq!(stack.current_layer().len(), 1);
    }

    #[test]
    fn test_new_scope_starts_empty() {
        let mut stack = HandleStack::new();
        stack.track(1);
        let _scope = stack.enter_scope();
        assert!(stack.current_layer().is_empty());
        assert!(stack.contains(1));
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut stack = HandleStack::new();
        stack.track(9);

        let mut calls = Vec::new();
        assert!(stack.release(9, |h| {
            calls.push(h);
            true
        }));
        assert!(!stack.release(9, |h| {
            calls.push(h);
            true
        }));

        assert_eq!(calls, vec![9]);
        assert!(!stack.contains(9));
    }

    #[test]
    fn test_release_removes_even_when_native_call_fails() {
        let mut stack = HandleStack::new();
        let _scope = stack.enter_scope();
        stack.track(3);

        assert!(stack.release(3, |_| false));
        assert!(!stack.contains(3));
    }

    #[test]
    fn test_release_finds_handle_in_parent_layer() {
        let mut stack = HandleStack::new();
        stack.track(1);
        let _scope = stack.enter_scope();
        stack.track(2);

        assert!(stack.release(1, ok));
        assert_eq!(stack.all_handles().into_iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_exit_scope_releases_only_current_layer() {
        let mut stack = HandleStack::new();
        stack.track(1);
        let scope = stack.enter_scope();
        stack.track(2);
        stack.track(3);

        let mut released = Vec::new();
        let count = stack
            .exit_scope(scope, |h| {
                released.push(h);
                true
            })
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(released, vec![2, 3]);
        assert!(stack.contains(1));
    }

    #[test]
    fn test_promote_survives_scope_exit() {
        let mut stack = HandleStack::new();
        let scope = stack.enter_scope();
        stack.track(10);
        stack.track(11);

        assert_eq!(stack.promote(10), Some(0));

        let mut released = Vec::new();
        stack
            .exit_scope(scope, |h| {
                released.push(h);
                true
            })
            .unwrap();

        assert_eq!(released, vec![11]);
        assert!(stack.contains(10));
    }

    #[test]
    fn test_promote_moves_one_layer_only() {
        let mut stack = HandleStack::new();
        let _outer = stack.enter_scope();
        let _inner = stack.enter_scope();
        stack.track(4);

        assert_eq!(stack.promote(4), Some(1));
        assert_eq!(stack.promote(4), Some(0));
        // 根层中的句柄不能再提升
        assert_eq!(stack.promote(4), None);
        assert_eq!(stack.layer_of(4), Some(0));
    }

    #[test]
    fn test_promote_unknown_handle() {
        let mut stack = HandleStack::new();
        let _scope = stack.enter_scope();
        assert_eq!(stack.promote(77), None);
    }

    #[test]
    fn test_release_all_layers() {
        let mut stack = HandleStack::new();
        stack.track(1);
        let _a = stack.enter_scope();
        stack.track(2);
        let _b = stack.enter_scope();
        stack.track(3);

        let mut released = Vec::new();
        let count = stack.release_all_layers(|h| {
            released.push(h);
            h != 2
        });

        assert_eq!(count, 3);
        assert_eq!(released, vec![1, 2, 3]);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut stack = HandleStack::new();
        let _scope = stack.enter_scope();
        stack.track(1);
        stack.reset();
        assert_eq!(stack.depth(), 1);
        assert!(stack.is_empty());
    }
}
