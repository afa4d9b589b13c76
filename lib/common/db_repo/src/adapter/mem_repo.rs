use tracing::debug;

use crate::{RepoError, Transactional};

/// 基于内存的仓储实现
///
/// 状态 `S` 整体持有；事务开始时克隆一份快照，闭包失败时整体还原。
/// 领域层在自己的 crate 里为 `MemRepo<具体表结构>` 实现各仓储 trait。
#[derive(Debug, Clone, Default)]
pub struct MemRepo<S: Clone> {
    state: S,
    tx_depth: u32,
}

impl<S: Clone> MemRepo<S> {
    pub fn new(state: S) -> Self { Self { state, tx_depth: 0 } }

    #[inline]
    pub fn state(&self) -> &S { &self.state }

    #[inline]
    pub fn state_mut(&mut self) -> &mut S { &mut self.state }

    pub fn into_inner(self) -> S { self.state }

    /// 当前是否处于事务中
    #[inline]
    pub fn in_transaction(&self) -> bool { self.tx_depth > 0 }
}

impl<S: Clone> Transactional for MemRepo<S> {
    fn run_in_transaction<T, F>(&mut self, f: F) -> Result<T, RepoError>
    where
        F: FnOnce(&mut Self) -> Result<T, RepoError>,
    {
        if self.tx_depth > 0 {
            return f(self);
        }

        let snapshot = self.state.clone();
        self.tx_depth += 1;
        let result = f(self);
        self.tx_depth -= 1;

        if let Err(e) = &result {
            debug!("内存事务回滚: {}", e);
            self.state = snapshot;
        }
        result
    }
}
