//! 出局级联
//!
//! 点位出局时，沿 `(top, top_num)` 安置链逐级扣减上级对应分支的业绩。
//! 只在状态翻转的那一次、与翻转同一事务内调用，因此每个点位只扣一次。

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::domain::entity::Location;
use crate::domain::repository::{LocationRepository, RepoError};

/// 安置链最大遍历深度
pub const MAX_CASCADE_DEPTH: usize = 10_000;

/// 扣减出局点位在全部上级中的业绩，返回扣减的层数
pub(crate) fn stop_cascade<S>(store: &mut S, stopped: &Location) -> Result<usize, RepoError>
where
    S: LocationRepository + ?Sized,
{
    let amount = stopped.principal_units();
    if amount <= 0 {
        return Ok(0);
    }

    let mut visited = HashSet::from([stopped.id]);
    let mut next = stopped.parent();
    let mut hops = 0usize;

    while let Some((ancestor_id, branch)) = next {
        if hops >= MAX_CASCADE_DEPTH {
            warn!(location_id = %stopped.id, hops, "安置链超过最大深度，停止级联");
            break;
        }
        if !visited.insert(ancestor_id) {
            warn!(location_id = %stopped.id, ancestor = %ancestor_id, "安置链成环，停止级联");
            break;
        }

        store.subtract_ancestor_totals(ancestor_id, branch, amount)?;
        hops += 1;

        next = match store.get_by_id(ancestor_id)? {
            Some(ancestor) => ancestor.parent(),
            None => None,
        };
    }

    debug!(location_id = %stopped.id, amount, hops, "出局级联完成");
    Ok(hops)
}
