//! 分配引擎
//!
//! 持有仓储与运行上下文；各批处理任务在各自文件中实现

use base_types::Timestamp;
use chrono::NaiveDate;
use db_repo::RepoError;

use crate::domain::repository::LedgerStore;

/// 整次运行的前置条件失败
///
/// 单个用户/点位的问题不会走到这里，只会记入 `RunReport::skipped`
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 配置无法读取
    #[error("configuration unreadable: {0}")]
    Config(#[source] RepoError),
    /// 账本快照无法读取
    #[error("ledger snapshot unreadable: {0}")]
    Snapshot(#[source] RepoError),
}

/// 运行上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    /// 本次运行的时间
    pub now: Timestamp,
    /// 业务日 UTC 偏移（小时）
    pub utc_offset_hours: i32,
}

impl RunContext {
    pub fn new(now: Timestamp, utc_offset_hours: i32) -> Self { Self { now, utc_offset_hours } }

    /// 今天（业务日）
    pub fn today(&self) -> NaiveDate { self.now.business_date(self.utc_offset_hours) }

    /// 昨天（业务日）
    pub fn yesterday(&self) -> NaiveDate { self.now.plus_days(-1).business_date(self.utc_offset_hours) }

    /// 前天（业务日）
    pub fn day_before_yesterday(&self) -> NaiveDate {
        self.now.plus_days(-2).business_date(self.utc_offset_hours)
    }
}

impl Default for RunContext {
    fn default() -> Self { Self { now: Timestamp::now(), utc_offset_hours: 8 } }
}

/// 奖励分配引擎
pub struct RewardEngine<S>
where
    S: LedgerStore,
{
    /// 账本仓储
    pub(crate) store: S,
    /// 运行上下文
    pub(crate) ctx: RunContext,
}

impl<S> RewardEngine<S>
where
    S: LedgerStore,
{
    /// 创建分配引擎
    pub fn new(store: S, ctx: RunContext) -> Self { Self { store, ctx } }

    /// 设置当前时间戳
    pub fn set_timestamp(&mut self, ts: Timestamp) { self.ctx.now = ts; }

    pub fn context(&self) -> RunContext { self.ctx }

    pub fn store(&self) -> &S { &self.store }

    pub fn store_mut(&mut self) -> &mut S { &mut self.store }

    pub fn into_store(self) -> S { self.store }
}
