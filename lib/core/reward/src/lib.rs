//! REWARD - 推荐/点位奖励分配引擎
//!
//! Referral-driven placement and reward distribution engine
//!
//! ## 批处理任务
//!
//! - **每日点位**: 点位静态收益 + 推荐链八层佣金
//! - **区域**: 五档区域分红 + 全网前四推荐奖
//! - **团队等级**: 团队等级复核与等级分红
//! - **结算**: 提现/交易手续费的 VIP 级差、平级与直推分成
//! - **价格变动**: 次级币价格变动后的容量重算
//! - **VIP 复核**: 按伞下业绩重新评定 VIP 等级
//!
//! 所有点位入账共享同一套容量规则：入账后 `current` 不超过 `current_max`，
//! 触顶即出局，并沿安置链扣减上级的分区业绩。

pub mod adaptor;
pub mod domain;

pub use adaptor::inbound::in_memory::{InMemoryStore, LedgerSnapshot, LedgerTables};
pub use domain::*;
