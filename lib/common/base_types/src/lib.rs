//! 基础类型定义
//!
//! 提供奖励分配系统的核心基础类型，供所有模块共享使用
//! 遵循 Clean Architecture 原则，将共享的基础类型提取到独立模块

pub mod base_types;
pub mod money;

// Re-export all types
pub use base_types::{LocationId, PriceChangeId, RewardId, SettlementId, Timestamp, UserId};
pub use money::{Amount, MICRO_UNIT, mul_div, to_units};
