//! 结算单与价格变动记录

use base_types::{Amount, PriceChangeId, SettlementId, Timestamp, UserId};

/// 结算类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SettlementKind {
    Withdraw,
    Trade,
}

/// 结算状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SettlementStatus {
    #[default]
    Pending,
    Settled,
}

/// 结算单（提现/交易手续费）
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settlement {
    /// 结算单ID
    pub id: SettlementId,
    /// 发起用户
    pub user_id: UserId,
    /// 类型
    pub kind: SettlementKind,
    /// 主币金额
    pub amount: Amount,
    /// 次级币金额
    pub amount_b: Amount,
    /// 状态
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: SettlementStatus,
    /// 创建时间
    pub created_at: Timestamp,
}

/// 次级币价格变动
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceChange {
    /// 记录ID
    pub id: PriceChangeId,
    /// 变动前价格
    pub origin: Amount,
    /// 变动后价格
    pub price: Amount,
    /// 已处理
    #[cfg_attr(feature = "serde", serde(default))]
    pub processed: bool,
    /// 创建时间
    pub created_at: Timestamp,
}
