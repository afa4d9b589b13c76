//! 用户信息与余额

use base_types::{Amount, UserId};

/// 用户信息（VIP 与团队统计）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserInfo {
    /// 用户ID
    pub user_id: UserId,
    /// VIP 等级（0..=6）
    pub vip: u8,
    /// 锁定 VIP，不参与复核
    #[cfg_attr(feature = "serde", serde(default))]
    pub lock_vip: bool,
    /// 历史直推人数
    pub history_recommend: i64,
    /// 团队业绩
    pub team_balance: Amount,
}

impl UserInfo {
    pub fn new(user_id: UserId) -> Self { Self { user_id, ..Self::default() } }
}

/// 用户余额
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserBalance {
    /// 用户ID
    pub user_id: UserId,
    /// USDT 余额
    pub balance_usdt: Amount,
    /// 次级币余额
    pub balance_secondary: Amount,
}
