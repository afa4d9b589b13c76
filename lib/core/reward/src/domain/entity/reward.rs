//! 奖励流水
//!
//! 只追加的账本：每次入账或扣减都对应一条流水

use base_types::{Amount, LocationId, PriceChangeId, RewardId, SettlementId, Timestamp, UserId};

/// 奖励原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum RewardReason {
    /// 点位静态收益
    Location,
    /// 推荐佣金（第 level 层，1 起）
    Recommend { level: u8 },
    /// 区域分红
    Area { tier: u8 },
    /// 全网前四推荐奖
    TopSponsor { rank: u8 },
    /// 团队等级分红
    TeamLevel { level: u8 },
    /// VIP 级差
    TeamVip { vip: u8 },
    /// VIP 平级
    PeerLevel { vip: u8 },
    /// 直推分成
    DirectRecommend,
    /// 间推分成
    SecondRecommend,
    /// 价格上涨补差
    PriceChangeUp,
    /// 价格下跌扣减
    PriceChangeDown,
    /// 出局对账兑换
    Exchange,
}

/// 流水来源记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "id", rename_all = "snake_case"))]
pub enum RewardSource {
    #[default]
    None,
    Location(LocationId),
    Settlement(SettlementId),
    PriceChange(PriceChangeId),
}

/// 待追加的流水
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReward {
    /// 受益用户
    pub user_id: UserId,
    /// 主币金额（扣减为负）
    pub amount: Amount,
    /// 次级币金额
    pub amount_b: Amount,
    /// 原因
    pub reason: RewardReason,
    /// 来源
    pub source: RewardSource,
    /// 被入账的点位
    pub location_id: Option<LocationId>,
    /// 发生时间
    pub created_at: Timestamp,
}

/// 奖励流水
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reward {
    pub id: RewardId,
    pub user_id: UserId,
    pub amount: Amount,
    pub amount_b: Amount,
    pub reason: RewardReason,
    pub source: RewardSource,
    pub location_id: Option<LocationId>,
    pub created_at: Timestamp,
}

impl Reward {
    pub fn from_new(id: RewardId, new: NewReward) -> Self {
        Self {
            id,
            user_id: new.user_id,
            amount: new.amount,
            amount_b: new.amount_b,
            reason: new.reason,
            source: new.source,
            location_id: new.location_id,
            created_at: new.created_at,
        }
    }
}
