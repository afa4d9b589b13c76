//! 运行报告
//!
//! 每个批处理任务返回一份报告：逐个单元记录入账结果或跳过原因

use base_types::{Amount, LocationId, PriceChangeId, SettlementId, UserId};
use tracing::{debug, info};

/// 批处理任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PassKind {
    DailyLocation,
    Area,
    TeamLevel,
    Settlement,
    PriceChange,
    VipRecheck,
}

impl PassKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            PassKind::DailyLocation => "daily_location",
            PassKind::Area => "area",
            PassKind::TeamLevel => "team_level",
            PassKind::Settlement => "settlement",
            PassKind::PriceChange => "price_change",
            PassKind::VipRecheck => "vip_recheck",
        }
    }
}

/// 处理单元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "unit", rename_all = "snake_case"))]
pub enum UnitRef {
    /// 点位自身
    Location { location_id: LocationId },
    /// 某点位带来的第 level 层上级佣金
    Commission { child: LocationId, ancestor: UserId, level: u8 },
    /// 区域档位成员
    AreaTier { location_id: LocationId, tier: u8 },
    /// 前四推荐奖名次
    TopSponsor { user_id: UserId, rank: u8 },
    /// 团队等级成员
    TeamLevel { user_id: UserId, level: u8 },
    /// 结算单本身
    Settlement { settlement_id: SettlementId },
    /// 结算单沿推荐链的一跳
    SettlementHop { settlement_id: SettlementId, ancestor: UserId, hop: u16 },
    /// 价格变动中的某用户
    PriceChange { change_id: PriceChangeId, user_id: UserId },
    /// 用户
    User { user_id: UserId },
}

/// 入账效果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "effect", rename_all = "snake_case"))]
pub enum Effect {
    /// 入账（点位或余额）
    Credit { amount: Amount, secondary: Amount, stopped: bool },
    /// 扣减
    Debit { amount: Amount },
    /// VIP 等级变化
    VipChanged { from: u8, to: u8 },
    /// 团队等级抬升
    LevelRaised { from: u8, to: u8 },
}

/// 已生效的单元
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Applied {
    pub unit: UnitRef,
    pub user_id: UserId,
    pub effect: Effect,
}

/// 跳过原因
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "reason", content = "detail", rename_all = "snake_case"))]
pub enum SkipReason {
    /// 金额截断为 0
    ZeroAmount,
    /// 没有运行中点位
    NoPlacement,
    /// 点位已出局
    AlreadyStopped,
    /// 层级门槛未满足
    DepthGated,
    /// 余额低于门槛
    BalanceBelowFloor,
    /// 关联记录缺失
    LookupMiss,
    /// VIP 已锁定
    Locked,
    /// 已处理过（结算单已结算、价格变动已确认）
    AlreadyProcessed,
    /// 单元事务失败并已回滚
    TransactionFailed(String),
}

/// 被跳过的单元
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Skipped {
    pub unit: UnitRef,
    pub reason: SkipReason,
}

/// 单元处理结果
pub type UnitOutcome = Result<Applied, Skipped>;

/// 运行报告
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunReport {
    pub pass: PassKind,
    pub applied: Vec<Applied>,
    pub skipped: Vec<Skipped>,
}

impl RunReport {
    pub fn new(pass: PassKind) -> Self { Self { pass, applied: Vec::new(), skipped: Vec::new() } }

    pub fn record(&mut self, outcome: UnitOutcome) {
        match outcome {
            Ok(applied) => self.applied.push(applied),
            Err(skipped) => self.skipped.push(skipped),
        }
    }

    pub fn skip(&mut self, unit: UnitRef, reason: SkipReason) {
        debug!(pass = self.pass.as_str(), ?unit, ?reason, "单元跳过");
        self.skipped.push(Skipped { unit, reason });
    }

    /// 本次运行的入账总额
    pub fn total_credited(&self) -> Amount {
        self.applied
            .iter()
            .map(|a| match a.effect {
                Effect::Credit { amount, .. } => amount,
                _ => 0,
            })
            .sum()
    }

    /// 本次运行中出局的点位数
    pub fn stopped_count(&self) -> usize {
        self.applied
            .iter()
            .filter(|a| matches!(a.effect, Effect::Credit { stopped: true, .. }))
            .count()
    }

    /// 某用户在本次运行中的入账总额
    pub fn credited_to(&self, user_id: UserId) -> Amount {
        self.applied
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| match a.effect {
                Effect::Credit { amount, .. } => amount,
                _ => 0,
            })
            .sum()
    }

    pub fn skipped_with(&self, reason: &SkipReason) -> usize {
        self.skipped.iter().filter(|s| &s.reason == reason).count()
    }

    pub fn log_summary(&self) {
        info!(
            pass = self.pass.as_str(),
            applied = self.applied.len(),
            skipped = self.skipped.len(),
            credited = self.total_credited(),
            stopped = self.stopped_count(),
            "批处理完成"
        );
    }
}
