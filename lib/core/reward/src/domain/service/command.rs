//! 批处理命令
//!
//! 外部调度器按命令触发各批处理任务

use crate::domain::repository::LedgerStore;
use crate::domain::service::engine::{EngineError, RewardEngine};
use crate::domain::service::report::RunReport;

/// 批处理命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardCommand {
    /// 每日点位收益 + 推荐佣金
    DailyLocation,
    /// 区域分红 + 全球前四
    Area,
    /// 团队等级分红
    TeamLevel,
    /// 提现/交易结算分成
    Settlement,
    /// 价格变动重估
    PriceChange,
    /// VIP 复核
    VipRecheck,
}

impl RewardCommand {
    /// 全量运行顺序：先确认价格，再发放收益，最后复核等级
    pub const RUN_ALL: [RewardCommand; 6] = [
        RewardCommand::PriceChange,
        RewardCommand::DailyLocation,
        RewardCommand::Area,
        RewardCommand::TeamLevel,
        RewardCommand::Settlement,
        RewardCommand::VipRecheck,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            RewardCommand::DailyLocation => "daily-location",
            RewardCommand::Area => "area",
            RewardCommand::TeamLevel => "team-level",
            RewardCommand::Settlement => "settlements",
            RewardCommand::PriceChange => "price-change",
            RewardCommand::VipRecheck => "vip-check",
        }
    }
}

/// 命令处理器
pub trait RewardCommandHandler {
    /// 处理命令
    fn handle(&mut self, command: RewardCommand) -> Result<RunReport, EngineError>;

    /// 处理器名称
    fn handler_name(&self) -> &'static str;
}

impl<S> RewardCommandHandler for RewardEngine<S>
where
    S: LedgerStore,
{
    fn handle(&mut self, command: RewardCommand) -> Result<RunReport, EngineError> {
        match command {
            RewardCommand::DailyLocation => self.run_daily_location_reward(),
            RewardCommand::Area => self.run_area_reward(),
            RewardCommand::TeamLevel => self.run_team_level_reward(),
            RewardCommand::Settlement => self.run_settlement_commission(),
            RewardCommand::PriceChange => self.run_price_change(),
            RewardCommand::VipRecheck => self.run_vip_recheck(),
        }
    }

    fn handler_name(&self) -> &'static str { "RewardEngine" }
}
