//! 团队等级
//!
//! 复核每个用户的团队等级（伞下小区业绩），并把昨日新增点位的出局容量折算成分红池，
//! 按等级均分后计入用户最新的运行中点位。

use std::collections::BTreeSet;

use base_types::{Amount, MICRO_UNIT, UserId, mul_div};
use tracing::{debug, info, warn};

use crate::domain::entity::{Location, RewardReason, RewardSource, UserArea};
use crate::domain::repository::LedgerStore;
use crate::domain::service::capacity::{Secondary, SlotCredit};
use crate::domain::service::engine::{EngineError, RewardEngine};
use crate::domain::service::rates::TeamLevelRates;
use crate::domain::service::report::{Applied, Effect, PassKind, RunReport, SkipReason, UnitRef};

/// 团队等级数
pub const TEAM_LEVELS: usize = 4;

/// 小区业绩：各直推分支业绩之和减去最大分支
pub fn area_amount(children: &[UserArea]) -> Amount {
    let total: Amount = children.iter().map(UserArea::branch_amount).sum();
    let max = children.iter().map(UserArea::branch_amount).max().unwrap_or(0);
    total - max
}

/// 按门槛（整单位）评定等级，未配置的门槛不生效
pub fn level_for(area_amount: Amount, thresholds: &[Amount; TEAM_LEVELS]) -> u8 {
    thresholds
        .iter()
        .enumerate()
        .filter(|(_, t)| **t > 0 && area_amount >= **t * MICRO_UNIT)
        .map(|(i, _)| i as u8 + 1)
        .max()
        .unwrap_or(0)
}

/// 分红池（整单位）：Σ current_max * 100 / out_rate
pub fn dividend_pool(placements: &[Location]) -> Amount {
    let raw: Amount = placements.iter().map(|l| mul_div(l.current_max, 100, l.out_rate)).sum();
    raw / MICRO_UNIT
}

impl<S> RewardEngine<S>
where
    S: LedgerStore,
{
    /// 团队等级复核与分红
    pub fn run_team_level_reward(&mut self) -> Result<RunReport, EngineError> {
        let rates = TeamLevelRates::load(&self.store).map_err(EngineError::Config)?;
        let mut report = RunReport::new(PassKind::TeamLevel);

        let yesterday = self
            .store
            .list_created_on(self.ctx.yesterday(), self.ctx.utc_offset_hours)
            .map_err(EngineError::Snapshot)?;
        let pool = dividend_pool(&yesterday);
        if pool <= 0 {
            info!("昨日无新增容量，团队等级分红跳过");
            report.log_summary();
            return Ok(report);
        }

        let users = self.store.list_user_infos().map_err(EngineError::Snapshot)?;
        let mut levels: [BTreeSet<UserId>; TEAM_LEVELS] = Default::default();
        for info in &users {
            let level = self.recheck_team_level(info.user_id, &rates, &mut report);
            for k in 0..(level as usize).min(TEAM_LEVELS) {
                levels[k].insert(info.user_id);
            }
        }

        for (idx, members) in levels.iter().enumerate() {
            if members.is_empty() {
                continue;
            }
            let per_user = pool * rates.rates[idx] / 100 / members.len() as Amount * MICRO_UNIT;
            let level = idx as u8 + 1;
            if per_user <= 0 {
                debug!(level, "团队等级份额为 0");
                continue;
            }
            info!(level, members = members.len(), per_user, "团队等级分红发放");

            for user_id in members {
                let unit = UnitRef::TeamLevel { user_id: *user_id, level };
                let target = match self.store.latest_running_by_user(*user_id) {
                    Ok(Some(loc)) => loc,
                    Ok(None) => {
                        report.skip(unit, SkipReason::NoPlacement);
                        continue;
                    }
                    Err(e) => {
                        warn!(user_id = %user_id, error = %e, "点位读取失败");
                        report.skip(unit, SkipReason::LookupMiss);
                        continue;
                    }
                };
                let outcome = self.credit_slot(
                    unit,
                    SlotCredit {
                        location_id: target.id,
                        amount: per_user,
                        reason: RewardReason::TeamLevel { level },
                        source: RewardSource::None,
                        price: rates.price,
                        secondary: Secondary::Priced,
                        last_level: None,
                    },
                );
                report.record(outcome);
            }
        }

        report.log_summary();
        Ok(report)
    }

    /// 复核单个用户的团队等级；等级只升不降，计算结果更高时写回
    fn recheck_team_level(
        &mut self,
        user_id: UserId,
        rates: &TeamLevelRates,
        report: &mut RunReport,
    ) -> u8 {
        let stored = match self.store.get_user_area(user_id) {
            Ok(area) => area.map(|a| a.level).unwrap_or(0),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "区域聚合读取失败");
                return 0;
            }
        };

        let children = match self
            .store
            .direct_children(user_id)
            .and_then(|ids| self.store.get_user_areas(&ids))
        {
            Ok(children) => children,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "直推区域聚合读取失败");
                return stored;
            }
        };
        let computed = level_for(area_amount(&children), &rates.thresholds);
        if computed <= stored {
            return stored;
        }

        let unit = UnitRef::TeamLevel { user_id, level: computed };
        match self.store.run_in_transaction(|store| store.raise_user_area_level(user_id, computed)) {
            Ok(()) => {
                report.record(Ok(Applied {
                    unit,
                    user_id,
                    effect: Effect::LevelRaised { from: stored, to: computed },
                }));
                computed
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "团队等级写回失败");
                report.skip(unit, SkipReason::TransactionFailed(e.to_string()));
                stored
            }
        }
    }
}
