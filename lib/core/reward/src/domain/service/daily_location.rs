//! 每日点位收益
//!
//! 第一轮给全部运行中点位发放静态收益；第二轮沿推荐链向上最多八层发放佣金，
//! 佣金基数取上下级本金的较小者。

use std::collections::HashSet;

use base_types::{Amount, LocationId};
use tracing::{info, warn};

use crate::domain::entity::{Location, RewardReason, RewardSource};
use crate::domain::repository::LedgerStore;
use crate::domain::service::capacity::{Secondary, SlotCredit};
use crate::domain::service::engine::{EngineError, RewardEngine};
use crate::domain::service::rates::LocationRates;
use crate::domain::service::report::{Effect, PassKind, RunReport, SkipReason, UnitRef};

/// 推荐佣金最大层数
pub const RECOMMEND_DEPTH: usize = 8;

/// 每个周期的发放次数
pub const TICKS_PER_PERIOD: Amount = 6;

/// 单个点位的每日静态收益
pub fn daily_reward(usdt: Amount, location_reward_rate: Amount) -> Amount {
    usdt / 1000 * location_reward_rate / TICKS_PER_PERIOD
}

/// 第 `level` 层（0 起）的推荐佣金
pub fn recommend_commission(
    child_usdt: Amount,
    ancestor_usdt: Amount,
    location_reward_rate: Amount,
    level_rate: Amount,
) -> Amount {
    let base = child_usdt.min(ancestor_usdt);
    base / 1000 * location_reward_rate / 100 * level_rate / TICKS_PER_PERIOD
}

/// 第 `level` 层是否要求上级拥有足够的点位数（复投次数）
pub fn depth_gate_passed(level: usize, ancestor_slot_count: usize) -> bool {
    level < 2 || ancestor_slot_count >= level
}

impl<S> RewardEngine<S>
where
    S: LedgerStore,
{
    /// 每日点位收益 + 推荐佣金
    pub fn run_daily_location_reward(&mut self) -> Result<RunReport, EngineError> {
        let rates = LocationRates::load(&self.store).map_err(EngineError::Config)?;
        let running = self.store.list_running().map_err(EngineError::Snapshot)?;
        let mut report = RunReport::new(PassKind::DailyLocation);
        let mut stopped_this_run: HashSet<LocationId> = HashSet::new();

        info!(running = running.len(), "每日点位收益开始");

        for loc in &running {
            let unit = UnitRef::Location { location_id: loc.id };
            let reward = daily_reward(loc.usdt, rates.location_reward_rate);
            if reward <= 0 {
                report.skip(unit, SkipReason::ZeroAmount);
                continue;
            }

            let outcome = self.credit_slot(
                unit,
                SlotCredit {
                    location_id: loc.id,
                    amount: reward,
                    reason: RewardReason::Location,
                    source: RewardSource::Location(loc.id),
                    price: rates.price,
                    secondary: Secondary::Priced,
                    last_level: None,
                },
            );
            if let Ok(applied) = &outcome {
                if matches!(applied.effect, Effect::Credit { stopped: true, .. }) {
                    stopped_this_run.insert(loc.id);
                }
            }
            report.record(outcome);
        }

        for loc in &running {
            self.pay_recommend_commission(loc, &rates, &mut stopped_this_run, &mut report);
        }

        report.log_summary();
        Ok(report)
    }

    fn pay_recommend_commission(
        &mut self,
        child: &Location,
        rates: &LocationRates,
        stopped_this_run: &mut HashSet<LocationId>,
        report: &mut RunReport,
    ) {
        let recommend = match self.store.get_recommend(child.user_id) {
            Ok(Some(rec)) => rec,
            Ok(None) => return,
            Err(e) => {
                warn!(user_id = %child.user_id, error = %e, "推荐关系读取失败");
                report.skip(UnitRef::Location { location_id: child.id }, SkipReason::LookupMiss);
                return;
            }
        };

        for level in 0..RECOMMEND_DEPTH {
            let Some(ancestor) = recommend.ancestor_at(level) else {
                break;
            };
            let unit = UnitRef::Commission { child: child.id, ancestor, level: level as u8 + 1 };

            // 每一跳重新读取，看到上一跳已提交的状态
            let slots = match self.store.list_by_user(ancestor) {
                Ok(slots) => slots,
                Err(e) => {
                    warn!(user_id = %ancestor, error = %e, "上级点位读取失败");
                    report.skip(unit, SkipReason::LookupMiss);
                    continue;
                }
            };
            let target = slots
                .iter()
                .find(|s| s.is_running() || stopped_this_run.contains(&s.id));
            let Some(target) = target else {
                report.skip(unit, SkipReason::NoPlacement);
                continue;
            };
            if stopped_this_run.contains(&target.id) {
                report.skip(unit, SkipReason::AlreadyStopped);
                continue;
            }
            if !depth_gate_passed(level, slots.len()) {
                report.skip(unit, SkipReason::DepthGated);
                continue;
            }

            let commission = recommend_commission(
                child.usdt,
                target.usdt,
                rates.location_reward_rate,
                rates.recommend_rates[level],
            );
            if commission <= 0 {
                report.skip(unit, SkipReason::ZeroAmount);
                continue;
            }

            let target_id = target.id;
            let outcome = self.credit_slot(
                unit,
                SlotCredit {
                    location_id: target_id,
                    amount: commission,
                    reason: RewardReason::Recommend { level: level as u8 + 1 },
                    source: RewardSource::Location(child.id),
                    price: rates.price,
                    secondary: Secondary::Priced,
                    last_level: None,
                },
            );
            if let Ok(applied) = &outcome {
                if matches!(applied.effect, Effect::Credit { stopped: true, .. }) {
                    stopped_this_run.insert(target_id);
                }
            }
            report.record(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use base_types::MICRO_UNIT;

    use super::*;

    #[test]
    fn daily_reward_truncates_in_order() {
        // 1000 单位本金，千分之 6，分 6 次
        assert_eq!(daily_reward(1_000 * MICRO_UNIT, 6), 100_000);
        assert_eq!(daily_reward(999, 6), 0);
    }

    #[test]
    fn commission_uses_the_smaller_principal() {
        let weak = recommend_commission(300 * MICRO_UNIT, 1_000 * MICRO_UNIT, 6, 50);
        let swapped = recommend_commission(1_000 * MICRO_UNIT, 300 * MICRO_UNIT, 6, 50);
        assert_eq!(weak, swapped);
        assert_eq!(weak, 300 * MICRO_UNIT / 1000 * 6 / 100 * 50 / 6);
    }

    #[test]
    fn deep_levels_need_reinvestment() {
        assert!(depth_gate_passed(0, 1));
        assert!(depth_gate_passed(1, 1));
        assert!(!depth_gate_passed(2, 1));
        assert!(depth_gate_passed(2, 2));
        assert!(!depth_gate_passed(7, 6));
        assert!(depth_gate_passed(7, 7));
    }
}
