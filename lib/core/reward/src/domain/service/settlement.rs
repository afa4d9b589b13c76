//! 结算分成
//!
//! 每笔提现/交易手续费沿推荐链由近及远分配：
//! VIP 级差（更高等级拿差额费率）、平级奖（每个等级一次），以及直推/间推分成。
//! 级差与平级状态只在该跳入账提交后推进。

use base_types::{Amount, MICRO_UNIT, mul_div};
use tracing::{debug, info, warn};

use crate::domain::entity::{RewardReason, RewardSource, Settlement};
use crate::domain::repository::LedgerStore;
use crate::domain::service::engine::{EngineError, RewardEngine};
use crate::domain::service::rates::SettlementRates;
use crate::domain::service::report::{PassKind, RunReport, SkipReason, Skipped, UnitRef};

/// 最高 VIP 等级
pub const MAX_VIP: u8 = 6;

/// 沿推荐链推进的级差状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeState {
    /// 已拿过级差的最高等级
    pub last_vip: u8,
    /// 已分配出去的累计级差费率
    pub team_rate: Amount,
    /// 是否已有人拿过级差
    pub level_ok: bool,
    /// VIP 2..=6 剩余的平级奖次数
    pub peer_counters: [u8; 5],
}

impl Default for CascadeState {
    fn default() -> Self { Self { last_vip: 1, team_rate: 0, level_ok: false, peer_counters: [1; 5] } }
}

impl CascadeState {
    /// 该等级是否拿级差
    pub fn takes_differential(&self, vip: u8, rates: &SettlementRates) -> bool {
        self.last_vip < vip && rates.team_rate_for(MAX_VIP) >= self.team_rate
    }

    /// 该等级是否拿平级奖
    pub fn takes_peer_level(&self, vip: u8) -> bool {
        self.level_ok && self.last_vip == vip && self.peer_counter(vip) > 0
    }

    fn peer_counter(&self, vip: u8) -> u8 {
        match vip {
            2..=MAX_VIP => self.peer_counters[(vip - 2) as usize],
            _ => 0,
        }
    }

    /// 级差入账提交后推进
    pub fn advance_differential(&mut self, vip: u8, rate: Amount) {
        self.last_vip = vip;
        self.team_rate = rate;
        self.level_ok = true;
    }

    /// 平级奖入账提交后推进
    pub fn advance_peer_level(&mut self, vip: u8) {
        if let 2..=MAX_VIP = vip {
            let slot = &mut self.peer_counters[(vip - 2) as usize];
            *slot = slot.saturating_sub(1);
        }
        self.last_vip = vip;
    }
}

impl<S> RewardEngine<S>
where
    S: LedgerStore,
{
    /// 处理全部待结算单
    pub fn run_settlement_commission(&mut self) -> Result<RunReport, EngineError> {
        let rates = SettlementRates::load(&self.store).map_err(EngineError::Config)?;
        let pending = self.store.pending_settlements().map_err(EngineError::Snapshot)?;
        let mut report = RunReport::new(PassKind::Settlement);

        info!(pending = pending.len(), "结算分成开始");
        for settlement in &pending {
            self.settle_one(settlement, &rates, &mut report);
        }

        report.log_summary();
        Ok(report)
    }

    fn settle_one(&mut self, settlement: &Settlement, rates: &SettlementRates, report: &mut RunReport) {
        let unit = UnitRef::Settlement { settlement_id: settlement.id };

        // 先落结算标记，重跑时不会重复分成
        match self.store.run_in_transaction(|store| store.mark_settled(settlement.id)) {
            Ok(true) => {}
            Ok(false) => {
                report.skip(unit, SkipReason::AlreadyProcessed);
                return;
            }
            Err(e) => {
                warn!(settlement_id = %settlement.id, error = %e, "结算标记失败");
                report.skip(unit, SkipReason::TransactionFailed(e.to_string()));
                return;
            }
        }

        let recommend = match self.store.get_recommend(settlement.user_id) {
            Ok(Some(rec)) => rec,
            Ok(None) => {
                report.skip(unit, SkipReason::LookupMiss);
                return;
            }
            Err(e) => {
                warn!(user_id = %settlement.user_id, error = %e, "推荐关系读取失败");
                report.skip(unit, SkipReason::LookupMiss);
                return;
            }
        };

        let reward = mul_div(settlement.amount, rates.withdraw_rate, 100);
        let reward_b = mul_div(settlement.amount_b, rates.withdraw_rate, 100);
        let source = RewardSource::Settlement(settlement.id);
        let mut state = CascadeState::default();

        for (hop, ancestor) in recommend.ancestors_nearest_first().enumerate() {
            let unit = UnitRef::SettlementHop {
                settlement_id: settlement.id,
                ancestor,
                hop: hop as u16,
            };
            let vip = match self.store.get_user_info(ancestor) {
                Ok(Some(info)) => info.vip,
                Ok(None) | Err(_) => {
                    report.skip(unit, SkipReason::LookupMiss);
                    continue;
                }
            };

            if state.last_vip <= vip {
                if state.takes_differential(vip, rates) {
                    let target = rates.team_rate_for(vip);
                    let diff = target - state.team_rate;
                    let outcome = self.credit_balance_unit(
                        unit,
                        ancestor,
                        mul_div(reward, diff, 100),
                        mul_div(reward_b, diff, 100),
                        RewardReason::TeamVip { vip },
                        source,
                    );
                    let committed = !matches!(
                        outcome,
                        Err(Skipped { reason: SkipReason::TransactionFailed(_), .. })
                    );
                    report.record(outcome);
                    if committed {
                        state.advance_differential(vip, target);
                    }
                    continue;
                }

                if state.takes_peer_level(vip) {
                    let outcome = self.credit_balance_unit(
                        unit,
                        ancestor,
                        mul_div(reward, rates.peer_level_rate, 100),
                        mul_div(reward_b, rates.peer_level_rate, 100),
                        RewardReason::PeerLevel { vip },
                        source,
                    );
                    let committed = !matches!(
                        outcome,
                        Err(Skipped { reason: SkipReason::TransactionFailed(_), .. })
                    );
                    report.record(outcome);
                    if committed {
                        state.advance_peer_level(vip);
                    }
                    continue;
                }
            }

            let (rate, reason) = match hop {
                0 => (rates.direct_rate, RewardReason::DirectRecommend),
                1 => (rates.second_rate, RewardReason::SecondRecommend),
                _ => continue,
            };
            let balance = match self.store.get_balance(ancestor) {
                Ok(Some(balance)) => balance,
                Ok(None) | Err(_) => {
                    report.skip(unit, SkipReason::LookupMiss);
                    continue;
                }
            };
            if balance.balance_usdt / MICRO_UNIT < rates.vip_0_balance {
                debug!(user_id = %ancestor, hop, "余额低于门槛，跳过直推分成");
                report.skip(unit, SkipReason::BalanceBelowFloor);
                continue;
            }
            let outcome = self.credit_balance_unit(
                unit,
                ancestor,
                mul_div(reward, rate, 100),
                mul_div(reward_b, rate, 100),
                reason,
                source,
            );
            report.record(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> SettlementRates {
        SettlementRates { team_vip_rates: [10, 20, 30, 40, 50], ..Default::default() }
    }

    #[test]
    fn differential_only_for_strictly_higher_vip() {
        let mut state = CascadeState::default();
        assert!(!state.takes_differential(1, &rates()));
        assert!(state.takes_differential(3, &rates()));
        state.advance_differential(3, 20);
        assert!(!state.takes_differential(3, &rates()));
        assert!(state.takes_differential(5, &rates()));
    }

    #[test]
    fn peer_level_pays_once_per_vip() {
        let mut state = CascadeState::default();
        assert!(!state.takes_peer_level(3));
        state.advance_differential(3, 20);
        assert!(state.takes_peer_level(3));
        state.advance_peer_level(3);
        assert!(!state.takes_peer_level(3));
        assert!(!state.takes_peer_level(4));
    }
}
