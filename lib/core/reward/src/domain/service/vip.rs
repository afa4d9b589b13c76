//! VIP 复核
//!
//! 按自身余额、团队业绩、历史直推人数以及各直推分支中的 VIP 分布，
//! 自上而下（6 到 1）取第一个满足的等级。锁定的用户不参与。

use std::collections::HashSet;

use base_types::{Amount, MICRO_UNIT};
use tracing::{info, warn};

use crate::domain::entity::UserInfo;
use crate::domain::repository::{LedgerStore, RepoError};
use crate::domain::service::engine::{EngineError, RewardEngine};
use crate::domain::service::rates::VipThresholds;
use crate::domain::service::report::{Applied, Effect, PassKind, RunReport, SkipReason, UnitRef};

/// VIP 2 及以上要求的历史直推人数
pub const MIN_HISTORY_RECOMMEND: i64 = 5;

/// 高等级要求的合格分支数
pub const MIN_QUALIFYING_BRANCHES: usize = 2;

/// 复核所需的用户画像（金额均为整单位）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VipProfile {
    pub own_balance: Amount,
    pub team_balance: Amount,
    pub history_recommend: i64,
    /// 下标 0..=3：含 VIP 2/3/4/5 用户的直推分支数
    pub branches_with_vip: [usize; 4],
}

impl VipProfile {
    fn branches_holding(&self, vip: u8) -> usize {
        match vip {
            2..=5 => self.branches_with_vip[(vip - 2) as usize],
            _ => 0,
        }
    }
}

/// 评定 VIP 等级
///
/// 等级 N（3..=6）要求：团队业绩 ≥ vip_{N-1}_balance_team、至少两条直推分支含 VIP N-1、
/// 历史直推 ≥ 5、自身余额 ≥ vip_{N-1}_balance；等级 2 不看分支；等级 1 只看自身余额。
pub fn assess_vip(profile: &VipProfile, thresholds: &VipThresholds) -> u8 {
    for tier in (3..=6u8).rev() {
        let idx = (tier - 1) as usize;
        if profile.team_balance >= thresholds.team_balances[idx - 1]
            && profile.branches_holding(tier - 1) >= MIN_QUALIFYING_BRANCHES
            && profile.history_recommend >= MIN_HISTORY_RECOMMEND
            && profile.own_balance >= thresholds.balances[idx]
        {
            return tier;
        }
    }
    if profile.team_balance >= thresholds.team_balances[0]
        && profile.history_recommend >= MIN_HISTORY_RECOMMEND
        && profile.own_balance >= thresholds.balances[1]
    {
        return 2;
    }
    if profile.own_balance >= thresholds.balances[0] {
        return 1;
    }
    0
}

impl<S> RewardEngine<S>
where
    S: LedgerStore,
{
    /// 复核全部未锁定用户的 VIP 等级
    pub fn run_vip_recheck(&mut self) -> Result<RunReport, EngineError> {
        let thresholds = VipThresholds::load(&self.store).map_err(EngineError::Config)?;
        let users = self.store.list_user_infos().map_err(EngineError::Snapshot)?;
        let mut report = RunReport::new(PassKind::VipRecheck);

        for info in &users {
            let unit = UnitRef::User { user_id: info.user_id };
            if info.lock_vip {
                report.skip(unit, SkipReason::Locked);
                continue;
            }

            let profile = match self.vip_profile(info) {
                Ok(Some(profile)) => profile,
                Ok(None) => {
                    report.skip(unit, SkipReason::LookupMiss);
                    continue;
                }
                Err(e) => {
                    warn!(user_id = %info.user_id, error = %e, "VIP 画像读取失败");
                    report.skip(unit, SkipReason::LookupMiss);
                    continue;
                }
            };

            let vip = assess_vip(&profile, &thresholds);
            if vip == info.vip {
                continue;
            }

            let user_id = info.user_id;
            match self.store.run_in_transaction(|store| store.update_vip(user_id, vip)) {
                Ok(()) => {
                    info!(user_id = %user_id, from = info.vip, to = vip, "VIP 等级变更");
                    report.record(Ok(Applied {
                        unit,
                        user_id,
                        effect: Effect::VipChanged { from: info.vip, to: vip },
                    }));
                }
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "VIP 写回失败，已回滚");
                    report.skip(unit, SkipReason::TransactionFailed(e.to_string()));
                }
            }
        }

        report.log_summary();
        Ok(report)
    }

    fn vip_profile(&self, info: &UserInfo) -> Result<Option<VipProfile>, RepoError> {
        if self.store.get_recommend(info.user_id)?.is_none() {
            return Ok(None);
        }
        let Some(balance) = self.store.get_balance(info.user_id)? else {
            return Ok(None);
        };

        // 每条直推分支（直推本人 + 其伞下）里出现过哪些 VIP 等级
        let mut branches_with_vip = [0usize; 4];
        for child in self.store.direct_children(info.user_id)? {
            let mut members = self.store.descendants(child)?;
            members.push(child);
            let mut seen: HashSet<u8> = HashSet::new();
            for member in members {
                if let Some(member_info) = self.store.get_user_info(member)? {
                    seen.insert(member_info.vip);
                }
            }
            for vip in 2..=5u8 {
                if seen.contains(&vip) {
                    branches_with_vip[(vip - 2) as usize] += 1;
                }
            }
        }

        Ok(Some(VipProfile {
            own_balance: balance.balance_usdt / MICRO_UNIT,
            team_balance: info.team_balance / MICRO_UNIT,
            history_recommend: info.history_recommend,
            branches_with_vip,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> VipThresholds {
        VipThresholds {
            balances: [10, 100, 200, 300, 400, 500],
            team_balances: [1_000, 2_000, 3_000, 4_000, 5_000],
        }
    }

    #[test]
    fn highest_satisfied_tier_wins() {
        let profile = VipProfile {
            own_balance: 350,
            team_balance: 3_500,
            history_recommend: 6,
            branches_with_vip: [3, 2, 0, 0],
        };
        assert_eq!(assess_vip(&profile, &thresholds()), 4);
    }

    #[test]
    fn one_qualifying_branch_is_not_enough() {
        let profile = VipProfile {
            own_balance: 350,
            team_balance: 3_500,
            history_recommend: 6,
            branches_with_vip: [1, 1, 0, 0],
        };
        assert_eq!(assess_vip(&profile, &thresholds()), 2);
    }

    #[test]
    fn low_balance_falls_to_tier_one_or_zero() {
        let mut profile = VipProfile { own_balance: 50, ..Default::default() };
        assert_eq!(assess_vip(&profile, &thresholds()), 1);
        profile.own_balance = 5;
        assert_eq!(assess_vip(&profile, &thresholds()), 0);
    }
}
