//! 区域分红
//!
//! 昨日全网新增本金按五档分别提成，均分给每档的合格点位；
//! 随后按昨日直推新增本金排名，给全网前四的推荐人发放全球池奖励。

use std::collections::HashMap;

use base_types::{Amount, UserId};
use tracing::{debug, info, warn};

use crate::domain::entity::{Location, RewardReason, RewardSource};
use crate::domain::repository::LedgerStore;
use crate::domain::service::capacity::{Secondary, SlotCredit};
use crate::domain::service::engine::{EngineError, RewardEngine};
use crate::domain::service::rates::AreaRates;
use crate::domain::service::report::{PassKind, RunReport, UnitRef};

/// 区域档位数
pub const AREA_TIERS: usize = 5;

/// 全球池名次数
pub const TOP_SPONSOR_RANKS: usize = 4;

/// 点位是否满足第 `tier` 档（1 起）
///
/// 考核业绩达到门槛，或曾经达到过该档。
pub fn qualifies_for_tier(loc: &Location, tier: u8, threshold: Amount) -> bool {
    by_threshold(loc, threshold) || loc.last_level >= tier
}

fn by_threshold(loc: &Location, threshold: Amount) -> bool {
    loc.qualifying_pair() >= threshold
}

/// 全球池：昨日新增 70% + 前日新增 30%，再乘以 `total` 万分比
pub fn top_sponsor_pool(yesterday: Amount, day_before: Amount, total: Amount) -> Amount {
    yesterday / 100 / 100 * 70 * total + day_before / 100 / 100 * 30 * total
}

/// 按新增本金降序排名，同额按用户ID升序
pub fn rank_sponsors(volumes: HashMap<UserId, Amount>) -> Vec<(UserId, Amount)> {
    let mut ranked: Vec<(UserId, Amount)> = volumes.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(TOP_SPONSOR_RANKS);
    ranked
}

impl<S> RewardEngine<S>
where
    S: LedgerStore,
{
    /// 区域分红 + 全球前四推荐奖
    pub fn run_area_reward(&mut self) -> Result<RunReport, EngineError> {
        let rates = AreaRates::load(&self.store).map_err(EngineError::Config)?;
        let mut report = RunReport::new(PassKind::Area);

        let offset = self.ctx.utc_offset_hours;
        let yesterday = self
            .store
            .list_created_on(self.ctx.yesterday(), offset)
            .map_err(EngineError::Snapshot)?;
        let volume: Amount = yesterday.iter().map(|l| l.usdt).sum();
        if volume <= 0 {
            info!("昨日无新增业绩，区域分红跳过");
            report.log_summary();
            return Ok(report);
        }

        for tier in 1..=AREA_TIERS as u8 {
            self.pay_area_tier(tier, volume, &rates, &mut report)?;
        }

        let day_before: Amount = self
            .store
            .list_created_on(self.ctx.day_before_yesterday(), offset)
            .map_err(EngineError::Snapshot)?
            .iter()
            .map(|l| l.usdt)
            .sum();
        self.pay_top_sponsors(&yesterday, volume, day_before, &rates, &mut report);

        report.log_summary();
        Ok(report)
    }

    fn pay_area_tier(
        &mut self,
        tier: u8,
        volume: Amount,
        rates: &AreaRates,
        report: &mut RunReport,
    ) -> Result<(), EngineError> {
        let idx = (tier - 1) as usize;
        let threshold = rates.thresholds[idx];

        // 每档重新读取，上一档已出局的点位不再参与
        let running = self.store.list_running().map_err(EngineError::Snapshot)?;
        let members: Vec<&Location> =
            running.iter().filter(|l| qualifies_for_tier(l, tier, threshold)).collect();
        if members.is_empty() {
            debug!(tier, "区域档位无合格点位");
            return Ok(());
        }

        let share = volume / 1000 * rates.shares[idx] / members.len() as Amount;
        if share <= 0 {
            debug!(tier, members = members.len(), "区域档位份额为 0");
            return Ok(());
        }
        info!(tier, members = members.len(), share, "区域档位发放");

        for loc in members {
            let unit = UnitRef::AreaTier { location_id: loc.id, tier };
            let last_level = (by_threshold(loc, threshold) && loc.last_level < tier).then_some(tier);
            let outcome = self.credit_slot(
                unit,
                SlotCredit {
                    location_id: loc.id,
                    amount: share,
                    reason: RewardReason::Area { tier },
                    source: RewardSource::Location(loc.id),
                    price: rates.price,
                    secondary: Secondary::Priced,
                    last_level,
                },
            );
            report.record(outcome);
        }
        Ok(())
    }

    fn pay_top_sponsors(
        &mut self,
        yesterday: &[Location],
        volume: Amount,
        day_before: Amount,
        rates: &AreaRates,
        report: &mut RunReport,
    ) {
        let pool = top_sponsor_pool(volume, day_before, rates.top_total);

        let mut volumes: HashMap<UserId, Amount> = HashMap::new();
        for loc in yesterday {
            match self.store.get_recommend(loc.user_id) {
                Ok(Some(rec)) => {
                    if let Some(sponsor) = rec.sponsor() {
                        *volumes.entry(sponsor).or_insert(0) += loc.usdt;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(user_id = %loc.user_id, error = %e, "推荐关系读取失败"),
            }
        }

        for (idx, (sponsor, _)) in rank_sponsors(volumes).into_iter().enumerate() {
            let rank = idx as u8 + 1;
            let amount = pool / 100 * rates.top_shares[idx];
            let outcome = self.credit_balance_unit(
                UnitRef::TopSponsor { user_id: sponsor, rank },
                sponsor,
                amount,
                0,
                RewardReason::TopSponsor { rank },
                RewardSource::None,
            );
            report.record(outcome);
        }
    }
}
