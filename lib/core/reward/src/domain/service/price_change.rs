//! 价格变动
//!
//! 次级币价格调整后，按每个用户持有的次级币余额重估其最新运行中点位：
//! 上涨补差（受剩余容量限制，补满即出局），下跌扣减（不低于已累计收益）。

use std::cmp::Ordering;

use base_types::{Amount, PriceChangeId, Timestamp, UserId, mul_div};
use tracing::{info, warn};

use crate::domain::entity::{
    Location, LocationStatus, LocationUpdate, NewReward, PriceChange, RewardReason, RewardSource,
};
use crate::domain::repository::{LedgerStore, RepoError};
use crate::domain::service::capacity::{fill_to_cap, reconcile_on_stop};
use crate::domain::service::engine::{EngineError, RewardEngine};
use crate::domain::service::rates::{PriceRates, RateTable, keys};
use crate::domain::service::report::{
    Applied, Effect, PassKind, RunReport, SkipReason, Skipped, UnitRef,
};
use crate::domain::service::stop_cascade::stop_cascade;

/// 价格变动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revaluation {
    /// 上涨补差
    Rise(Amount),
    /// 下跌扣减
    Fall(Amount),
    /// 无变化
    Flat,
}

impl Revaluation {
    pub fn amount(self) -> Amount {
        match self {
            Revaluation::Rise(a) | Revaluation::Fall(a) => a,
            Revaluation::Flat => 0,
        }
    }
}

/// 次级币余额在新旧价格下的差额
pub fn revalue(
    balance_secondary: Amount,
    base: Amount,
    old_price: Amount,
    new_price: Amount,
) -> Revaluation {
    if base <= 0 {
        return Revaluation::Flat;
    }
    // 先按 base 折算再乘价差，中间量走 i128
    let unit = mul_div(balance_secondary, 100, base);
    let scaled_gap = |gap: Amount| mul_div(unit, gap, 100);
    match new_price.cmp(&old_price) {
        Ordering::Greater => Revaluation::Rise(scaled_gap(new_price.saturating_sub(old_price))),
        Ordering::Less => Revaluation::Fall(scaled_gap(old_price.saturating_sub(new_price))),
        Ordering::Equal => Revaluation::Flat,
    }
}

impl<S> RewardEngine<S>
where
    S: LedgerStore,
{
    /// 处理最早一条未确认的价格变动
    pub fn run_price_change(&mut self) -> Result<RunReport, EngineError> {
        let mut report = RunReport::new(PassKind::PriceChange);
        let Some(change) = self.store.pending_price_change().map_err(EngineError::Config)? else {
            info!("无待处理的价格变动");
            report.log_summary();
            return Ok(report);
        };
        let table = RateTable::load(&self.store, &PriceRates::KEYS).map_err(EngineError::Config)?;
        let rates = PriceRates::from_table(&table);

        // 先确认并写入新价格，重跑时找不到待处理记录
        let new_price = change.price;
        let acked = self.store.run_in_transaction(|store| {
            if !store.mark_price_change_processed(change.id)? {
                return Ok(false);
            }
            store.set_config(keys::B_PRICE, new_price.to_string())?;
            Ok(true)
        });
        match acked {
            Ok(true) => {}
            Ok(false) => {
                report.skip(
                    UnitRef::PriceChange { change_id: change.id, user_id: UserId(0) },
                    SkipReason::AlreadyProcessed,
                );
                return Ok(report);
            }
            Err(e) => return Err(EngineError::Config(e)),
        }

        info!(change_id = %change.id, origin = change.origin, price = change.price, "价格变动确认");
        if change.price <= 0 || change.origin <= 0 || rates.b_price_base <= 0 {
            warn!(change_id = %change.id, "价格或基准价非正，不做重估");
            report.log_summary();
            return Ok(report);
        }

        let users = self.store.list_user_infos().map_err(EngineError::Snapshot)?;
        for info in &users {
            let outcome = self.revalue_user(info.user_id, &change, &rates);
            report.record(outcome);
        }

        report.log_summary();
        Ok(report)
    }

    fn revalue_user(
        &mut self,
        user_id: UserId,
        change: &PriceChange,
        rates: &PriceRates,
    ) -> Result<Applied, Skipped> {
        let unit = UnitRef::PriceChange { change_id: change.id, user_id };
        let skip = |reason| Skipped { unit, reason };

        let balance = match self.store.get_balance(user_id) {
            Ok(Some(b)) => b,
            Ok(None) | Err(_) => return Err(skip(SkipReason::LookupMiss)),
        };
        let delta =
            revalue(balance.balance_secondary, rates.b_price_base, change.origin, change.price);
        if delta.amount() <= 0 {
            return Err(skip(SkipReason::ZeroAmount));
        }

        let now = self.ctx.now;
        let change_id = change.id;
        let exchange_rate = rates.exchange_rate;
        let result = self.store.run_in_transaction(|store| {
            let Some(loc) = store.latest_running_by_user(user_id)? else {
                return Ok(Err(SkipReason::NoPlacement));
            };
            match delta {
                Revaluation::Rise(amount) => {
                    apply_rise(store, &loc, amount, change_id, exchange_rate, now)
                }
                Revaluation::Fall(amount) => apply_fall(store, &loc, amount, change_id, now),
                Revaluation::Flat => Ok(Err(SkipReason::ZeroAmount)),
            }
        });

        match result {
            Ok(Ok(effect)) => Ok(Applied { unit, user_id, effect }),
            Ok(Err(reason)) => Err(skip(reason)),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "价格重估事务失败，已回滚");
                Err(skip(SkipReason::TransactionFailed(e.to_string())))
            }
        }
    }
}

fn apply_rise<S: LedgerStore>(
    store: &mut S,
    loc: &Location,
    amount: Amount,
    change_id: PriceChangeId,
    exchange_rate: Amount,
    now: Timestamp,
) -> Result<Result<Effect, SkipReason>, RepoError> {
    let fill = fill_to_cap(loc.current, loc.current_max, amount);
    if fill.credit <= 0 && !fill.stops {
        return Ok(Err(SkipReason::ZeroAmount));
    }
    let unreconciled = if fill.stops { (loc.current_max - loc.current_max_new).max(0) } else { 0 };
    store.update_capacity_and_status(
        loc.id,
        &LocationUpdate {
            status: if fill.stops { LocationStatus::Stopped } else { LocationStatus::Running },
            credit: fill.credit,
            max_new_delta: unreconciled,
            secondary_delta: 0,
            stop_date: fill.stops.then_some(now),
            last_level: None,
        },
    )?;
    if fill.credit > 0 {
        store.append_reward(NewReward {
            user_id: loc.user_id,
            amount: fill.credit,
            amount_b: 0,
            reason: RewardReason::PriceChangeUp,
            source: RewardSource::PriceChange(change_id),
            location_id: Some(loc.id),
            created_at: now,
        })?;
    }
    if fill.stops {
        reconcile_on_stop(store, loc, unreconciled, exchange_rate, now)?;
        stop_cascade(store, loc)?;
    }
    Ok(Ok(Effect::Credit { amount: fill.credit, secondary: 0, stopped: fill.stops }))
}

fn apply_fall<S: LedgerStore>(
    store: &mut S,
    loc: &Location,
    amount: Amount,
    change_id: PriceChangeId,
    now: Timestamp,
) -> Result<Result<Effect, SkipReason>, RepoError> {
    let debit = amount.min(loc.current);
    if debit <= 0 {
        return Ok(Err(SkipReason::ZeroAmount));
    }
    store.debit_current(loc.id, debit)?;
    store.append_reward(NewReward {
        user_id: loc.user_id,
        amount: -debit,
        amount_b: 0,
        reason: RewardReason::PriceChangeDown,
        source: RewardSource::PriceChange(change_id),
        location_id: Some(loc.id),
        created_at: now,
    })?;
    Ok(Ok(Effect::Debit { amount: debit }))
}
