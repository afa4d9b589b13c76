//! 容量规则
//!
//! 所有点位入账共享的填充规则：`current + reward >= current_max` 时只补满剩余容量并出局；
//! 出局时对账未兑换容量，并触发出局级联。

use base_types::{Amount, LocationId, Timestamp, UserId, mul_div};
use tracing::{debug, warn};

use crate::domain::entity::{
    Location, LocationStatus, LocationUpdate, NewReward, RewardReason, RewardSource,
};
use crate::domain::repository::{LedgerStore, RepoError};
use crate::domain::service::engine::RewardEngine;
use crate::domain::service::rates::PriceRates;
use crate::domain::service::report::{Applied, Effect, SkipReason, Skipped, UnitOutcome, UnitRef};
use crate::domain::service::stop_cascade::stop_cascade;

/// 填充结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// 实际入账
    pub credit: Amount,
    /// 是否触顶出局
    pub stops: bool,
}

/// 按容量截断入账
pub fn fill_to_cap(current: Amount, current_max: Amount, reward: Amount) -> Fill {
    if reward <= 0 {
        return Fill { credit: 0, stops: current >= current_max };
    }
    if current + reward >= current_max {
        Fill { credit: (current_max - current).max(0), stops: true }
    } else {
        Fill { credit: reward, stops: false }
    }
}

/// 主币金额折算次级币：`amount * base / price`，价格非正时为 0
pub fn secondary_amount(amount: Amount, b_price_base: Amount, b_price: Amount) -> Amount {
    mul_div(amount, b_price_base, b_price)
}

/// 次级币计算方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Secondary {
    /// 按价格折算，折算为 0 时跳过
    Priced,
    /// 不发次级币
    Omitted,
}

/// 点位入账请求
#[derive(Debug, Clone)]
pub(crate) struct SlotCredit {
    pub location_id: LocationId,
    pub amount: Amount,
    pub reason: RewardReason,
    pub source: RewardSource,
    pub price: PriceRates,
    pub secondary: Secondary,
    /// 同一事务内抬升的区域档位
    pub last_level: Option<u8>,
}

impl<S> RewardEngine<S>
where
    S: LedgerStore,
{
    /// 在单独事务中给一个点位入账
    ///
    /// 事务内重新读取点位；入账、流水、余额、对账与出局级联同进同退
    pub(crate) fn credit_slot(&mut self, unit: UnitRef, req: SlotCredit) -> UnitOutcome {
        let now = self.ctx.now;
        let result = self.store.run_in_transaction(|store| credit_in_tx(store, &req, now));

        match result {
            Ok(Ok((user_id, effect))) => Ok(Applied { unit, user_id, effect }),
            Ok(Err(reason)) => {
                debug!(location_id = %req.location_id, ?reason, "点位入账跳过");
                Err(Skipped { unit, reason })
            }
            Err(e) => {
                warn!(location_id = %req.location_id, error = %e, "点位入账事务失败，已回滚");
                Err(Skipped { unit, reason: SkipReason::TransactionFailed(e.to_string()) })
            }
        }
    }
}

fn credit_in_tx<S>(
    store: &mut S,
    req: &SlotCredit,
    now: Timestamp,
) -> Result<Result<(UserId, Effect), SkipReason>, RepoError>
where
    S: LedgerStore,
{
    let Some(loc) = store.get_by_id(req.location_id)? else {
        return Ok(Err(SkipReason::LookupMiss));
    };
    if !loc.is_running() {
        return Ok(Err(SkipReason::AlreadyStopped));
    }

    // 零额判断作用于截断前的金额；截断后即使折算为 0 也必须出局
    if req.amount <= 0 {
        return Ok(Err(SkipReason::ZeroAmount));
    }
    let price = req.price;
    let priced = |amount: Amount| secondary_amount(amount, price.b_price_base, price.b_price);
    if req.secondary == Secondary::Priced && priced(req.amount) <= 0 {
        return Ok(Err(SkipReason::ZeroAmount));
    }

    let fill = fill_to_cap(loc.current, loc.current_max, req.amount);
    let secondary = match req.secondary {
        Secondary::Priced => priced(fill.credit),
        Secondary::Omitted => 0,
    };
    if fill.credit <= 0 && !fill.stops {
        return Ok(Err(SkipReason::ZeroAmount));
    }

    let unreconciled = if fill.stops { (loc.current_max - loc.current_max_new).max(0) } else { 0 };
    let update = LocationUpdate {
        status: if fill.stops { LocationStatus::Stopped } else { LocationStatus::Running },
        credit: fill.credit,
        max_new_delta: unreconciled,
        secondary_delta: secondary,
        stop_date: fill.stops.then_some(now),
        last_level: req.last_level,
    };
    store.update_capacity_and_status(loc.id, &update)?;

    if fill.credit > 0 {
        store.append_reward(NewReward {
            user_id: loc.user_id,
            amount: fill.credit,
            amount_b: secondary,
            reason: req.reason,
            source: req.source,
            location_id: Some(loc.id),
            created_at: now,
        })?;
        if secondary > 0 {
            store.credit_balance(loc.user_id, 0, secondary)?;
        }
    }

    if fill.stops {
        reconcile_on_stop(store, &loc, unreconciled, req.price.exchange_rate, now)?;
        stop_cascade(store, &loc)?;
    }

    Ok(Ok((loc.user_id, Effect::Credit { amount: fill.credit, secondary, stopped: fill.stops })))
}

impl<S> RewardEngine<S>
where
    S: LedgerStore,
{
    /// 在单独事务中给用户余额入账（不经过点位容量）
    pub(crate) fn credit_balance_unit(
        &mut self,
        unit: UnitRef,
        user_id: UserId,
        amount: Amount,
        amount_b: Amount,
        reason: RewardReason,
        source: RewardSource,
    ) -> UnitOutcome {
        if amount <= 0 && amount_b <= 0 {
            return Err(Skipped { unit, reason: SkipReason::ZeroAmount });
        }
        let (amount, amount_b) = (amount.max(0), amount_b.max(0));
        let now = self.ctx.now;
        let result = self.store.run_in_transaction(|store| {
            store.append_reward(NewReward {
                user_id,
                amount,
                amount_b,
                reason,
                source,
                location_id: None,
                created_at: now,
            })?;
            store.credit_balance(user_id, amount, amount_b)
        });

        match result {
            Ok(()) => Ok(Applied {
                unit,
                user_id,
                effect: Effect::Credit { amount, secondary: amount_b, stopped: false },
            }),
            Err(e) => {
                warn!(user_id = %user_id, ?reason, error = %e, "余额入账事务失败，已回滚");
                Err(Skipped { unit, reason: SkipReason::TransactionFailed(e.to_string()) })
            }
        }
    }
}

/// 出局对账：未兑换容量扣除手续费后转入用户余额
pub(crate) fn reconcile_on_stop<S>(
    store: &mut S,
    loc: &Location,
    unreconciled: Amount,
    exchange_rate: Amount,
    now: Timestamp,
) -> Result<(), RepoError>
where
    S: LedgerStore,
{
    if unreconciled <= 0 {
        return Ok(());
    }
    let fee = mul_div(unreconciled, exchange_rate, 100);
    let net = unreconciled - fee;
    if net <= 0 {
        return Ok(());
    }
    store.append_reward(NewReward {
        user_id: loc.user_id,
        amount: net,
        amount_b: 0,
        reason: RewardReason::Exchange,
        source: RewardSource::Location(loc.id),
        location_id: Some(loc.id),
        created_at: now,
    })?;
    store.credit_balance(loc.user_id, net, 0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_clamps_to_remaining_and_stops() {
        assert_eq!(fill_to_cap(95, 100, 10), Fill { credit: 5, stops: true });
        assert_eq!(fill_to_cap(90, 100, 10), Fill { credit: 10, stops: true });
        assert_eq!(fill_to_cap(10, 100, 10), Fill { credit: 10, stops: false });
    }

    #[test]
    fn non_positive_reward_never_credits() {
        assert_eq!(fill_to_cap(10, 100, 0), Fill { credit: 0, stops: false });
        assert_eq!(fill_to_cap(10, 100, -5), Fill { credit: 0, stops: false });
    }

    #[test]
    fn clamped_remainder_stops_even_when_secondary_rounds_to_zero() {
        use base_types::MICRO_UNIT;

        use crate::adaptor::inbound::in_memory::{InMemoryStore, LedgerTables};
        use crate::domain::entity::UserInfo;
        use crate::domain::service::engine::RunContext;

        let mut tables = LedgerTables::default();
        tables.insert_user(UserInfo::new(UserId(1)), vec![]);
        let mut loc = Location::new(
            LocationId(1),
            UserId(1),
            1_000 * MICRO_UNIT,
            100 * MICRO_UNIT,
            Timestamp::from_millis(0),
        );
        loc.current = 100 * MICRO_UNIT - 1;
        tables.insert_location(loc);
        let mut engine = RewardEngine::new(
            InMemoryStore::new(tables),
            RunContext::new(Timestamp::from_millis(0), 8),
        );

        let applied = engine
            .credit_slot(
                UnitRef::Location { location_id: LocationId(1) },
                SlotCredit {
                    location_id: LocationId(1),
                    amount: 10 * MICRO_UNIT,
                    reason: RewardReason::Location,
                    source: RewardSource::Location(LocationId(1)),
                    price: PriceRates { b_price: 200, b_price_base: 100, exchange_rate: 0 },
                    secondary: Secondary::Priced,
                    last_level: None,
                },
            )
            .unwrap();

        // 剩余 1 个最小单位折算次级币为 0，仍补满并出局
        assert_eq!(applied.effect, Effect::Credit { amount: 1, secondary: 0, stopped: true });
        let loc = engine.store().state().location(LocationId(1)).unwrap();
        assert_eq!(loc.status, LocationStatus::Stopped);
        assert_eq!(loc.current, loc.current_max);
    }

    #[test]
    fn unclamped_zero_secondary_is_skipped() {
        use crate::adaptor::inbound::in_memory::{InMemoryStore, LedgerTables};
        use crate::domain::entity::UserInfo;
        use crate::domain::service::engine::RunContext;

        let mut tables = LedgerTables::default();
        tables.insert_user(UserInfo::new(UserId(1)), vec![]);
        tables.insert_location(Location::new(
            LocationId(1),
            UserId(1),
            1_000,
            1_000_000,
            Timestamp::from_millis(0),
        ));
        let mut engine = RewardEngine::new(
            InMemoryStore::new(tables),
            RunContext::new(Timestamp::from_millis(0), 8),
        );

        let outcome = engine.credit_slot(
            UnitRef::Location { location_id: LocationId(1) },
            SlotCredit {
                location_id: LocationId(1),
                amount: 1,
                reason: RewardReason::Location,
                source: RewardSource::Location(LocationId(1)),
                price: PriceRates { b_price: 200, b_price_base: 100, exchange_rate: 0 },
                secondary: Secondary::Priced,
                last_level: None,
            },
        );

        assert_eq!(outcome.unwrap_err().reason, SkipReason::ZeroAmount);
        assert_eq!(engine.store().state().location(LocationId(1)).unwrap().current, 0);
    }

    #[test]
    fn secondary_uses_base_over_price() {
        assert_eq!(secondary_amount(1_000, 100, 200), 500);
        assert_eq!(secondary_amount(1_000, 100, 0), 0);
    }
}
