//! BDD测试 - 价格变动重估
//!
//! 次级币价格上涨时按持仓差额补入点位（补满即出局并对账），下跌时从点位扣回；
//! 每条价格变动只处理一次，新价格在重估前写入配置。

use base_types::{LocationId, MICRO_UNIT, PriceChangeId, Timestamp, UserId};
use reward::{
    Branch, Effect, InMemoryStore, LedgerTables, Location, LocationStatus, PriceChange,
    RewardEngine, RewardReason, RunContext, SkipReason, UserInfo,
};

fn now() -> Timestamp { Timestamp::from_millis(1_760_061_600_000) }

fn change(id: u64, origin: i64, price: i64) -> PriceChange {
    PriceChange { id: PriceChangeId(id), origin, price, processed: false, created_at: now() }
}

/// 用户 1 持有 1000 次级币，名下一个空点位
fn holder() -> LedgerTables {
    let mut tables = LedgerTables::default();
    tables.set_config("b_price", 100);
    tables.set_config("b_price_base", 100);
    tables.set_config("exchange_rate", 0);
    tables.insert_user(UserInfo::new(UserId(1)), vec![]);
    tables.set_balance(UserId(1), 0, 1_000 * MICRO_UNIT);
    tables.insert_location(Location::new(
        LocationId(1),
        UserId(1),
        1_000 * MICRO_UNIT,
        3_000 * MICRO_UNIT,
        now().plus_days(-3),
    ));
    tables
}

#[cfg(test)]
mod price_change_flow {
    use super::*;

    #[test]
    fn scenario_rise_then_fall_returns_to_start() {
        // Given: 价格 100 → 120
        let mut tables = holder();
        tables.push_price_change(change(1, 100, 120));
        let mut engine = RewardEngine::new(InMemoryStore::new(tables), RunContext::new(now(), 8));

        // When: 处理上涨
        let up = engine.run_price_change().unwrap();

        // Then: 补入 1000 * (120 - 100) / 100 = 200 单位
        assert_eq!(up.applied.len(), 1);
        assert_eq!(
            up.applied[0].effect,
            Effect::Credit { amount: 200 * MICRO_UNIT, secondary: 0, stopped: false }
        );
        let state = engine.store().state();
        assert_eq!(state.location(LocationId(1)).unwrap().current, 200 * MICRO_UNIT);
        assert_eq!(state.config("b_price"), Some("120"));
        assert!(state.price_change(PriceChangeId(1)).unwrap().processed);

        // When: 价格回落 120 → 100
        engine.store_mut().state_mut().push_price_change(change(2, 120, 100));
        let down = engine.run_price_change().unwrap();

        // Then: 扣回同样的金额，流水为负数
        assert_eq!(down.applied[0].effect, Effect::Debit { amount: 200 * MICRO_UNIT });
        let state = engine.store().state();
        assert_eq!(state.location(LocationId(1)).unwrap().current, 0);
        assert_eq!(state.config("b_price"), Some("100"));

        let reasons: Vec<_> = state.rewards().iter().map(|r| (r.reason, r.amount)).collect();
        assert_eq!(
            reasons,
            vec![
                (RewardReason::PriceChangeUp, 200 * MICRO_UNIT),
                (RewardReason::PriceChangeDown, -200 * MICRO_UNIT),
            ]
        );
    }

    #[test]
    fn scenario_retrigger_finds_nothing_pending() {
        let mut tables = holder();
        tables.push_price_change(change(1, 100, 120));
        let mut engine = RewardEngine::new(InMemoryStore::new(tables), RunContext::new(now(), 8));

        engine.run_price_change().unwrap();
        let again = engine.run_price_change().unwrap();

        assert!(again.applied.is_empty());
        assert!(again.skipped.is_empty());
        assert_eq!(engine.store().state().rewards().len(), 1);
    }

    #[test]
    fn scenario_rise_that_fills_the_slot_stops_and_reconciles() {
        // Given: 点位安置在用户 2 的第一条线下，已累计 2900 / 3000，
        //        已兑换容量 2500，兑换手续费 10%
        let mut tables = holder();
        tables.set_config("exchange_rate", 10);
        tables.insert_user(UserInfo::new(UserId(2)), vec![]);
        tables.insert_location(
            Location::new(
                LocationId(2),
                UserId(2),
                1_000 * MICRO_UNIT,
                1_000_000 * MICRO_UNIT,
                now().plus_days(-30),
            )
            .with_totals(5_000, 0, 0),
        );
        let mut loc = tables
            .location(LocationId(1))
            .unwrap()
            .clone()
            .placed_under(LocationId(2), Branch::One);
        loc.current = 2_900 * MICRO_UNIT;
        loc.current_max_new = 2_500 * MICRO_UNIT;
        tables.insert_location(loc);
        tables.push_price_change(change(1, 100, 120));
        let mut engine = RewardEngine::new(InMemoryStore::new(tables), RunContext::new(now(), 8));

        // When: 上涨应补 200，剩余容量只有 100
        let report = engine.run_price_change().unwrap();

        // Then: 补满出局
        assert_eq!(
            report.applied[0].effect,
            Effect::Credit { amount: 100 * MICRO_UNIT, secondary: 0, stopped: true }
        );
        let state = engine.store().state();
        let loc = state.location(LocationId(1)).unwrap();
        assert_eq!(loc.status, LocationStatus::Stopped);
        assert_eq!(loc.current, loc.current_max);
        assert_eq!(loc.current_max_new, loc.current_max);
        assert_eq!(loc.stop_date, Some(now()));

        // 未兑换的 500 扣 10% 手续费后转入余额
        let reasons: Vec<_> = state.rewards().iter().map(|r| (r.reason, r.amount)).collect();
        assert_eq!(
            reasons,
            vec![
                (RewardReason::PriceChangeUp, 100 * MICRO_UNIT),
                (RewardReason::Exchange, 450 * MICRO_UNIT),
            ]
        );
        assert_eq!(state.balance(UserId(1)).unwrap().balance_usdt, 450 * MICRO_UNIT);

        // 上级第一条线扣减本金 1000
        assert_eq!(state.location(LocationId(2)).unwrap().total, 4_000);
    }

    #[test]
    fn scenario_fall_never_debits_below_zero() {
        // Given: 点位只累计了 50，价格从 100 跌到 50（应扣 500）
        let mut tables = holder();
        let mut loc = tables.location(LocationId(1)).unwrap().clone();
        loc.current = 50 * MICRO_UNIT;
        tables.insert_location(loc);
        tables.push_price_change(change(1, 100, 50));
        let mut engine = RewardEngine::new(InMemoryStore::new(tables), RunContext::new(now(), 8));

        let report = engine.run_price_change().unwrap();

        assert_eq!(report.applied[0].effect, Effect::Debit { amount: 50 * MICRO_UNIT });
        assert_eq!(engine.store().state().location(LocationId(1)).unwrap().current, 0);
    }

    #[test]
    fn scenario_user_without_placement_is_skipped() {
        let mut tables = holder();
        tables.insert_user(UserInfo::new(UserId(2)), vec![UserId(1)]);
        tables.set_balance(UserId(2), 0, 500 * MICRO_UNIT);
        tables.push_price_change(change(1, 100, 110));
        let mut engine = RewardEngine::new(InMemoryStore::new(tables), RunContext::new(now(), 8));

        let report = engine.run_price_change().unwrap();

        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.skipped_with(&SkipReason::NoPlacement), 1);
    }
}
