//! BDD测试 - 区域分红与团队等级分红
//!
//! 两类分红都以昨日新增业绩为池子：
//! - 区域分红按点位的小区业绩分档，同档平分
//! - 团队等级按直推区域聚合评级，等级一经达到不再回落

use base_types::{LocationId, MICRO_UNIT, Timestamp, UserId};
use reward::{
    Effect, InMemoryStore, LedgerTables, Location, RewardEngine, RewardReason, RunContext,
    UserArea, UserInfo,
};

/// 业务日（UTC+8）上午十点
fn now() -> Timestamp { Timestamp::from_millis(1_760_061_600_000) }

fn priced() -> LedgerTables {
    let mut tables = LedgerTables::default();
    tables.set_config("b_price", 100);
    tables.set_config("b_price_base", 100);
    tables
}

fn engine(tables: LedgerTables) -> RewardEngine<InMemoryStore> {
    RewardEngine::new(InMemoryStore::new(tables), RunContext::new(now(), 8))
}

#[cfg(test)]
mod area_dividend {
    use super::*;

    fn ledger() -> LedgerTables {
        let mut tables = priced();
        tables.set_config("area_one", 500);
        tables.set_config("area_num_one", 10);
        tables.set_config("total", 100);
        tables.set_config("one", 40);

        tables.insert_user(UserInfo::new(UserId(1)), vec![]);
        tables.insert_user(UserInfo::new(UserId(5)), vec![UserId(1)]);
        // 老点位：三条线 1000 / 600 / 0，小区 600
        tables.insert_location(
            Location::new(
                LocationId(1),
                UserId(1),
                1_000 * MICRO_UNIT,
                1_000_000 * MICRO_UNIT,
                now().plus_days(-30),
            )
            .with_totals(1_000, 600, 0),
        );
        // 昨日新增 2000
        tables.insert_location(Location::new(
            LocationId(2),
            UserId(5),
            2_000 * MICRO_UNIT,
            6_000 * MICRO_UNIT,
            now().plus_days(-1),
        ));
        tables
    }

    #[test]
    fn scenario_threshold_member_is_paid_and_remembered() {
        let mut engine = engine(ledger());

        // When
        engine.run_area_reward().unwrap();

        // Then: 2000 单位 / 1000 * 10，仅一个成员
        let state = engine.store().state();
        let area: Vec<_> = state
            .rewards()
            .iter()
            .filter(|r| r.reason == RewardReason::Area { tier: 1 })
            .collect();
        assert_eq!(area.len(), 1);
        assert_eq!(area[0].location_id, Some(LocationId(1)));
        assert_eq!(area[0].amount, 2_000_000);
        assert_eq!(state.location(LocationId(1)).unwrap().last_level, 1);
        assert_eq!(state.location(LocationId(2)).unwrap().current, 0);
    }

    #[test]
    fn scenario_top_sponsor_takes_first_rank() {
        let mut engine = engine(ledger());

        let report = engine.run_area_reward().unwrap();

        // 池子 = 2000 单位 / 100 / 100 * 70 * 100，第一名拿 40%
        let top = report
            .applied
            .iter()
            .find(|a| matches!(a.unit, reward::UnitRef::TopSponsor { rank: 1, .. }))
            .unwrap();
        assert_eq!(top.user_id, UserId(1));
        assert_eq!(top.effect, Effect::Credit { amount: 56_000_000, secondary: 0, stopped: false });
        let balance = engine.store().state().balance(UserId(1)).unwrap();
        assert_eq!(balance.balance_usdt, 56_000_000);
        assert_eq!(balance.balance_secondary, 2_000_000);
    }

    #[test]
    fn scenario_no_volume_no_dividend() {
        let mut tables = ledger();
        let mut fresh = tables.location(LocationId(2)).unwrap().clone();
        fresh.created_at = now().plus_days(-5);
        tables.insert_location(fresh);
        let mut engine = engine(tables);

        let report = engine.run_area_reward().unwrap();

        assert!(report.applied.is_empty());
        assert!(engine.store().state().rewards().is_empty());
    }
}

#[cfg(test)]
mod team_level_dividend {
    use super::*;

    fn ledger() -> LedgerTables {
        let mut tables = priced();
        tables.set_config("recommend_area_one", 1_000);
        tables.set_config("recommend_area_two", 2_000);
        tables.set_config("recommend_area_one_rate", 10);

        tables.insert_user(UserInfo::new(UserId(1)), vec![]);
        for (child, amount) in [(2, 1_000), (3, 600), (4, 500)] {
            tables.insert_user(UserInfo::new(UserId(child)), vec![UserId(1)]);
            tables.set_area(UserArea {
                user_id: UserId(child),
                amount: amount * MICRO_UNIT,
                self_amount: 0,
                level: 0,
            });
        }
        tables.insert_location(Location::new(
            LocationId(1),
            UserId(1),
            1_000 * MICRO_UNIT,
            1_000_000 * MICRO_UNIT,
            now().plus_days(-30),
        ));
        // 昨日新增：上限 3000、出局倍率 300%，贡献 1000 单位池子
        let mut fresh = Location::new(
            LocationId(2),
            UserId(4),
            1_000 * MICRO_UNIT,
            3_000 * MICRO_UNIT,
            now().plus_days(-1),
        );
        fresh.out_rate = 300;
        tables.insert_location(fresh);
        tables
    }

    #[test]
    fn scenario_level_is_reached_and_dividend_paid() {
        let mut engine = engine(ledger());

        // When
        let report = engine.run_team_level_reward().unwrap();

        // Then: 小区合计 600 + 500 = 1100 ≥ 1000，达到 1 级
        assert!(report
            .applied
            .iter()
            .any(|a| a.user_id == UserId(1) && a.effect == Effect::LevelRaised { from: 0, to: 1 }));
        assert_eq!(engine.store().state().area(UserId(1)).unwrap().level, 1);

        // 池子 1000 * 10% / 1 人 = 100 单位，记入最新运行点位
        let paid: Vec<_> = engine
            .store()
            .state()
            .rewards()
            .iter()
            .filter(|r| r.reason == RewardReason::TeamLevel { level: 1 })
            .cloned()
            .collect();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].user_id, UserId(1));
        assert_eq!(paid[0].amount, 100 * MICRO_UNIT);
        assert_eq!(paid[0].location_id, Some(LocationId(1)));
    }

    #[test]
    fn scenario_level_is_not_raised_twice() {
        let mut engine = engine(ledger());

        engine.run_team_level_reward().unwrap();
        let second = engine.run_team_level_reward().unwrap();

        assert!(!second.applied.iter().any(|a| matches!(a.effect, Effect::LevelRaised { .. })));
        assert_eq!(second.credited_to(UserId(1)), 100 * MICRO_UNIT);
    }

    #[test]
    fn scenario_stored_level_is_promoted_when_area_grows() {
        // Given: 用户 1 已记为 1 级；三条直推各 100 单位，小区合计 200
        let mut tables = priced();
        for (name, (threshold, rate)) in
            ["one", "two", "three", "four"].iter().zip([(10, 10), (20, 10), (30, 10), (40, 10)])
        {
            tables.set_config(&format!("recommend_area_{name}"), threshold);
            tables.set_config(&format!("recommend_area_{name}_rate"), rate);
        }
        tables.insert_user(UserInfo::new(UserId(1)), vec![]);
        tables.set_area(UserArea { user_id: UserId(1), amount: 0, self_amount: 0, level: 1 });
        for child in [2, 3, 4] {
            tables.insert_user(UserInfo::new(UserId(child)), vec![UserId(1)]);
            tables.set_area(UserArea {
                user_id: UserId(child),
                amount: 100 * MICRO_UNIT,
                self_amount: 0,
                level: 0,
            });
        }
        tables.insert_location(Location::new(
            LocationId(1),
            UserId(1),
            1_000 * MICRO_UNIT,
            1_000_000 * MICRO_UNIT,
            now().plus_days(-30),
        ));
        let mut fresh = Location::new(
            LocationId(2),
            UserId(4),
            1_000 * MICRO_UNIT,
            3_000 * MICRO_UNIT,
            now().plus_days(-1),
        );
        fresh.out_rate = 300;
        tables.insert_location(fresh);
        let mut engine = engine(tables);

        // When
        let report = engine.run_team_level_reward().unwrap();

        // Then: 1 级直接升到 4 级
        assert!(report
            .applied
            .iter()
            .any(|a| a.user_id == UserId(1) && a.effect == Effect::LevelRaised { from: 1, to: 4 }));
        assert_eq!(engine.store().state().area(UserId(1)).unwrap().level, 4);

        // 四个等级各分 1000 * 10% = 100 单位
        for level in 1..=4u8 {
            let paid = engine
                .store()
                .state()
                .rewards()
                .iter()
                .filter(|r| r.reason == RewardReason::TeamLevel { level })
                .map(|r| r.amount)
                .sum::<i64>();
            assert_eq!(paid, 100 * MICRO_UNIT);
        }
        assert_eq!(report.credited_to(UserId(1)), 400 * MICRO_UNIT);
    }
}
