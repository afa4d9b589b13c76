//! 费率配置
//!
//! 每个批处理任务开始时读取一次配置，解析成类型化的费率组。
//! 缺失或无法解析的值按 0 处理：金额计算自然截断为 0，不会中断整次运行。

use std::collections::HashMap;

use base_types::Amount;
use tracing::warn;

use crate::domain::repository::{ConfigRepository, RepoError};

/// 配置键
pub mod keys {
    pub const LOCATION_REWARD_RATE: &str = "location_reward_rate";
    pub const B_PRICE: &str = "b_price";
    pub const B_PRICE_BASE: &str = "b_price_base";
    pub const EXCHANGE_RATE: &str = "exchange_rate";

    pub const RECOMMEND_RATES: [&str; 8] = [
        "recommend_one_rate",
        "recommend_two_rate",
        "recommend_three_rate",
        "recommend_four_rate",
        "recommend_five_rate",
        "recommend_six_rate",
        "recommend_seven_rate",
        "recommend_eight_rate",
    ];

    pub const AREA_THRESHOLDS: [&str; 5] =
        ["area_one", "area_two", "area_three", "area_four", "area_five"];
    pub const AREA_SHARES: [&str; 5] =
        ["area_num_one", "area_num_two", "area_num_three", "area_num_four", "area_num_five"];
    pub const TOP_SPONSOR_SHARES: [&str; 4] = ["one", "two", "three", "four"];
    pub const TOP_SPONSOR_TOTAL: &str = "total";

    pub const TEAM_LEVEL_THRESHOLDS: [&str; 4] =
        ["recommend_area_one", "recommend_area_two", "recommend_area_three", "recommend_area_four"];
    pub const TEAM_LEVEL_RATES: [&str; 4] = [
        "recommend_area_one_rate",
        "recommend_area_two_rate",
        "recommend_area_three_rate",
        "recommend_area_four_rate",
    ];

    pub const WITHDRAW_RATE: &str = "withdraw_rate";
    pub const WITHDRAW_RECOMMEND_RATE: &str = "withdraw_recommend_rate";
    pub const WITHDRAW_RECOMMEND_SECOND_RATE: &str = "withdraw_recommend_second_rate";
    /// VIP 2..=6 对应的级差费率
    pub const WITHDRAW_TEAM_VIP_RATES: [&str; 5] = [
        "withdraw_team_vip_rate",
        "withdraw_team_vip_second_rate",
        "withdraw_team_vip_third_rate",
        "withdraw_team_vip_fourth_rate",
        "withdraw_team_vip_fifth_rate",
    ];
    pub const WITHDRAW_TEAM_VIP_LEVEL_RATE: &str = "withdraw_team_vip_level_rate";

    /// vip_0_balance ..= vip_5_balance
    pub const VIP_BALANCES: [&str; 6] = [
        "vip_0_balance",
        "vip_1_balance",
        "vip_2_balance",
        "vip_3_balance",
        "vip_4_balance",
        "vip_5_balance",
    ];
    /// vip_1_balance_team ..= vip_5_balance_team
    pub const VIP_TEAM_BALANCES: [&str; 5] = [
        "vip_1_balance_team",
        "vip_2_balance_team",
        "vip_3_balance_team",
        "vip_4_balance_team",
        "vip_5_balance_team",
    ];
}

/// 一次读取的配置快照
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    values: HashMap<String, String>,
}

impl RateTable {
    /// 从配置仓储读取一组键
    pub fn load<C>(repo: &C, keys: &[&str]) -> Result<Self, RepoError>
    where
        C: ConfigRepository + ?Sized,
    {
        let values = repo.get_configs(keys)?;
        for key in keys {
            if !values.contains_key(*key) {
                warn!(key = *key, "配置缺失，按 0 处理");
            }
        }
        Ok(Self { values })
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self { values: pairs.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect() }
    }

    /// 读取整数值；缺失或非法均为 0
    pub fn get(&self, key: &str) -> Amount {
        match self.values.get(key) {
            None => 0,
            Some(raw) => raw.trim().parse::<Amount>().unwrap_or_else(|_| {
                warn!(key, value = raw.as_str(), "配置值非法，按 0 处理");
                0
            }),
        }
    }

    pub fn get_many<const N: usize>(&self, keys: &[&str; N]) -> [Amount; N] {
        keys.map(|k| self.get(k))
    }
}

/// 次级币价格参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceRates {
    pub b_price: Amount,
    pub b_price_base: Amount,
    /// 兑换手续费（百分比）
    pub exchange_rate: Amount,
}

impl PriceRates {
    pub const KEYS: [&'static str; 3] = [keys::B_PRICE, keys::B_PRICE_BASE, keys::EXCHANGE_RATE];

    pub fn from_table(table: &RateTable) -> Self {
        Self {
            b_price: table.get(keys::B_PRICE),
            b_price_base: table.get(keys::B_PRICE_BASE),
            exchange_rate: table.get(keys::EXCHANGE_RATE),
        }
    }
}

/// 每日点位 + 推荐佣金费率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationRates {
    pub location_reward_rate: Amount,
    pub recommend_rates: [Amount; 8],
    pub price: PriceRates,
}

impl LocationRates {
    pub fn load<C: ConfigRepository + ?Sized>(repo: &C) -> Result<Self, RepoError> {
        let mut all: Vec<&str> = vec![keys::LOCATION_REWARD_RATE];
        all.extend_from_slice(&keys::RECOMMEND_RATES);
        all.extend_from_slice(&PriceRates::KEYS);
        let table = RateTable::load(repo, &all)?;
        Ok(Self {
            location_reward_rate: table.get(keys::LOCATION_REWARD_RATE),
            recommend_rates: table.get_many(&keys::RECOMMEND_RATES),
            price: PriceRates::from_table(&table),
        })
    }
}

/// 区域分红 + 前四推荐奖费率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AreaRates {
    pub thresholds: [Amount; 5],
    pub shares: [Amount; 5],
    pub top_shares: [Amount; 4],
    pub top_total: Amount,
    pub price: PriceRates,
}

impl AreaRates {
    pub fn load<C: ConfigRepository + ?Sized>(repo: &C) -> Result<Self, RepoError> {
        let mut all: Vec<&str> = Vec::new();
        all.extend_from_slice(&keys::AREA_THRESHOLDS);
        all.extend_from_slice(&keys::AREA_SHARES);
        all.extend_from_slice(&keys::TOP_SPONSOR_SHARES);
        all.push(keys::TOP_SPONSOR_TOTAL);
        all.extend_from_slice(&PriceRates::KEYS);
        let table = RateTable::load(repo, &all)?;
        Ok(Self {
            thresholds: table.get_many(&keys::AREA_THRESHOLDS),
            shares: table.get_many(&keys::AREA_SHARES),
            top_shares: table.get_many(&keys::TOP_SPONSOR_SHARES),
            top_total: table.get(keys::TOP_SPONSOR_TOTAL),
            price: PriceRates::from_table(&table),
        })
    }
}

/// 团队等级费率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeamLevelRates {
    pub thresholds: [Amount; 4],
    pub rates: [Amount; 4],
    pub price: PriceRates,
}

impl TeamLevelRates {
    pub fn load<C: ConfigRepository + ?Sized>(repo: &C) -> Result<Self, RepoError> {
        let mut all: Vec<&str> = Vec::new();
        all.extend_from_slice(&keys::TEAM_LEVEL_THRESHOLDS);
        all.extend_from_slice(&keys::TEAM_LEVEL_RATES);
        all.extend_from_slice(&PriceRates::KEYS);
        let table = RateTable::load(repo, &all)?;
        Ok(Self {
            thresholds: table.get_many(&keys::TEAM_LEVEL_THRESHOLDS),
            rates: table.get_many(&keys::TEAM_LEVEL_RATES),
            price: PriceRates::from_table(&table),
        })
    }
}

/// 结算分成费率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SettlementRates {
    pub withdraw_rate: Amount,
    pub direct_rate: Amount,
    pub second_rate: Amount,
    /// 下标 0..=4 对应 VIP 2..=6
    pub team_vip_rates: [Amount; 5],
    pub peer_level_rate: Amount,
    /// 直推/间推分成的余额门槛（整单位）
    pub vip_0_balance: Amount,
}

impl SettlementRates {
    pub fn load<C: ConfigRepository + ?Sized>(repo: &C) -> Result<Self, RepoError> {
        let mut all: Vec<&str> = vec![
            keys::WITHDRAW_RATE,
            keys::WITHDRAW_RECOMMEND_RATE,
            keys::WITHDRAW_RECOMMEND_SECOND_RATE,
            keys::WITHDRAW_TEAM_VIP_LEVEL_RATE,
            keys::VIP_BALANCES[0],
        ];
        all.extend_from_slice(&keys::WITHDRAW_TEAM_VIP_RATES);
        let table = RateTable::load(repo, &all)?;
        Ok(Self {
            withdraw_rate: table.get(keys::WITHDRAW_RATE),
            direct_rate: table.get(keys::WITHDRAW_RECOMMEND_RATE),
            second_rate: table.get(keys::WITHDRAW_RECOMMEND_SECOND_RATE),
            team_vip_rates: table.get_many(&keys::WITHDRAW_TEAM_VIP_RATES),
            peer_level_rate: table.get(keys::WITHDRAW_TEAM_VIP_LEVEL_RATE),
            vip_0_balance: table.get(keys::VIP_BALANCES[0]),
        })
    }

    /// VIP 等级对应的级差费率（2..=6 之外为 0）
    pub fn team_rate_for(&self, vip: u8) -> Amount {
        match vip {
            2..=6 => self.team_vip_rates[(vip - 2) as usize],
            _ => 0,
        }
    }
}

/// VIP 复核门槛（整单位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VipThresholds {
    /// vip_0_balance ..= vip_5_balance
    pub balances: [Amount; 6],
    /// vip_1_balance_team ..= vip_5_balance_team
    pub team_balances: [Amount; 5],
}

impl VipThresholds {
    pub fn load<C: ConfigRepository + ?Sized>(repo: &C) -> Result<Self, RepoError> {
        let mut all: Vec<&str> = Vec::new();
        all.extend_from_slice(&keys::VIP_BALANCES);
        all.extend_from_slice(&keys::VIP_TEAM_BALANCES);
        let table = RateTable::load(repo, &all)?;
        Ok(Self {
            balances: table.get_many(&keys::VIP_BALANCES),
            team_balances: table.get_many(&keys::VIP_TEAM_BALANCES),
        })
    }
}
