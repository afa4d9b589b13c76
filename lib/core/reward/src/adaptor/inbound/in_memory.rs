//! 内存账本实现
//!
//! 全部表放在一个 `LedgerTables` 里，由 `MemRepo` 提供快照式事务。
//! 推荐关系按物化路径（祖先链 + 自身）建有序索引，伞下查询即前缀范围扫描。

use std::collections::{BTreeMap, BTreeSet, HashMap};

use base_types::{Amount, LocationId, PriceChangeId, RewardId, SettlementId, UserId};
use chrono::NaiveDate;
use db_repo::MemRepo;

use crate::domain::entity::{
    Branch, Location, LocationUpdate, NewReward, PriceChange, Reward, Settlement,
    SettlementStatus, UserArea, UserBalance, UserInfo, UserRecommend,
};
use crate::domain::repository::{
    ConfigRepository, LocationRepository, ReferralRepository, RepoError, RewardRepository,
    SettlementRepository, UserRepository,
};

/// 内存账本
pub type InMemoryStore = MemRepo<LedgerTables>;

/// 内存账本的全部表
#[derive(Debug, Clone, Default)]
pub struct LedgerTables {
    configs: BTreeMap<String, String>,
    price_changes: BTreeMap<PriceChangeId, PriceChange>,
    locations: BTreeMap<LocationId, Location>,
    recommends: BTreeMap<UserId, UserRecommend>,
    path_index: BTreeMap<Vec<UserId>, UserId>,
    areas: BTreeMap<UserId, UserArea>,
    user_infos: BTreeMap<UserId, UserInfo>,
    balances: BTreeMap<UserId, UserBalance>,
    rewards: Vec<Reward>,
    settlements: BTreeMap<SettlementId, Settlement>,
    failing_users: BTreeSet<UserId>,
}

impl LedgerTables {
    pub fn set_config(&mut self, key: &str, value: impl ToString) {
        self.configs.insert(key.to_string(), value.to_string());
    }

    /// 注册用户及其祖先链（根在前）
    pub fn insert_user(&mut self, info: UserInfo, ancestors: Vec<UserId>) {
        let user_id = info.user_id;
        if let Some(old) = self.recommends.get(&user_id) {
            self.path_index.remove(&old.path());
        }
        let recommend = UserRecommend::new(user_id, ancestors);
        self.path_index.insert(recommend.path(), user_id);
        self.recommends.insert(user_id, recommend);
        self.user_infos.insert(user_id, info);
        self.balances
            .entry(user_id)
            .or_insert_with(|| UserBalance { user_id, ..Default::default() });
    }

    pub fn set_balance(&mut self, user_id: UserId, usdt: Amount, secondary: Amount) {
        self.balances.insert(
            user_id,
            UserBalance { user_id, balance_usdt: usdt, balance_secondary: secondary },
        );
    }

    pub fn set_area(&mut self, area: UserArea) { self.areas.insert(area.user_id, area); }

    pub fn insert_location(&mut self, location: Location) {
        self.locations.insert(location.id, location);
    }

    pub fn insert_settlement(&mut self, settlement: Settlement) {
        self.settlements.insert(settlement.id, settlement);
    }

    pub fn push_price_change(&mut self, change: PriceChange) {
        self.price_changes.insert(change.id, change);
    }

    /// 之后所有涉及该用户的写入都失败（用于验证单元回滚）
    pub fn fail_writes_for(&mut self, user_id: UserId) { self.failing_users.insert(user_id); }

    pub fn config(&self, key: &str) -> Option<&str> { self.configs.get(key).map(String::as_str) }

    pub fn location(&self, id: LocationId) -> Option<&Location> { self.locations.get(&id) }

    pub fn locations(&self) -> impl Iterator<Item = &Location> { self.locations.values() }

    pub fn rewards(&self) -> &[Reward] { &self.rewards }

    pub fn user_info(&self, user_id: UserId) -> Option<&UserInfo> { self.user_infos.get(&user_id) }

    pub fn balance(&self, user_id: UserId) -> Option<&UserBalance> { self.balances.get(&user_id) }

    pub fn area(&self, user_id: UserId) -> Option<&UserArea> { self.areas.get(&user_id) }

    pub fn settlement(&self, id: SettlementId) -> Option<&Settlement> { self.settlements.get(&id) }

    pub fn price_change(&self, id: PriceChangeId) -> Option<&PriceChange> {
        self.price_changes.get(&id)
    }

    fn guard_writes(&self, user_id: UserId) -> Result<(), RepoError> {
        if self.failing_users.contains(&user_id) {
            return Err(RepoError::WriteFailed(format!("writes for user {} are failing", user_id)));
        }
        Ok(())
    }

    /// 物化路径前缀扫描：返回 (路径长度, 用户)
    fn subtree(&self, user_id: UserId) -> Vec<(usize, UserId)> {
        let Some(rec) = self.recommends.get(&user_id) else {
            return Vec::new();
        };
        let prefix = rec.path();
        self.path_index
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter(|(path, _)| path.len() > prefix.len())
            .map(|(path, id)| (path.len() - prefix.len(), *id))
            .collect()
    }
}

/// 账本快照（JSON 导入导出）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedgerSnapshot {
    #[cfg_attr(feature = "serde", serde(default))]
    pub configs: BTreeMap<String, String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub users: Vec<UserRecord>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub locations: Vec<Location>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rewards: Vec<Reward>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub settlements: Vec<Settlement>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub price_changes: Vec<PriceChange>,
}

/// 快照中的用户行
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UserRecord {
    pub user_id: UserId,
    /// 推荐码（"D1D2"，根用户为空）
    pub recommend_code: String,
    pub vip: u8,
    pub lock_vip: bool,
    pub history_recommend: i64,
    pub team_balance: Amount,
    pub balance_usdt: Amount,
    pub balance_secondary: Amount,
    pub area_amount: Amount,
    pub area_self_amount: Amount,
    pub area_level: u8,
}

impl LedgerSnapshot {
    pub fn into_tables(self) -> Result<LedgerTables, RepoError> {
        let mut tables = LedgerTables { configs: self.configs, ..Default::default() };
        for user in self.users {
            let recommend = UserRecommend::parse_code(user.user_id, &user.recommend_code)
                .ok_or_else(|| {
                    RepoError::DeserializationFailed(format!(
                        "user {} recommend code {:?}",
                        user.user_id, user.recommend_code
                    ))
                })?;
            tables.insert_user(
                UserInfo {
                    user_id: user.user_id,
                    vip: user.vip,
                    lock_vip: user.lock_vip,
                    history_recommend: user.history_recommend,
                    team_balance: user.team_balance,
                },
                recommend.ancestors,
            );
            tables.set_balance(user.user_id, user.balance_usdt, user.balance_secondary);
            tables.set_area(UserArea {
                user_id: user.user_id,
                amount: user.area_amount,
                self_amount: user.area_self_amount,
                level: user.area_level,
            });
        }
        for location in self.locations {
            if tables.locations.contains_key(&location.id) {
                return Err(RepoError::AlreadyExists(format!("location {}", location.id)));
            }
            tables.insert_location(location);
        }
        tables.rewards = self.rewards;
        for settlement in self.settlements {
            tables.insert_settlement(settlement);
        }
        for change in self.price_changes {
            tables.push_price_change(change);
        }
        Ok(tables)
    }

    pub fn from_tables(tables: &LedgerTables) -> Self {
        let users = tables
            .user_infos
            .values()
            .map(|info| {
                let balance = tables.balances.get(&info.user_id).cloned().unwrap_or_default();
                let area = tables.areas.get(&info.user_id).cloned().unwrap_or_default();
                UserRecord {
                    user_id: info.user_id,
                    recommend_code: tables
                        .recommends
                        .get(&info.user_id)
                        .map(UserRecommend::code)
                        .unwrap_or_default(),
                    vip: info.vip,
                    lock_vip: info.lock_vip,
                    history_recommend: info.history_recommend,
                    team_balance: info.team_balance,
                    balance_usdt: balance.balance_usdt,
                    balance_secondary: balance.balance_secondary,
                    area_amount: area.amount,
                    area_self_amount: area.self_amount,
                    area_level: area.level,
                }
            })
            .collect();
        Self {
            configs: tables.configs.clone(),
            users,
            locations: tables.locations.values().cloned().collect(),
            rewards: tables.rewards.clone(),
            settlements: tables.settlements.values().cloned().collect(),
            price_changes: tables.price_changes.values().cloned().collect(),
        }
    }
}

impl ConfigRepository for InMemoryStore {
    fn get_configs(&self, keys: &[&str]) -> Result<HashMap<String, String>, RepoError> {
        Ok(keys
            .iter()
            .filter_map(|k| self.state().configs.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    fn set_config(&mut self, key: &str, value: String) -> Result<(), RepoError> {
        self.state_mut().configs.insert(key.to_string(), value);
        Ok(())
    }

    fn pending_price_change(&self) -> Result<Option<PriceChange>, RepoError> {
        Ok(self.state().price_changes.values().find(|c| !c.processed).cloned())
    }

    fn mark_price_change_processed(&mut self, id: PriceChangeId) -> Result<bool, RepoError> {
        let change = self
            .state_mut()
            .price_changes
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found(format!("price change {}", id)))?;
        if change.processed {
            return Ok(false);
        }
        change.processed = true;
        Ok(true)
    }
}

impl ReferralRepository for InMemoryStore {
    fn get_recommend(&self, user_id: UserId) -> Result<Option<UserRecommend>, RepoError> {
        Ok(self.state().recommends.get(&user_id).cloned())
    }

    fn direct_children(&self, user_id: UserId) -> Result<Vec<UserId>, RepoError> {
        Ok(self
            .state()
            .subtree(user_id)
            .into_iter()
            .filter(|(depth, _)| *depth == 1)
            .map(|(_, id)| id)
            .collect())
    }

    fn descendants(&self, user_id: UserId) -> Result<Vec<UserId>, RepoError> {
        Ok(self.state().subtree(user_id).into_iter().map(|(_, id)| id).collect())
    }

    fn get_user_area(&self, user_id: UserId) -> Result<Option<UserArea>, RepoError> {
        Ok(self.state().areas.get(&user_id).cloned())
    }

    fn get_user_areas(&self, user_ids: &[UserId]) -> Result<Vec<UserArea>, RepoError> {
        Ok(user_ids.iter().filter_map(|id| self.state().areas.get(id).cloned()).collect())
    }

    fn raise_user_area_level(&mut self, user_id: UserId, level: u8) -> Result<(), RepoError> {
        self.state().guard_writes(user_id)?;
        let area = self
            .state_mut()
            .areas
            .entry(user_id)
            .or_insert_with(|| UserArea { user_id, ..Default::default() });
        area.level = area.level.max(level);
        Ok(())
    }
}

impl LocationRepository for InMemoryStore {
    fn list_running(&self) -> Result<Vec<Location>, RepoError> {
        Ok(self.state().locations.values().filter(|l| l.is_running()).cloned().collect())
    }

    fn get_by_id(&self, id: LocationId) -> Result<Option<Location>, RepoError> {
        Ok(self.state().locations.get(&id).cloned())
    }

    fn list_by_user(&self, user_id: UserId) -> Result<Vec<Location>, RepoError> {
        Ok(self.state().locations.values().filter(|l| l.user_id == user_id).cloned().collect())
    }

    fn latest_running_by_user(&self, user_id: UserId) -> Result<Option<Location>, RepoError> {
        Ok(self
            .state()
            .locations
            .values()
            .filter(|l| l.user_id == user_id && l.is_running())
            .last()
            .cloned())
    }

    fn list_created_on(
        &self,
        day: NaiveDate,
        utc_offset_hours: i32,
    ) -> Result<Vec<Location>, RepoError> {
        Ok(self
            .state()
            .locations
            .values()
            .filter(|l| l.created_at.business_date(utc_offset_hours) == day)
            .cloned()
            .collect())
    }

    fn update_capacity_and_status(
        &mut self,
        id: LocationId,
        update: &LocationUpdate,
    ) -> Result<(), RepoError> {
        let owner = self
            .state()
            .locations
            .get(&id)
            .map(|l| l.user_id)
            .ok_or_else(|| RepoError::not_found(format!("location {}", id)))?;
        self.state().guard_writes(owner)?;
        let loc = self
            .state_mut()
            .locations
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found(format!("location {}", id)))?;
        loc.apply(update).map_err(RepoError::InvariantViolation)
    }

    fn debit_current(&mut self, id: LocationId, amount: Amount) -> Result<(), RepoError> {
        let loc = self
            .state_mut()
            .locations
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found(format!("location {}", id)))?;
        loc.debit(amount).map_err(RepoError::InvariantViolation)
    }

    fn subtract_ancestor_totals(
        &mut self,
        ancestor: LocationId,
        branch: Branch,
        amount: Amount,
    ) -> Result<(), RepoError> {
        let loc = self
            .state_mut()
            .locations
            .get_mut(&ancestor)
            .ok_or_else(|| RepoError::not_found(format!("location {}", ancestor)))?;
        loc.subtract_branch(branch, amount).map_err(RepoError::InvariantViolation)
    }
}

impl RewardRepository for InMemoryStore {
    fn append_reward(&mut self, reward: NewReward) -> Result<RewardId, RepoError> {
        self.state().guard_writes(reward.user_id)?;
        let rewards = &mut self.state_mut().rewards;
        let id = RewardId(rewards.len() as u64 + 1);
        rewards.push(Reward::from_new(id, reward));
        Ok(id)
    }

    fn rewards_by_user(&self, user_id: UserId) -> Result<Vec<Reward>, RepoError> {
        Ok(self.state().rewards.iter().filter(|r| r.user_id == user_id).cloned().collect())
    }
}

impl UserRepository for InMemoryStore {
    fn list_user_infos(&self) -> Result<Vec<UserInfo>, RepoError> {
        Ok(self.state().user_infos.values().cloned().collect())
    }

    fn get_user_info(&self, user_id: UserId) -> Result<Option<UserInfo>, RepoError> {
        Ok(self.state().user_infos.get(&user_id).cloned())
    }

    fn update_vip(&mut self, user_id: UserId, vip: u8) -> Result<(), RepoError> {
        self.state().guard_writes(user_id)?;
        let info = self
            .state_mut()
            .user_infos
            .get_mut(&user_id)
            .ok_or_else(|| RepoError::not_found(format!("user {}", user_id)))?;
        info.vip = vip;
        Ok(())
    }

    fn get_balance(&self, user_id: UserId) -> Result<Option<UserBalance>, RepoError> {
        Ok(self.state().balances.get(&user_id).cloned())
    }

    fn credit_balance(
        &mut self,
        user_id: UserId,
        usdt: Amount,
        secondary: Amount,
    ) -> Result<(), RepoError> {
        self.state().guard_writes(user_id)?;
        let balance = self
            .state_mut()
            .balances
            .entry(user_id)
            .or_insert_with(|| UserBalance { user_id, ..Default::default() });
        let next_usdt = balance.balance_usdt + usdt;
        let next_secondary = balance.balance_secondary + secondary;
        if next_usdt < 0 || next_secondary < 0 {
            return Err(RepoError::invariant(format!(
                "user {} balance would go negative",
                user_id
            )));
        }
        balance.balance_usdt = next_usdt;
        balance.balance_secondary = next_secondary;
        Ok(())
    }
}

impl SettlementRepository for InMemoryStore {
    fn pending_settlements(&self) -> Result<Vec<Settlement>, RepoError> {
        Ok(self
            .state()
            .settlements
            .values()
            .filter(|s| s.status == SettlementStatus::Pending)
            .cloned()
            .collect())
    }

    fn mark_settled(&mut self, id: SettlementId) -> Result<bool, RepoError> {
        let settlement = self
            .state_mut()
            .settlements
            .get_mut(&id)
            .ok_or_else(|| RepoError::not_found(format!("settlement {}", id)))?;
        if settlement.status == SettlementStatus::Settled {
            return Ok(false);
        }
        settlement.status = SettlementStatus::Settled;
        Ok(true)
    }
}
