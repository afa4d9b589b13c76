//! 仓储接口定义
//!
//! 遵循 Clean Architecture，仓储接口定义在领域层。
//! 所有读取都返回拥有所有权的值：每一跳都要看到上一跳已提交的状态。

use std::collections::HashMap;

use base_types::{Amount, LocationId, PriceChangeId, SettlementId, UserId};
use chrono::NaiveDate;
pub use db_repo::{RepoError, Transactional};

use crate::domain::entity::{
    Branch, Location, LocationUpdate, NewReward, PriceChange, Reward, RewardId, Settlement,
    UserArea, UserBalance, UserInfo, UserRecommend,
};

/// 配置仓储
pub trait ConfigRepository {
    /// 批量读取配置；缺失的键不出现在结果中
    fn get_configs(&self, keys: &[&str]) -> Result<HashMap<String, String>, RepoError>;

    /// 写入配置
    fn set_config(&mut self, key: &str, value: String) -> Result<(), RepoError>;

    /// 最早一条未处理的价格变动
    fn pending_price_change(&self) -> Result<Option<PriceChange>, RepoError>;

    /// 标记价格变动已处理；已处理过返回 false
    fn mark_price_change_processed(&mut self, id: PriceChangeId) -> Result<bool, RepoError>;
}

/// 推荐关系仓储
pub trait ReferralRepository {
    /// 用户的推荐关系
    fn get_recommend(&self, user_id: UserId) -> Result<Option<UserRecommend>, RepoError>;

    /// 直推用户
    fn direct_children(&self, user_id: UserId) -> Result<Vec<UserId>, RepoError>;

    /// 伞下全部用户（不含自身）
    fn descendants(&self, user_id: UserId) -> Result<Vec<UserId>, RepoError>;

    /// 用户区域聚合
    fn get_user_area(&self, user_id: UserId) -> Result<Option<UserArea>, RepoError>;

    /// 批量读取区域聚合
    fn get_user_areas(&self, user_ids: &[UserId]) -> Result<Vec<UserArea>, RepoError>;

    /// 抬升团队等级（只升不降）
    fn raise_user_area_level(&mut self, user_id: UserId, level: u8) -> Result<(), RepoError>;
}

/// 点位仓储
pub trait LocationRepository {
    /// 全部运行中点位（按ID升序）
    fn list_running(&self) -> Result<Vec<Location>, RepoError>;

    fn get_by_id(&self, id: LocationId) -> Result<Option<Location>, RepoError>;

    /// 用户的全部点位（按ID升序）
    fn list_by_user(&self, user_id: UserId) -> Result<Vec<Location>, RepoError>;

    /// 用户最新的运行中点位
    fn latest_running_by_user(&self, user_id: UserId) -> Result<Option<Location>, RepoError>;

    /// 某业务日内创建的点位
    fn list_created_on(
        &self,
        day: NaiveDate,
        utc_offset_hours: i32,
    ) -> Result<Vec<Location>, RepoError>;

    /// 更新容量与状态
    fn update_capacity_and_status(
        &mut self,
        id: LocationId,
        update: &LocationUpdate,
    ) -> Result<(), RepoError>;

    /// 扣减已累计收益
    fn debit_current(&mut self, id: LocationId, amount: Amount) -> Result<(), RepoError>;

    /// 扣减上级点位某条线业绩
    fn subtract_ancestor_totals(
        &mut self,
        ancestor: LocationId,
        branch: Branch,
        amount: Amount,
    ) -> Result<(), RepoError>;
}

/// 奖励流水仓储（只追加）
pub trait RewardRepository {
    fn append_reward(&mut self, reward: NewReward) -> Result<RewardId, RepoError>;

    fn rewards_by_user(&self, user_id: UserId) -> Result<Vec<Reward>, RepoError>;
}

/// 用户仓储
pub trait UserRepository {
    fn list_user_infos(&self) -> Result<Vec<UserInfo>, RepoError>;

    fn get_user_info(&self, user_id: UserId) -> Result<Option<UserInfo>, RepoError>;

    fn update_vip(&mut self, user_id: UserId, vip: u8) -> Result<(), RepoError>;

    fn get_balance(&self, user_id: UserId) -> Result<Option<UserBalance>, RepoError>;

    /// 余额入账（主币、次级币）
    fn credit_balance(
        &mut self,
        user_id: UserId,
        usdt: Amount,
        secondary: Amount,
    ) -> Result<(), RepoError>;
}

/// 结算单仓储
pub trait SettlementRepository {
    /// 待结算单（按ID升序）
    fn pending_settlements(&self) -> Result<Vec<Settlement>, RepoError>;

    /// 标记已结算；已结算过返回 false
    fn mark_settled(&mut self, id: SettlementId) -> Result<bool, RepoError>;
}

/// 分配引擎所需的全部仓储
pub trait LedgerStore:
    ConfigRepository
    + ReferralRepository
    + LocationRepository
    + RewardRepository
    + UserRepository
    + SettlementRepository
    + Transactional
{
}

impl<T> LedgerStore for T where
    T: ConfigRepository
        + ReferralRepository
        + LocationRepository
        + RewardRepository
        + UserRepository
        + SettlementRepository
        + Transactional
{
}
