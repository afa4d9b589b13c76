//! 领域实体

pub mod location;
pub mod referral;
pub mod reward;
pub mod settlement;
pub mod user;

pub use base_types::{
    Amount, LocationId, MICRO_UNIT, PriceChangeId, RewardId, SettlementId, Timestamp, UserId,
};
pub use location::{Branch, Location, LocationStatus, LocationUpdate};
pub use referral::{UserArea, UserRecommend};
pub use reward::{NewReward, Reward, RewardReason, RewardSource};
pub use settlement::{PriceChange, Settlement, SettlementKind, SettlementStatus};
pub use user::{UserBalance, UserInfo};
