//! 领域服务
//!
//! 每个批处理任务一个文件，均以 `impl<S: LedgerStore> RewardEngine<S>` 的形式挂在引擎上

pub mod area;
pub mod capacity;
pub mod command;
pub mod daily_location;
pub mod engine;
pub mod price_change;
pub mod rates;
pub mod report;
pub mod settlement;
pub mod stop_cascade;
pub mod team_level;
pub mod vip;

pub use capacity::{Fill, fill_to_cap, secondary_amount};
pub use command::{RewardCommand, RewardCommandHandler};
pub use engine::{EngineError, RewardEngine, RunContext};
pub use rates::{RateTable, keys};
pub use report::{Applied, Effect, PassKind, RunReport, SkipReason, Skipped, UnitRef};
pub use stop_cascade::MAX_CASCADE_DEPTH;
