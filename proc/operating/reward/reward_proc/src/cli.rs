//! 命令行接口

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reward_proc::proc::JobKind;

#[derive(Parser, Debug)]
#[command(name = "reward_proc")]
#[command(version, about = "奖励分配批处理", long_about = None)]
pub struct Cli {
    /// 进程配置文件
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// 账本快照（覆盖配置中的 snapshot_path）
    #[arg(short, long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// 运行成功后写回快照
    #[arg(long)]
    pub persist: bool,

    /// 以指定时间（毫秒时间戳）运行，用于补跑
    #[arg(long, value_name = "MILLIS")]
    pub at: Option<i64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 每日点位收益与推荐佣金
    DailyLocation,

    /// 区域分红与全球前四
    Area,

    /// 团队等级分红
    TeamLevel,

    /// 提现/交易结算分成
    Settlements,

    /// 处理待确认的价格变动
    PriceChange,

    /// 复核 VIP 等级
    VipCheck,

    /// 依次执行全部任务
    RunAll,

    /// 按配置的间隔重复执行，Ctrl-C 退出
    Schedule {
        /// 覆盖配置中的间隔（秒）
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// 覆盖配置中的任务列表
        #[arg(long, value_enum, value_delimiter = ',')]
        jobs: Vec<JobKind>,
    },
}

impl Cli {
    pub fn parse_args() -> Self { Self::parse() }
}

impl Commands {
    /// 单次运行的任务列表；`schedule` 返回 `None`
    pub fn jobs(&self) -> Option<Vec<JobKind>> {
        match self {
            Commands::DailyLocation => Some(vec![JobKind::DailyLocation]),
            Commands::Area => Some(vec![JobKind::Area]),
            Commands::TeamLevel => Some(vec![JobKind::TeamLevel]),
            Commands::Settlements => Some(vec![JobKind::Settlements]),
            Commands::PriceChange => Some(vec![JobKind::PriceChange]),
            Commands::VipCheck => Some(vec![JobKind::VipCheck]),
            Commands::RunAll => Some(JobKind::all()),
            Commands::Schedule { .. } => None,
        }
    }
}
