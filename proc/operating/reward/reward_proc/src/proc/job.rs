//! 批处理任务
//!
//! 一次运行 = 读快照 → 依次执行任务 → 全部成功后按需写回。
//! 任一任务整体失败时不写回，磁盘上的账本保持运行前的状态。

use base_types::Timestamp;
use clap::ValueEnum;
use reward::{InMemoryStore, RewardCommand, RewardCommandHandler, RewardEngine, RunContext, RunReport};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::proc::error::Result;
use crate::proc::settings::ProcSettings;
use crate::proc::snapshot;

/// 可调度的任务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    DailyLocation,
    Area,
    TeamLevel,
    Settlements,
    PriceChange,
    VipCheck,
}

impl JobKind {
    /// `run-all` 的任务顺序
    pub fn all() -> Vec<JobKind> { RewardCommand::RUN_ALL.iter().map(|c| JobKind::from(*c)).collect() }

    pub const fn command(self) -> RewardCommand {
        match self {
            JobKind::DailyLocation => RewardCommand::DailyLocation,
            JobKind::Area => RewardCommand::Area,
            JobKind::TeamLevel => RewardCommand::TeamLevel,
            JobKind::Settlements => RewardCommand::Settlement,
            JobKind::PriceChange => RewardCommand::PriceChange,
            JobKind::VipCheck => RewardCommand::VipRecheck,
        }
    }
}

impl From<RewardCommand> for JobKind {
    fn from(command: RewardCommand) -> Self {
        match command {
            RewardCommand::DailyLocation => JobKind::DailyLocation,
            RewardCommand::Area => JobKind::Area,
            RewardCommand::TeamLevel => JobKind::TeamLevel,
            RewardCommand::Settlement => JobKind::Settlements,
            RewardCommand::PriceChange => JobKind::PriceChange,
            RewardCommand::VipRecheck => JobKind::VipCheck,
        }
    }
}

/// 在给定仓储上依次执行任务，返回仓储与各任务报告
pub fn run_jobs(
    store: InMemoryStore,
    ctx: RunContext,
    jobs: &[JobKind],
) -> Result<(InMemoryStore, Vec<RunReport>)> {
    let mut engine = RewardEngine::new(store, ctx);
    let mut reports = Vec::with_capacity(jobs.len());

    for job in jobs {
        let command = job.command();
        info!(job = command.name(), handler = engine.handler_name(), "任务开始");
        match engine.handle(command) {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!(job = command.name(), error = %e, "任务整体失败");
                return Err(e.into());
            }
        }
    }

    Ok((engine.into_store(), reports))
}

/// 基于进程配置的任务执行器
#[derive(Debug, Clone)]
pub struct JobRunner {
    settings: ProcSettings,
}

impl JobRunner {
    pub fn new(settings: ProcSettings) -> Self { Self { settings } }

    pub fn settings(&self) -> &ProcSettings { &self.settings }

    /// 读快照、执行、按配置写回
    pub fn run(&self, jobs: &[JobKind], now: Timestamp) -> Result<Vec<RunReport>> {
        let path = &self.settings.snapshot_path;
        let store = snapshot::load_store(path)?;
        let ctx = RunContext::new(now, self.settings.utc_offset_hours);

        let (store, reports) = run_jobs(store, ctx, jobs)?;

        if self.settings.persist {
            snapshot::save_store(path, &store)?;
        }
        Ok(reports)
    }
}
