//! 进程配置
//!
//! YAML 文件，所有字段都有默认值；`--config` 指定的文件优先，
//! 否则读取当前目录下的 `reward_proc.yaml`，都没有时使用默认配置。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::proc::error::{ProcError, Result};
use crate::proc::job::JobKind;

/// 默认配置文件名
pub const DEFAULT_SETTINGS_FILE: &str = "reward_proc.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcSettings {
    /// 默认日志级别（`RUST_LOG` 可覆盖）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 业务日 UTC 偏移（小时）
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// 账本快照路径（JSON）
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// 运行成功后写回快照
    #[serde(default)]
    pub persist: bool,

    #[serde(default)]
    pub schedule: ScheduleSettings,
}

/// 定时调度配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// 两次运行的间隔（秒）
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// 每次运行依次执行的任务
    #[serde(default = "default_jobs")]
    pub jobs: Vec<JobKind>,
}

impl Default for ProcSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            utc_offset_hours: default_utc_offset_hours(),
            snapshot_path: default_snapshot_path(),
            persist: false,
            schedule: ScheduleSettings::default(),
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self { Self { interval_secs: default_interval_secs(), jobs: default_jobs() } }
}

impl ProcSettings {
    /// 从指定文件读取
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: ProcSettings = serde_yaml::from_str(&content)?;
        settings.validate()?;
        debug!(path = %path.display(), "进程配置已加载");
        Ok(settings)
    }

    /// 按优先级查找配置：显式路径 → 当前目录默认文件 → 默认值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        let fallback = Path::new(DEFAULT_SETTINGS_FILE);
        if fallback.exists() {
            return Self::load_from_file(fallback);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(ProcError::Invalid(format!(
                "utc_offset_hours out of range: {}",
                self.utc_offset_hours
            )));
        }
        if self.schedule.interval_secs == 0 {
            return Err(ProcError::Invalid("schedule.interval_secs must be positive".into()));
        }
        Ok(())
    }
}

fn default_log_level() -> String { "info".to_string() }

fn default_utc_offset_hours() -> i32 { 8 }

fn default_snapshot_path() -> PathBuf { PathBuf::from("ledger.json") }

fn default_interval_secs() -> u64 { 24 * 60 * 60 }

fn default_jobs() -> Vec<JobKind> { JobKind::all() }
