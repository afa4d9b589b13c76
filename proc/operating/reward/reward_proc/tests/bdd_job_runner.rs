//! BDD测试 - 批处理进程
//!
//! 快照读入 → 执行任务 → 按配置写回；附带的示例配置与示例账本可直接运行。

use std::path::{Path, PathBuf};

use base_types::{LocationId, MICRO_UNIT, Timestamp, UserId};
use reward::{PassKind, RewardReason};
use reward_proc::proc::{snapshot, JobKind, JobRunner, ProcSettings};

fn manifest_path(rel: &str) -> PathBuf { Path::new(env!("CARGO_MANIFEST_DIR")).join(rel) }

fn now() -> Timestamp { Timestamp::from_millis(1_760_061_600_000) }

/// 把示例账本拷到临时目录，返回配置
fn sandbox(dir: &Path, persist: bool) -> ProcSettings {
    let ledger = dir.join("ledger.json");
    std::fs::copy(manifest_path("config/ledger.sample.json"), &ledger).unwrap();
    ProcSettings { snapshot_path: ledger, persist, ..ProcSettings::default() }
}

#[cfg(test)]
mod job_runner {
    use super::*;

    #[test]
    fn scenario_sample_settings_parse() {
        let settings =
            ProcSettings::load(Some(&manifest_path("config/reward_proc.yaml"))).unwrap();
        assert_eq!(settings.utc_offset_hours, 8);
        assert_eq!(settings.schedule.jobs, JobKind::all());
    }

    #[test]
    fn scenario_run_all_on_sample_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let runner = JobRunner::new(sandbox(dir.path(), false));

        // When: 全量运行
        let reports = runner.run(&JobKind::all(), now()).unwrap();

        // Then: 每个任务一份报告，顺序与任务一致
        let passes: Vec<PassKind> = reports.iter().map(|r| r.pass).collect();
        assert_eq!(
            passes,
            vec![
                PassKind::PriceChange,
                PassKind::DailyLocation,
                PassKind::Area,
                PassKind::TeamLevel,
                PassKind::Settlement,
                PassKind::VipRecheck,
            ]
        );
        // 每个点位都拿到当日收益
        assert_eq!(reports[1].credited_to(UserId(3)), 30_000);
        // 报告可序列化输出
        assert!(serde_json::to_string(&reports).is_ok());
    }

    #[test]
    fn scenario_dry_run_leaves_snapshot_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let settings = sandbox(dir.path(), false);
        let before = std::fs::read_to_string(&settings.snapshot_path).unwrap();

        JobRunner::new(settings.clone()).run(&[JobKind::DailyLocation], now()).unwrap();

        let after = std::fs::read_to_string(&settings.snapshot_path).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn scenario_persisted_run_is_visible_to_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let settings = sandbox(dir.path(), true);
        let runner = JobRunner::new(settings.clone());

        // When: 运行结算分成两次，中间写回快照
        let first = runner.run(&[JobKind::Settlements], now()).unwrap();
        let second = runner.run(&[JobKind::Settlements], now()).unwrap();

        // Then: 第二次读到已结算标记，不再分配
        assert!(!first[0].applied.is_empty());
        assert!(second[0].applied.is_empty());

        let store = snapshot::load_store(&settings.snapshot_path).unwrap();
        let direct: Vec<_> = store
            .state()
            .rewards()
            .iter()
            .filter(|r| r.reason == RewardReason::DirectRecommend)
            .collect();
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].user_id, UserId(2));
        assert_eq!(direct[0].amount, 300_000);
    }

    #[test]
    fn scenario_daily_progress_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let settings = sandbox(dir.path(), true);

        JobRunner::new(settings.clone()).run(&[JobKind::DailyLocation], now()).unwrap();

        let store = snapshot::load_store(&settings.snapshot_path).unwrap();
        // 当日收益 100_000 + 用户 3 带来的一层佣金 15_000
        let loc = store.state().location(LocationId(2)).unwrap();
        assert_eq!(loc.current, 115_000);
        assert!(loc.current < 3_000 * MICRO_UNIT);
    }
}
