//! 定时调度
//!
//! 单写者：每个周期在当前任务内同步执行一次运行，上一轮结束前不会开始下一轮。
//! 某一轮失败只记日志，调度继续；收到停止信号后退出。

use std::future::Future;
use std::time::Duration;

use base_types::Timestamp;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

use crate::proc::error::Result;

/// 按固定间隔重复执行 `tick`，直到 `shutdown` 完成；返回执行轮数
pub async fn run_schedule<F, T>(interval: Duration, mut tick: F, shutdown: impl Future<Output = ()>) -> usize
where
    F: FnMut(Timestamp) -> Result<T>,
{
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut runs = 0usize;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(runs, "收到停止信号，调度退出");
                break;
            }
            _ = ticker.tick() => {
                runs += 1;
                match tick(Timestamp::now()) {
                    Ok(_) => info!(run = runs, "本轮运行完成"),
                    Err(e) => error!(run = runs, error = %e, "本轮运行失败，等待下一周期"),
                }
            }
        }
    }
    runs
}
