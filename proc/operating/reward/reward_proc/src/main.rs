mod cli;

use std::time::Duration;

use base_types::Timestamp;
use cli::{Cli, Commands};
use reward::RunReport;
use reward_proc::proc::{JobKind, JobRunner, ProcSettings, run_schedule};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let mut settings = ProcSettings::load(cli.config.as_deref())?;
    if let Some(snapshot) = &cli.snapshot {
        settings.snapshot_path = snapshot.clone();
    }
    if cli.persist {
        settings.persist = true;
    }

    // RUST_LOG 优先，其次配置中的级别
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(settings.log_level.parse()?))
        .init();

    match &cli.command {
        Commands::Schedule { interval, jobs } => {
            if let Some(secs) = interval {
                settings.schedule.interval_secs = *secs;
            }
            if !jobs.is_empty() {
                settings.schedule.jobs = jobs.clone();
            }
            settings.validate()?;
            handle_schedule(settings).await;
        }
        command => {
            let jobs = command.jobs().unwrap_or_else(JobKind::all);
            let now = cli.at.map(Timestamp::from_millis).unwrap_or_else(Timestamp::now);
            handle_run(settings, &jobs, now)?;
        }
    }

    Ok(())
}

fn handle_run(settings: ProcSettings, jobs: &[JobKind], now: Timestamp) -> anyhow::Result<()> {
    let runner = JobRunner::new(settings);
    let reports = runner.run(jobs, now)?;
    print_reports(&reports)
}

async fn handle_schedule(settings: ProcSettings) {
    let interval = Duration::from_secs(settings.schedule.interval_secs);
    let jobs = settings.schedule.jobs.clone();
    let runner = JobRunner::new(settings);

    tracing::info!(interval_secs = interval.as_secs(), jobs = ?jobs, "调度启动");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "无法监听 Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    let runs = run_schedule(interval, |now| runner.run(&jobs, now), shutdown).await;
    tracing::info!(runs, "调度结束");
}

fn print_reports(reports: &[RunReport]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(reports)?);
    Ok(())
}
