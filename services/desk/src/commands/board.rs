use anyhow::Result;
use chrono::{Local, Utc};
use dashboard::{DashboardWatcher, DayWindow};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use visits::DisplayBoard;

use crate::cli::{DashboardArgs, DisplayArgs};
use crate::context::AppContext;
use crate::output::{display_table, stats_table, visits_table};
use crate::router::Route;

async fn print_board(board: &DisplayBoard) -> Result<()> {
    let entries = board.entries(Utc::now()).await?;
    println!("{}", display_table(&entries));
    Ok(())
}

pub async fn display(ctx: &AppContext, args: DisplayArgs) -> Result<()> {
    ctx.open(Route::Display).await?;
    let board = ctx.display_board();
    print_board(&board).await?;

    if !args.watch {
        return Ok(());
    }

    let schedule = ctx.config.display.refresh_schedule.as_str();
    let mut scheduler = JobScheduler::new().await?;
    let job = Job::new_async(schedule, move |_, _| {
        let board = board.clone();
        Box::pin(async move {
            if let Err(e) = print_board(&board).await {
                error!("Failed to refresh display board: {}", e);
            }
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("Display board refreshing with schedule: {}", schedule);

    tokio::signal::ctrl_c().await?;
    scheduler.shutdown().await?;
    Ok(())
}

pub async fn dashboard(ctx: &AppContext, args: DashboardArgs) -> Result<()> {
    let user = ctx.open_private(Route::Dashboard).await?;
    let stats = ctx.stats();

    if let Some(status) = args.status {
        let window = DayWindow::today(&Local);
        let visits = stats.visits_for_status(&user, status, &window).await?;
        let rows: Vec<_> = visits.iter().collect();
        println!("{}", visits_table(&rows));
        return Ok(());
    }

    if !args.watch {
        let snapshot = stats.fetch(&user, &DayWindow::today(&Local)).await?;
        println!("{}", stats_table(&snapshot));
        return Ok(());
    }

    let watcher = DashboardWatcher::new(
        Arc::new(stats),
        ctx.feed.clone(),
        user,
        Local,
        &ctx.config.dashboard.poll_schedule,
    );
    let mut snapshots = watcher.subscribe();
    watcher.start().await?;

    loop {
        if let Some(snapshot) = snapshots.borrow_and_update().as_ref() {
            println!("{}", stats_table(&snapshot.stats));
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => if changed.is_err() { break },
        }
    }

    watcher.stop().await?;
    Ok(())
}
