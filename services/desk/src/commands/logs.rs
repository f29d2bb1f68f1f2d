use anyhow::{Context, Result};
use chrono::Local;
use std::fs::File;
use visits::approval::scope;
use visits::logs::{export_csv, search_entries};

use crate::cli::LogsArgs;
use crate::context::AppContext;
use crate::output::logs_table;
use crate::router::Route;

pub async fn run(ctx: &AppContext, args: LogsArgs) -> Result<()> {
    let user = ctx.open_private(Route::Logs).await?;

    let entries = ctx
        .visit_logs()
        .entries(scope(&user), args.date, &Local)
        .await?;
    let matching = search_entries(&entries, args.search.as_deref().unwrap_or_default());
    println!("{}", logs_table(&matching));

    if let Some(path) = &args.export {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        export_csv(matching.iter().copied(), file)?;
        println!("{} entries exported to {}", matching.len(), path.display());
    }
    Ok(())
}
