use anyhow::Result;
use visits::approval::filter_visits;
use visits::VisitAction;

use super::deliver_pass;
use crate::cli::{ApprovalsCommand, ApprovalsSubcommand, VisitIdArgs};
use crate::context::AppContext;
use crate::output::visits_table;
use crate::router::Route;

pub async fn run(ctx: &AppContext, command: ApprovalsCommand) -> Result<()> {
    let actor = ctx.open_private(Route::Approval).await?;
    let approvals = ctx.approvals();

    let (action, args) = match command.command {
        ApprovalsSubcommand::List { search } => {
            let pending = approvals.pending_visits(&actor).await?;
            let matching = filter_visits(&pending, search.as_deref().unwrap_or_default());
            if matching.is_empty() {
                println!("No pending visits");
            } else {
                println!("{}", visits_table(&matching));
            }
            return Ok(());
        }
        ApprovalsSubcommand::Approve(args) => (VisitAction::Approve, args),
        ApprovalsSubcommand::Deny(args) => (VisitAction::Deny, args),
        ApprovalsSubcommand::Complete(args) => (VisitAction::Complete, args),
        ApprovalsSubcommand::Cancel(args) => (VisitAction::Cancel, args),
        ApprovalsSubcommand::CheckIn(args) => (VisitAction::CheckIn, args),
    };

    let VisitIdArgs { visit_id, qr_out } = args;
    let outcome = approvals.apply(&actor, visit_id, action).await?;
    println!(
        "Visit {} for {} is now {}",
        outcome.visit.visit.id,
        outcome.visit.visitor_name(),
        outcome.visit.visit.status
    );

    if let Some(qr_code) = &outcome.qr_code {
        deliver_pass(qr_code, outcome.email_sent, qr_out.as_deref())?;
    }
    Ok(())
}
