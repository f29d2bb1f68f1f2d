mod account;
mod approvals;
mod board;
mod logs;
mod registration;

use anyhow::{Context, Result};
use std::path::Path;
use visits::qr::png_bytes;

use crate::cli::Commands;
use crate::context::AppContext;

pub async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Login(args) => account::login(ctx, args).await,
        Commands::Signup(args) => account::signup(ctx, args).await,
        Commands::Logout => account::logout(ctx).await,
        Commands::Whoami => account::whoami(ctx).await,
        Commands::Departments => account::departments(ctx).await,
        Commands::Users(command) => account::users(ctx, command).await,
        Commands::RequestVisit(args) => registration::request_visit(ctx, args).await,
        Commands::RegisterVisitor(args) => registration::register_visitor(ctx, args).await,
        Commands::PreRegister(args) => registration::pre_register(ctx, args).await,
        Commands::BulkUpload(args) => registration::bulk_upload(ctx, args).await,
        Commands::Approvals(command) => approvals::run(ctx, command).await,
        Commands::Display(args) => board::display(ctx, args).await,
        Commands::Dashboard(args) => board::dashboard(ctx, args).await,
        Commands::Logs(args) => logs::run(ctx, args).await,
    }
}

/// Report delivery of a visit pass and save it when asked
fn deliver_pass(qr_code: &str, email_sent: bool, out: Option<&Path>) -> Result<()> {
    if email_sent {
        println!("Visit pass emailed to the visitor.");
    } else {
        println!("The visit pass could not be emailed.");
    }

    if let Some(path) = out {
        let png = png_bytes(qr_code)?;
        std::fs::write(path, png)
            .with_context(|| format!("Failed to write visit pass to {}", path.display()))?;
        println!("Visit pass saved to {}", path.display());
    }
    Ok(())
}
