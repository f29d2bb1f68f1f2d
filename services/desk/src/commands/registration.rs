use anyhow::{Context, Result};
use chrono::Local;
use std::fs::File;
use std::path::Path;
use visits::photos::PhotoUpload;
use visits::registration::{PreRegistration, StaffRegistration, VisitRequest};
use visits::RegistrationOutcome;

use super::deliver_pass;
use crate::cli::{BulkUploadArgs, PreRegisterArgs, RegisterVisitorArgs, RequestVisitArgs};
use crate::context::AppContext;
use crate::router::Route;

fn read_photo(path: Option<&Path>) -> Result<Option<PhotoUpload>> {
    path.map(|path| {
        PhotoUpload::from_path(path)
            .with_context(|| format!("Failed to read photo {}", path.display()))
    })
    .transpose()
}

fn report(outcome: &RegistrationOutcome, out: Option<&Path>) -> Result<()> {
    println!("Visit {} created and waiting for approval", outcome.visit_id);
    if let Some(host) = &outcome.host {
        println!("Host: {} <{}>", host.name, host.email);
    }
    deliver_pass(&outcome.qr_code, outcome.email_sent, out)
}

pub async fn request_visit(ctx: &AppContext, args: RequestVisitArgs) -> Result<()> {
    ctx.open(Route::RequestVisit).await?;

    let request = VisitRequest {
        name: args.name,
        email: args.email,
        phone: args.phone,
        company: args.company,
        purpose: args.purpose,
        host_email: args.host_email,
        check_in_time: args.check_in,
        check_out_time: args.check_out,
        valid_until: args.valid_until,
        notes: args.notes,
        photo: read_photo(args.photo.as_deref())?,
    };

    let outcome = ctx.registration().request_visit(request).await?;
    report(&outcome, args.qr_out.as_deref())
}

pub async fn register_visitor(ctx: &AppContext, args: RegisterVisitorArgs) -> Result<()> {
    ctx.open_private(Route::Register).await?;

    let registration = StaffRegistration {
        name: args.name,
        email: args.email,
        phone: args.phone,
        purpose: args.purpose,
        host_email: args.host_email,
        valid_until: args.valid_until,
        photo: read_photo(args.photo.as_deref())?,
    };

    let outcome = ctx.registration().register_visitor(registration).await?;
    report(&outcome, args.qr_out.as_deref())
}

pub async fn pre_register(ctx: &AppContext, args: PreRegisterArgs) -> Result<()> {
    let actor = ctx.open_private(Route::PreRegister).await?;

    let registration = PreRegistration {
        name: args.name,
        email: args.email,
        phone: args.phone,
        purpose: args.purpose,
        host_email: args.host_email.unwrap_or_else(|| actor.email.clone()),
        visit_date: args.date,
        check_in_time: args.time,
        photo: read_photo(args.photo.as_deref())?,
    };

    let outcome = ctx
        .registration()
        .pre_register(&actor, registration, &Local)
        .await?;
    report(&outcome, args.qr_out.as_deref())
}

pub async fn bulk_upload(ctx: &AppContext, args: BulkUploadArgs) -> Result<()> {
    let actor = ctx.open_private(Route::BulkUpload).await?;
    let host_email = args.host_email.unwrap_or_else(|| actor.email.clone());
    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    let outcome = ctx
        .bulk_upload()
        .upload(&actor, &host_email, file, &Local)
        .await?;

    println!(
        "{} visits created for {} ({} new visitors)",
        outcome.visits_created, outcome.host.email, outcome.visitors_created
    );
    for row in &outcome.skipped {
        println!("Skipped line {}: {}", row.line, row.reason);
    }
    Ok(())
}
