//! Table rendering for terminal output

use auth::{Department, Host};
use chrono::{DateTime, Local, Utc};
use dashboard::DashboardStats;
use tabled::builder::Builder;
use tabled::settings::Style;
use visits::display::DisplayEntry;
use visits::logs::LogEntry;
use visits::VisitDetails;

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

fn local(instant: &DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn local_or_dash(instant: Option<&DateTime<Utc>>) -> String {
    instant.map(local).unwrap_or_else(|| "-".to_string())
}

pub fn visits_table(visits: &[&VisitDetails]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Visit", "Visitor", "Email", "Host", "Purpose", "Status", "Valid until"]);
    for visit in visits {
        builder.push_record([
            visit.visit.id.to_string(),
            visit.visitor_name().to_string(),
            visit.visitor_email().to_string(),
            visit.host_name().to_string(),
            visit.visit.purpose.clone(),
            visit.visit.status.to_string(),
            local(&visit.visit.valid_until),
        ]);
    }
    render(builder)
}

pub fn display_table(entries: &[DisplayEntry]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Visitor", "Host", "Purpose", "Valid until", "Checked in"]);
    for entry in entries {
        builder.push_record([
            entry.visitor_name.clone(),
            entry.host_name.clone(),
            entry.purpose.clone(),
            local(&entry.valid_until),
            if entry.checked_in { "yes" } else { "no" }.to_string(),
        ]);
    }
    render(builder)
}

pub fn logs_table(entries: &[&LogEntry]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Visitor", "Host", "Purpose", "Status", "Created", "Check in", "Check out"]);
    for entry in entries {
        builder.push_record([
            entry.visitor_name.clone(),
            entry.host_name.clone(),
            entry.purpose.clone(),
            entry.status.to_string(),
            local(&entry.created_at),
            local_or_dash(entry.check_in_time.as_ref()),
            local_or_dash(entry.check_out_time.as_ref()),
        ]);
    }
    render(builder)
}

pub fn users_table(users: &[&Host]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Name", "Email", "Role", "Active"]);
    for user in users {
        builder.push_record([
            user.name.clone(),
            user.email.clone(),
            user.role.to_string(),
            user.active.to_string(),
        ]);
    }
    render(builder)
}

pub fn departments_table(departments: &[Department]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Id", "Name"]);
    for department in departments {
        builder.push_record([department.id.to_string(), department.name.clone()]);
    }
    render(builder)
}

pub fn stats_table(stats: &DashboardStats) -> String {
    let mut builder = Builder::default();
    builder.push_record(["", "Count", "Period"]);
    for card in &stats.cards {
        let period = if card.counts_today() { "Today" } else { "All time" };
        builder.push_record([
            card.label.to_string(),
            card.value.to_string(),
            period.to_string(),
        ]);
    }
    render(builder)
}
