use auth::Role;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;
use visits::VisitStatus;

use crate::router::Route;

#[derive(Debug, Parser)]
#[command(name = "vms", about = "Visitor management desk", long_about = None)]
pub struct Cli {
    /// Settings file read before `VMS_*` environment variables
    #[arg(long, global = true, env = "VMS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and remember the session
    Login(LoginArgs),
    /// Create a host account
    Signup(SignupArgs),
    /// Sign out and forget the session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List departments
    Departments,
    /// Request a visit
    RequestVisit(RequestVisitArgs),
    /// Show approved visits that are still valid
    Display(DisplayArgs),
    /// Show today's statistics
    Dashboard(DashboardArgs),
    /// Register a walk-in visitor
    RegisterVisitor(RegisterVisitorArgs),
    /// Invite a visitor ahead of time
    PreRegister(PreRegisterArgs),
    /// Create visits from a CSV file
    BulkUpload(BulkUploadArgs),
    /// Review and act on visits
    Approvals(ApprovalsCommand),
    /// Manage user accounts
    Users(UsersCommand),
    /// Browse the visit log
    Logs(LogsArgs),
}

impl Commands {
    /// Screen the command belongs to
    pub fn route(&self) -> Route {
        match self {
            Commands::Login(_) | Commands::Logout | Commands::Whoami => Route::Login,
            Commands::Signup(_) | Commands::Departments => Route::Signup,
            Commands::RequestVisit(_) => Route::RequestVisit,
            Commands::Display(_) => Route::Display,
            Commands::Dashboard(_) => Route::Dashboard,
            Commands::RegisterVisitor(_) => Route::Register,
            Commands::PreRegister(_) => Route::PreRegister,
            Commands::BulkUpload(_) => Route::BulkUpload,
            Commands::Approvals(_) => Route::Approval,
            Commands::Users(_) => Route::Users,
            Commands::Logs(_) => Route::Logs,
        }
    }
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "VMS_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct SignupArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "VMS_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Repeat of the password
    #[arg(long)]
    pub confirm_password: String,

    /// Department UUID, see `vms departments`
    #[arg(long)]
    pub department: Option<Uuid>,
}

#[derive(Debug, Args)]
pub struct RequestVisitArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub purpose: String,

    /// Email of the host to visit
    #[arg(long)]
    pub host_email: Option<String>,

    /// RFC 3339 instant the pass expires
    #[arg(long)]
    pub valid_until: DateTime<Utc>,

    #[arg(long)]
    pub check_in: Option<DateTime<Utc>>,

    #[arg(long)]
    pub check_out: Option<DateTime<Utc>>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Visitor photo to upload
    #[arg(long)]
    pub photo: Option<PathBuf>,

    /// Write the visit pass PNG here
    #[arg(long)]
    pub qr_out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DisplayArgs {
    /// Keep refreshing on the display schedule
    #[arg(long)]
    pub watch: bool,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Keep refreshing on the poll schedule and on visit changes
    #[arg(long)]
    pub watch: bool,

    /// List today's visits behind one card
    #[arg(long)]
    pub status: Option<VisitStatus>,
}

#[derive(Debug, Args)]
pub struct RegisterVisitorArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: String,

    #[arg(long)]
    pub purpose: String,

    #[arg(long)]
    pub host_email: String,

    #[arg(long)]
    pub valid_until: DateTime<Utc>,

    #[arg(long)]
    pub photo: Option<PathBuf>,

    #[arg(long)]
    pub qr_out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PreRegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub purpose: String,

    /// Defaults to the signed-in user
    #[arg(long)]
    pub host_email: Option<String>,

    /// Local date of the visit, YYYY-MM-DD
    #[arg(long)]
    pub date: NaiveDate,

    /// Local check-in time, HH:MM[:SS]
    #[arg(long)]
    pub time: NaiveTime,

    #[arg(long)]
    pub photo: Option<PathBuf>,

    #[arg(long)]
    pub qr_out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct BulkUploadArgs {
    /// CSV with columns name,email,phone,purpose,valid_until
    pub file: PathBuf,

    /// Defaults to the signed-in user
    #[arg(long)]
    pub host_email: Option<String>,
}

#[derive(Debug, Args)]
pub struct ApprovalsCommand {
    #[command(subcommand)]
    pub command: ApprovalsSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ApprovalsSubcommand {
    /// Pending visits
    List {
        /// Filter on visitor name, email or purpose
        #[arg(long)]
        search: Option<String>,
    },
    Approve(VisitIdArgs),
    Deny(VisitIdArgs),
    Complete(VisitIdArgs),
    Cancel(VisitIdArgs),
    CheckIn(VisitIdArgs),
}

#[derive(Debug, Args)]
pub struct VisitIdArgs {
    pub visit_id: Uuid,

    /// Write the regenerated pass PNG here
    #[arg(long)]
    pub qr_out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct UsersCommand {
    #[command(subcommand)]
    pub command: UsersSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersSubcommand {
    List {
        /// Filter on name or email
        #[arg(long)]
        search: Option<String>,
    },
    Add(AddUserArgs),
}

#[derive(Debug, Args)]
pub struct AddUserArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "VMS_NEW_USER_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub confirm_password: String,

    /// admin, guard or host
    #[arg(long)]
    pub role: Role,

    #[arg(long)]
    pub department: Uuid,
}

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Filter on visitor or host name
    #[arg(long)]
    pub search: Option<String>,

    /// Only visits created on this local date, YYYY-MM-DD
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Write the listed entries to a CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_approval_action() {
        let cli = Cli::try_parse_from([
            "vms",
            "approvals",
            "approve",
            "7a0e7a5c-7f57-4c36-a3ff-5d0c58d9e7c1",
        ])
        .unwrap();

        assert_eq!(cli.command.route(), Route::Approval);
        match cli.command {
            Commands::Approvals(ApprovalsCommand {
                command: ApprovalsSubcommand::Approve(args),
            }) => assert_eq!(args.visit_id.to_string(), "7a0e7a5c-7f57-4c36-a3ff-5d0c58d9e7c1"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_dashboard_status() {
        let cli = Cli::try_parse_from(["vms", "dashboard", "--status", "completed"]).unwrap();
        match cli.command {
            Commands::Dashboard(args) => {
                assert_eq!(args.status, Some(VisitStatus::Completed));
                assert!(!args.watch);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_pre_register_date_and_time() {
        let cli = Cli::try_parse_from([
            "vms",
            "pre-register",
            "--name",
            "Ada",
            "--email",
            "ada@example.com",
            "--purpose",
            "Seminar",
            "--date",
            "2024-03-10",
            "--time",
            "09:30:00",
        ])
        .unwrap();

        assert_eq!(cli.command.route(), Route::PreRegister);
    }
}
