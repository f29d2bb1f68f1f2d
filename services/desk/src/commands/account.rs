use anyhow::Result;
use auth::accounts::search_users;
use auth::validation::{NewUserForm, SignupForm};
use tracing::warn;

use crate::cli::{LoginArgs, SignupArgs, UsersCommand, UsersSubcommand};
use crate::context::AppContext;
use crate::output::{departments_table, users_table};
use crate::router::{Route, after_logout};

pub async fn login(ctx: &AppContext, args: LoginArgs) -> Result<()> {
    ctx.open(Route::Login).await?;
    let user = ctx.auth.login(&args.email, &args.password).await?;
    println!("Signed in as {} ({})", user.name, user.role);
    Ok(())
}

pub async fn signup(ctx: &AppContext, args: SignupArgs) -> Result<()> {
    ctx.open(Route::Signup).await?;
    let form = SignupForm {
        email: args.email,
        password: args.password,
        confirm_password: args.confirm_password,
        name: args.name,
        department_id: args.department,
    };

    let host = ctx.auth.signup(&form).await?;
    println!("Account created for {}. Sign in with `vms login`.", host.email);
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    if let Err(e) = ctx.auth.initialize().await {
        warn!("No session to restore: {}", e);
    }

    let result = ctx.auth.logout().await;
    println!("Signed out. Next: {}", after_logout());
    Ok(result?)
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.open(Route::Login).await? {
        Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
        None => println!("Not signed in"),
    }
    Ok(())
}

pub async fn departments(ctx: &AppContext) -> Result<()> {
    ctx.open(Route::Signup).await?;
    let departments = ctx.user_management().list_departments().await?;
    println!("{}", departments_table(&departments));
    Ok(())
}

pub async fn users(ctx: &AppContext, command: UsersCommand) -> Result<()> {
    let actor = ctx.open_private(Route::Users).await?;
    let management = ctx.user_management();

    match command.command {
        UsersSubcommand::List { search } => {
            let users = management.list_users().await?;
            let matching = search_users(&users, search.as_deref().unwrap_or_default());
            println!("{}", users_table(&matching));
        }
        UsersSubcommand::Add(args) => {
            let form = NewUserForm {
                name: args.name,
                email: args.email,
                password: args.password,
                password_confirm: args.confirm_password,
                role: args.role,
                department_id: args.department,
            };
            let user = management.create_user(&actor, &form).await?;
            println!("User {} added as {}", user.email, user.role);
        }
    }
    Ok(())
}
