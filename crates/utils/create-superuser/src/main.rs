//! # Create Superuser Utility
//!
//! Creates an active, verified superuser, or promotes an existing account.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --package create-superuser --bin create_superuser [email] [password]
//! ```
//!
//! Missing arguments are prompted for. The program will:
//! 1. Load settings from the environment (and `.env`)
//! 2. Connect to the database and create the schema if needed
//! 3. Create the account, or ask for confirmation before promoting an existing one
//! 4. Release the database connections

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use lib_core::dto::{UserCreate, UserUpdate};
use lib_core::{init_settings, ModelManager};
use lib_web::auth::{LoggingUserEvents, UserManager, UserManagerError};

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    println!("============================================");
    println!("  Create Superuser Utility");
    println!("============================================");
    println!();

    let settings = init_settings().context("invalid configuration")?;

    let mut args = std::env::args().skip(1);
    let email = match args.next() {
        Some(email) => email,
        None => prompt("E-mail")?,
    };
    let password = match args.next() {
        Some(password) => password,
        None => prompt("Password")?,
    };
    if email.is_empty() || password.is_empty() {
        bail!("e-mail and password are required");
    }

    println!("Connecting to {}...", settings.database_url_redacted());
    let mm = ModelManager::new();
    mm.setup(settings).await?;
    mm.create_schema().await?;
    println!("Connected successfully.");
    println!();

    let users = UserManager::new(mm.clone(), settings, Arc::new(LoggingUserEvents));
    let result = run(&users, email, password).await;

    mm.teardown().await;
    result
}

async fn run(users: &UserManager, email: String, password: String) -> anyhow::Result<()> {
    let existing = match users.get_by_email(&email).await {
        Ok(user) => Some(user),
        Err(UserManagerError::UserNotExists) => None,
        Err(e) => return Err(e.into()),
    };

    let Some(user) = existing else {
        let mut create = UserCreate::new(email, password);
        create.is_active = Some(true);
        create.is_superuser = Some(true);
        create.is_verified = Some(true);

        let user = users.register(create, false).await?;
        println!("Superuser {} created ({}).", user.email, user.id);
        return Ok(());
    };

    println!("User {} already exists.", user.email);
    let answer = prompt("Promote to superuser and set the new password? (yes/no)")?.to_lowercase();
    if answer != "yes" && answer != "y" {
        println!("Operation cancelled.");
        return Ok(());
    }

    let update = UserUpdate {
        password: Some(password),
        is_active: Some(true),
        is_superuser: Some(true),
        is_verified: Some(true),
        ..Default::default()
    };
    let user = users.update(&user, update, false).await?;
    println!("User {} promoted to superuser.", user.email);

    Ok(())
}
