//! Create the first admin account.
//!
//! Reads the username and password from stdin and inserts an active admin
//! unless the username is already taken.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};
use sqlx::postgres::PgPoolOptions;

use events_planner::{config::AppConfig, repository::Repository, services::Services};

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, label: &str) -> anyhow::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let line = lines.next().context("Unexpected end of input")??;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("Failed to load configuration")?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let username = prompt(&mut lines, "Admin username")?;
    let password = prompt(&mut lines, "Admin password")?;
    if username.is_empty() || password.is_empty() {
        bail!("Username and password are required");
    }

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let services = Services::new(Repository::new(pool), &config);
    match services.users.create_admin(&username, &password).await? {
        Some(user) => println!("Admin user created with ID: {}", user.id),
        None => println!("User already exists."),
    }

    Ok(())
}
