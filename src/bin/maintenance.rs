use std::env;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use contract_approval::{auth::password, config::AppConfig, db, users};

const USAGE: &str = "Usage: maintenance create-admin <username> <password> [email]\n       maintenance hash-password <password>";

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("create-admin") => {
            let username = args.next().context(USAGE)?;
            let password = args.next().context(USAGE)?;
            let email = args.next();
            create_admin(&username, &password, email)?
        }
        Some("hash-password") => {
            let password = args.next().context(USAGE)?;
            println!("{}", password::hash_password(&password)?);
        }
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
        None => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn create_admin(username: &str, password: &str, email: Option<String>) -> Result<()> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "maintenance",
        database_url = %config.redacted_database_url(),
        "loaded configuration"
    );
    let pool = db::init_pool(&config.database_url)?;
    let mut conn = pool.get().context("failed to get database connection")?;
    db::run_migrations(&mut conn)?;

    let email = email.unwrap_or_else(|| format!("{username}@localhost"));
    anyhow::ensure!(!password.is_empty(), "password must not be empty");
    match users::ensure_super_admin(&mut conn, username, &email, || {
        password::hash_password(password)
    })? {
        Some(user) => println!("Created SUPER_ADMIN {} ({})", user.username, user.id),
        None => println!("User {username} already exists; nothing to do."),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
