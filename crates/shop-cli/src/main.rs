//! Storefront CLI - operator commands
//!
//! Usage:
//!   shop migrate
//!   shop seed
//!   shop hash-password <password>

use anyhow::Context;
use clap::{Parser, Subcommand};
use shop_api::auth::password::{hash_password, hash_password_with_config, PasswordConfig};
use shop_core::{AppConfig, NewUser, PgStore, ShopError, UserRepository};

#[derive(Parser)]
#[command(name = "shop")]
#[command(about = "Storefront operator CLI")]
#[command(version)]
struct Cli {
    /// PostgreSQL URL (defaults to DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Create the sample user accounts (skips ones that already exist)
    Seed,
    /// Print the Argon2id PHC hash of a password
    HashPassword {
        /// Plaintext password
        password: String,
    },
}

/// Sample accounts: (name, email, password)
const SAMPLE_USERS: &[(&str, &str, &str)] = &[
    ("Alice Nguyen", "alice@example.com", "123456"),
    ("Bob Tran", "bob@example.com", "654321"),
    ("Charlie Le", "charlie@example.com", "abcdef"),
];

#[derive(Debug, Default, PartialEq, Eq)]
struct SeedReport {
    created: usize,
    skipped: usize,
}

/// Create the sample users with hashed passwords
async fn seed_users(
    users: &dyn UserRepository,
    passwords: &PasswordConfig,
) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    for (name, email, password) in SAMPLE_USERS {
        let password_hash = hash_password_with_config(password, passwords)
            .with_context(|| format!("Failed to hash password for {email}"))?;

        let result = users
            .create_user(NewUser {
                email: email.to_string(),
                password_hash,
                name: Some(name.to_string()),
            })
            .await;

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, email = %email, "Created user");
                report.created += 1;
            }
            Err(ShopError::DuplicateUser) => {
                tracing::info!(email = %email, "User already exists, skipping");
                report.skipped += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to create {email}")),
        }
    }

    Ok(report)
}

async fn connect(database_url: Option<String>) -> anyhow::Result<PgStore> {
    let config = AppConfig::from_env()?;
    let url = database_url.unwrap_or(config.database.postgres_url);

    PgStore::new(&url, config.database.postgres_pool_size)
        .await
        .context("Failed to connect to PostgreSQL")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shop=info,shop_core=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => {
            let store = connect(cli.database_url).await?;
            store.migrate().await.context("Failed to run migrations")?;
            println!("Migrations applied");
        }
        Commands::Seed => {
            let store = connect(cli.database_url).await?;
            store.migrate().await.context("Failed to run migrations")?;
            let report = seed_users(&store, &PasswordConfig::default()).await?;
            println!(
                "Seeding finished: {} created, {} already present",
                report.created, report.skipped
            );
        }
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
        }
    }

    Ok(())
}
