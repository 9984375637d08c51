use std::io::{self, Write};

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use quotes_api::auth::passwords::{PasswordService, validate_password_strength};

#[derive(Parser, Debug)]
#[command(name = "create_user", about = "Create a quotes API account")]
struct Args {
    /// Login name (case insensitive, must be unique).
    #[arg(long)]
    username: String,

    /// Plaintext password to hash and store for this user.
    #[arg(long)]
    password: String,

    /// Optional contact address.
    #[arg(long)]
    email: Option<String>,

    /// Grant administrator access.
    #[arg(long)]
    admin: bool,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let username = args.username.trim().to_string();

    if username.is_empty() {
        writeln!(io::stderr(), "error: username must not be empty")?;
        std::process::exit(1);
    }

    if let Err(err) = validate_password_strength(&username, &args.password) {
        writeln!(io::stderr(), "error: {err}")?;
        std::process::exit(1);
    }

    let email = args
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_lowercase);
    if let Some(email) = &email {
        if !email.contains('@') {
            writeln!(io::stderr(), "error: email must contain '@'")?;
            std::process::exit(1);
        }
    }

    let role = if args.admin { "admin" } else { "user" };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&args.database_url)
        .await?;
    quotes_api::db::run_migrations(&pool).await?;

    let mut tx = pool.begin().await?;

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE lower(username) = lower($1)",
    )
    .bind(&username)
    .fetch_one(&mut *tx)
    .await?;

    if existing > 0 {
        writeln!(
            io::stderr(),
            "error: a user named '{username}' already exists."
        )?;
        std::process::exit(1);
    }

    let password_hash = PasswordService::new()?.hash_password(&args.password)?;

    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (username, email, role, password_hash) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&username)
    .bind(email.as_ref())
    .bind(role)
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    println!("Created {role} user '{username}' with id {user_id}");
    Ok(())
}
