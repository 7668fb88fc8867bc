use std::io::{self, Write};

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use wayfarer_api::auth::passwords::PasswordService;
use wayfarer_api::auth::responses::Role;

#[derive(Parser, Debug)]
#[command(name = "create_user", about = "Create a Wayfarer user account")]
struct Args {
    /// Username for the account.
    #[arg(long)]
    username: String,

    /// Email address for the account (stored lowercase).
    #[arg(long)]
    email: String,

    /// Plaintext password to hash and store for this user.
    #[arg(long)]
    password: String,

    /// Role to assign (`user`, `moderator`, or `admin`). Admins also
    /// receive the user role.
    #[arg(long, default_value = "user")]
    role: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let email = args.email.trim().to_lowercase();

    if !email.contains('@') {
        writeln!(io::stderr(), "error: email must contain '@'")?;
        std::process::exit(1);
    }

    let roles: Vec<Role> = match args.role.trim().to_lowercase().as_str() {
        "admin" => vec![Role::User, Role::Admin],
        "moderator" => vec![Role::User, Role::Moderator],
        "user" => vec![Role::User],
        other => {
            writeln!(
                io::stderr(),
                "error: unsupported role '{other}'. Use 'user', 'moderator', or 'admin'."
            )?;
            std::process::exit(1);
        }
    };

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE username = $1 OR lower(email) = $2",
    )
    .bind(&args.username)
    .bind(&email)
    .fetch_one(&pool)
    .await?;

    if existing > 0 {
        writeln!(
            io::stderr(),
            "error: a user with that username or email already exists."
        )?;
        std::process::exit(1);
    }

    let password_service = PasswordService::new().map_err(|err| {
        io::Error::new(io::ErrorKind::Other, format!("argon2 init failed: {err}"))
    })?;
    let password_hash = password_service
        .hash_password(&args.password)
        .map_err(|err| {
            io::Error::new(io::ErrorKind::Other, format!("password hash failed: {err}"))
        })?;

    let wire_roles: Vec<String> = roles.iter().map(|r| r.as_wire().to_string()).collect();

    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (username, email, password_hash, roles) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&args.username)
    .bind(&email)
    .bind(&password_hash)
    .bind(&wire_roles)
    .fetch_one(&pool)
    .await?;

    println!(
        "Created {} user '{}' with id {user_id}",
        args.role.trim().to_lowercase(),
        args.username
    );
    Ok(())
}
