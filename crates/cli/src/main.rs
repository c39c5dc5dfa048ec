//! DeadForest CLI - admin tools over the backend API.
//!
//! # Usage
//!
//! ```bash
//! # Credentials come from flags or the environment
//! export API_URL=http://127.0.0.1:8000 DF_EMAIL=admin@example.com DF_PASSWORD=...
//!
//! df-cli users list
//! df-cli users promote ada@example.com
//! df-cli logs tail --limit 50 --level ERROR
//! df-cli logs summary
//! df-cli promo create SPRING --discount 15 --max-uses 100
//! df-cli sales --period week --range 90d
//! ```
//!
//! # Commands
//!
//! - `users` - List users, change roles, reset passwords
//! - `logs` - Tail, summarize and clear the backend log buffer
//! - `promo` - List, create and delete promo codes
//! - `sales` - Revenue and orders per period

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use deadforest_core::{PromoCodeId, SalesPeriod};
use secrecy::SecretString;

mod commands;

use commands::{CliError, Credentials, Session};

#[derive(Parser)]
#[command(name = "df-cli")]
#[command(author, version, about = "DeadForest admin CLI")]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "API_URL", default_value = "http://127.0.0.1:8000", global = true)]
    api_url: String,

    /// Admin email
    #[arg(long, env = "DF_EMAIL", global = true)]
    email: Option<String>,

    /// Admin password
    #[arg(long, env = "DF_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Inspect or clear backend logs
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },
    /// Manage promo codes
    Promo {
        #[command(subcommand)]
        action: PromoAction,
    },
    /// Show sales per period
    Sales {
        /// Bucket size (day, week, month, year)
        #[arg(short, long, default_value = "month")]
        period: SalesPeriod,

        /// Range (7d, 30d, 90d, 365d)
        #[arg(short, long, default_value = "30d")]
        range: String,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List all users
    List,
    /// Grant the admin role
    Promote { email: String },
    /// Remove the admin role
    Demote { email: String },
    /// Set a user's password
    ResetPassword {
        email: String,

        /// New password (at least 6 characters)
        #[arg(long = "new-password")]
        new_password: String,
    },
}

#[derive(Subcommand)]
enum LogsAction {
    /// Print recent entries
    Tail {
        #[arg(short, long)]
        limit: Option<u32>,
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        actor_id: Option<i64>,
        #[arg(long)]
        target: Option<String>,
        /// `key=value` terms matched against structured extras
        #[arg(long)]
        extras: Option<String>,
        /// Only this level (INFO, WARNING, ERROR)
        #[arg(long)]
        level: Option<String>,
    },
    /// Counts per level and top events
    Summary {
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Clear the log buffer
    Clear,
}

#[derive(Subcommand)]
enum PromoAction {
    /// List promo codes
    List,
    /// Create a promo code
    Create {
        code: String,

        /// Percentage off (0-100)
        #[arg(short, long)]
        discount: String,

        #[arg(long)]
        max_uses: Option<String>,

        /// UTC expiry, e.g. 2025-06-01T00:00
        #[arg(long)]
        expires_at: Option<String>,
    },
    /// Delete a promo code
    Delete { id: PromoCodeId },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let session = Session::login(Credentials {
        api_url: cli.api_url,
        email: cli.email,
        password: cli.password.map(SecretString::from),
    })
    .await?;

    match cli.command {
        Commands::Users { action } => match action {
            UsersAction::List => commands::users::list(&session).await?,
            UsersAction::Promote { email } => commands::users::promote(&session, &email).await?,
            UsersAction::Demote { email } => commands::users::demote(&session, &email).await?,
            UsersAction::ResetPassword {
                email,
                new_password,
            } => commands::users::reset_password(&session, &email, &new_password).await?,
        },
        Commands::Logs { action } => match action {
            LogsAction::Tail {
                limit,
                event,
                actor_id,
                target,
                extras,
                level,
            } => {
                let options = commands::logs::TailOptions {
                    limit,
                    event,
                    actor_id,
                    target,
                    extras,
                    level,
                };
                commands::logs::tail(&session, &options).await?;
            }
            LogsAction::Summary { limit } => commands::logs::summary(&session, limit).await?,
            LogsAction::Clear => commands::logs::clear(&session).await?,
        },
        Commands::Promo { action } => match action {
            PromoAction::List => commands::promo::list(&session).await?,
            PromoAction::Create {
                code,
                discount,
                max_uses,
                expires_at,
            } => {
                commands::promo::create(
                    &session,
                    &code,
                    &discount,
                    max_uses.as_deref(),
                    expires_at.as_deref(),
                )
                .await?;
            }
            PromoAction::Delete { id } => commands::promo::delete(&session, id).await?,
        },
        Commands::Sales { period, range } => {
            commands::sales::report(&session, period, Some(&range)).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_logs_tail() {
        let cli = Cli::try_parse_from([
            "df-cli", "logs", "tail", "--limit", "20", "--level", "ERROR", "--actor-id", "7",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Logs {
                action: LogsAction::Tail {
                    limit: Some(20),
                    actor_id: Some(7),
                    ..
                }
            }
        ));
    }

    #[test]
    fn test_parse_sales_period() {
        let cli = Cli::try_parse_from(["df-cli", "sales", "--period", "week"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Sales {
                period: SalesPeriod::Week,
                ..
            }
        ));
    }
}
