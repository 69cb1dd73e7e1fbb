use clap::{Parser, Subcommand};
use sea_orm::Database;
use sea_orm_migration::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "migration", about = "Manage the splitwise database schema")]
struct Args {
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./splitwise.db?mode=rwc"
    )]
    database_url: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Copy, Debug, Default, Subcommand)]
enum Command {
    /// Apply every pending migration.
    #[default]
    Up,
    /// Roll back the last migration.
    Down,
    /// Drop every table and apply all migrations again.
    Fresh,
    /// Print applied and pending migrations.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let db = Database::connect(&args.database_url).await?;

    match args.command.unwrap_or_default() {
        Command::Up => migration::Migrator::up(&db, None).await?,
        Command::Down => migration::Migrator::down(&db, Some(1)).await?,
        Command::Fresh => migration::Migrator::fresh(&db).await?,
        Command::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}
