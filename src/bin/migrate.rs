use anyhow::{anyhow, Result};
use club_events_bot::config::Config;
use club_events_bot::database::connection::{database_file, DatabaseManager};
use std::env;
use std::io;

const TABLES: &[&str] = &["locations", "users", "events", "event_registrations"];

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("migrate");

    match command {
        "migrate" | "up" => run_migrations().await,
        "check" => check_database().await,
        "reset" => reset_database().await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            print_help();
            std::process::exit(1);
        }
    }
}

fn database_url() -> String {
    dotenvy::dotenv().ok();
    Config::database_url_from_env()
}

async fn run_migrations() -> Result<()> {
    println!("🔧 Club Events Bot - Database Migration Tool");
    println!("============================================");

    let url = database_url();
    println!("📊 Database URL: {}", mask_url(&url));
    println!("🚀 Running database migrations...");

    let db_manager = DatabaseManager::new(&url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

    match db_manager.run_migrations().await {
        Ok(()) => {
            println!("✅ Migrations completed successfully!");
        }
        Err(e) => {
            eprintln!("❌ Migration failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn check_database() -> Result<()> {
    println!("🔍 Checking database connection and schema...");

    let url = database_url();
    println!("📊 Database URL: {}", mask_url(&url));

    let db_manager = DatabaseManager::new(&url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

    match count_rows(&db_manager).await {
        Ok(counts) => {
            println!("✅ Database connection successful!");
            println!("📋 Tables:");
            for (table, count) in counts {
                println!("  • {table}: {count} rows");
            }
        }
        Err(e) => {
            println!("⚠️  Database check failed: {e}");
            println!("💡 Try running 'migrate up' to create the schema");
        }
    }

    Ok(())
}

async fn reset_database() -> Result<()> {
    println!("⚠️  WARNING: This will delete ALL data in the database!");
    println!("🤔 Are you sure you want to continue? (yes/no)");

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if input.trim().to_lowercase() != "yes" {
        println!("❌ Reset cancelled.");
        return Ok(());
    }

    let url = database_url();
    let path = database_file(&url)
        .ok_or_else(|| anyhow!("Reset is only supported for file-backed SQLite databases"))?;
    if path.exists() {
        std::fs::remove_file(&path)?;
        println!("🗑️  Deleted database file: {}", path.display());
    }

    println!("🔄 Recreating database schema...");
    run_migrations().await?;

    println!("✅ Database reset completed!");
    Ok(())
}

async fn count_rows(db_manager: &DatabaseManager) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&db_manager.pool)
            .await?;
        counts.push((*table, count));
    }
    Ok(counts)
}

fn mask_url(url: &str) -> String {
    match database_file(url) {
        Some(path) => match path.file_name() {
            Some(filename) => format!("sqlite:.../{}", filename.to_string_lossy()),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}

fn print_help() {
    println!("🏟 Club Events Bot - Database Migration Tool");
    println!();
    println!("USAGE:");
    println!("    migrate [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("    migrate, up    Run database migrations (default)");
    println!("    check          Check connection and count rows per table");
    println!("    reset          Reset database (SQLite only) - DESTRUCTIVE!");
    println!("    help           Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    DATABASE_URL   Database connection string (default: sqlite:./data/club.db)");
    println!();
}
