use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt};

mod db;
mod env;

use env::EnvTarget;

/// Local database chores for the dominia server.
///
/// - dev-vars: copy the server's variables from `.env` into a dev vars file
/// - prepare-test: recreate and migrate the test databases
/// - drop: drop `POSTGRES_DB`
/// - clean: drop every table of the database named in `.env` / `.env.test`
#[derive(Parser, Debug)]
#[command(name = "dbctl", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the server's variables from `.env` into a dev vars file
    DevVars {
        /// Source dotenv file
        #[arg(long, value_name = "FILE", default_value = ".env")]
        input: PathBuf,

        /// Destination file (overwritten)
        #[arg(long, value_name = "FILE", default_value = ".dev.vars")]
        output: PathBuf,
    },

    /// Drop, create and migrate the test databases on POSTGRES_URL
    PrepareTest {
        /// Databases to recreate
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "test_1,test_2,test_3,test_4"
        )]
        databases: Vec<String>,

        /// Migrations directory
        #[arg(long, value_name = "DIR", default_value = "./migrations")]
        migrations: PathBuf,
    },

    /// Drop POSTGRES_DB on POSTGRES_URL if it exists
    Drop,

    /// Drop all tables in DATABASE_URL and clear the migration history
    Clean {
        /// Which dotenv file supplies DATABASE_URL
        #[arg(long, value_enum, default_value_t = EnvTarget::Dev)]
        env: EnvTarget,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    match args.command {
        Command::DevVars { input, output } => dev_vars(input, output),
        Command::PrepareTest {
            databases,
            migrations,
        } => {
            let server_url = env::require("POSTGRES_URL")?;
            db::prepare_test_databases(&server_url, &databases, &migrations).await?;
            println!("Prepared {} test database(s)", databases.len());
            Ok(())
        }
        Command::Drop => {
            let server_url = env::require("POSTGRES_URL")?;
            let name = env::require("POSTGRES_DB")?;
            if db::drop_database(&server_url, &name).await? {
                println!("Dropped database {name}");
            } else {
                println!("Database {name} does not exist, nothing to drop");
            }
            Ok(())
        }
        Command::Clean { env: target } => clean(target).await,
    }
}

fn dev_vars(input: PathBuf, output: PathBuf) -> Result<()> {
    let vars = env::read_file(&input)?;

    let (content, included) = match env::render_dev_vars(|key| vars.get(key).cloned()) {
        Ok(rendered) => rendered,
        Err(missing) => bail!(
            "{} is missing required variables: {}",
            input.display(),
            missing.join(", ")
        ),
    };

    fs::write(&output, format!("{content}\n"))
        .with_context(|| format!("cannot write {}", output.display()))?;

    println!("Wrote {} variable(s) to {}", included.len(), output.display());
    for key in included {
        println!("  {key}");
    }
    Ok(())
}

async fn clean(target: EnvTarget) -> Result<()> {
    let path = PathBuf::from(target.file_name());
    let vars = env::read_file(&path)?;
    let database_url = vars
        .get("DATABASE_URL")
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("DATABASE_URL is not set in {}", path.display()))?;

    println!("[{}] cleaning database", target.label());

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await
        .context("cannot connect to DATABASE_URL")?;

    let dropped = db::clean(&pool).await?;
    pool.close().await;

    for table in &dropped {
        println!("  dropped {table}");
    }
    println!("[{}] dropped {} table(s)", target.label(), dropped.len());
    Ok(())
}
