//! Defines two related tables, fills them and runs an aliased join.
//!
//! ```sh
//! cargo run -p sqlight --example joins_alias -- --verbose
//! ```

use std::sync::Arc;

use clap::Parser;
use sqlx::Row;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sqlight::builder::{CompareOp, JoinKind};
use sqlight::schema::{ColumnOptions, ForeignKeyAction, ForeignKeyOptions};
use sqlight::{
    Database, DatabaseConfig, JoinOptions, QueryOps, SchemaObserver, TableColumns, ToSqlValue,
};

/// Aliased join walkthrough.
#[derive(Parser)]
#[command(name = "joins_alias")]
#[command(about, long_about = None)]
struct Cli {
    /// Database URL.
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite::memory:")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

/// Prints the column map of every defined table.
struct PrintColumns;

impl SchemaObserver for PrintColumns {
    fn table_defined(&self, table: &str, columns: &TableColumns) {
        match serde_json::to_string_pretty(columns) {
            Ok(json) => println!("{table}: {json}"),
            Err(e) => eprintln!("{table}: {e}"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = DatabaseConfig::new().url(cli.database);
    let mut db = Database::connect(&config).await?;
    db.registry().set_observer(Arc::new(PrintColumns));

    db.create_table_with("user", |t| {
        t.id();
        t.text_column("name", ColumnOptions::new());
        t.timestamp_columns();
        Ok(())
    })
    .await?;
    db.create_table_with("product", |t| {
        t.id();
        t.text_column("name", ColumnOptions::new());
        t.foreign_key_column(
            "user_id",
            "user.id",
            ForeignKeyOptions::new().on_delete(ForeignKeyAction::Cascade),
        )?;
        Ok(())
    })
    .await?;

    for name in ["Ann", "Bob"] {
        db.insert("user", [("name", name)]).execute().await?;
    }
    for (name, owner) in [("Lamp", 1_i64), ("Desk", 1), ("Chair", 2)] {
        db.insert(
            "product",
            [("name", name.to_sql_value()), ("user_id", owner.to_sql_value())],
        )
        .execute()
        .await?;
    }

    let options = JoinOptions::new()
        .kind(JoinKind::Left)
        .comparison(CompareOp::Eq)
        .alias("product", "P")
        .alias("user", "U");
    let rows = db
        .select(&["U.name AS user_name", "P.name AS product_name"])
        .from("user")
        .join("P.user_id", "U.id", &options)?
        .run()
        .await?;
    info!(rows = rows.len(), "Fetched joined rows");
    for row in &rows {
        let user: String = row.try_get("user_name")?;
        let product: String = row.try_get("product_name")?;
        println!("{user:>6} owns {product}");
    }

    Ok(())
}
