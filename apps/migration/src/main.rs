//! Migration CLI tool: `migration up`, `migration down`, `migration status`...

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter("info,sea_orm_migration=info")
        .init();

    cli::run_cli(migration::Migrator).await;
}
