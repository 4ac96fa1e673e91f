use anyhow::Result;
use sea_orm::{Database, DatabaseConnection};

pub mod entity;

pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}
