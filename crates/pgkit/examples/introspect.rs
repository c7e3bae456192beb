//! List the tables of the configured database and the columns of each.
//!
//! ```text
//! DATABASE_URL=postgres://localhost/app cargo run -p pgkit --example introspect
//! ```

use futures_util::StreamExt;
use pgkit::{Params, PgError, PgResult, PoolConfig, Value};

#[tokio::main]
async fn main() -> PgResult<()> {
    dotenvy::dotenv().ok();

    let config = PoolConfig::from_env()?;
    let pool = pgkit::create_pool_from_config(&config)?;

    let client = pgkit::get_client_from(&pool)
        .next()
        .await
        .ok_or_else(|| PgError::Other("no client".into()))??;

    let db = match pgkit::extract_rows(
        pgkit::pg_query(&client, "SELECT current_database() AS name", Params::Omitted).await?,
    )?[0]
        .try_get("name")?
    {
        Value::Text(name) => name.clone(),
        other => return Err(PgError::Other(format!("unexpected database name {other:?}"))),
    };

    println!("database: {db}");
    let tables = match pgkit::list_tables(&db, &client).await {
        Ok(rows) => rows,
        Err(e) if e.is_invalid_result() => Vec::new(),
        Err(e) => return Err(e),
    };
    for table in tables {
        let Some(Value::Text(name)) = table.get("table_name") else {
            continue;
        };
        let schema = pgkit::load_table_schema(&db, &client, name).await?;
        println!("\n{name}");
        for (column, def) in &schema.columns {
            println!("  {column:<32} {}", def.kind);
        }
    }

    client.release();
    Ok(())
}
