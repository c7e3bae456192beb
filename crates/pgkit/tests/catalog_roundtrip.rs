use futures_util::{StreamExt, TryStreamExt};
use pgkit::{
    ColumnKind, InsertQuery, Params, PgError, PgResult, QueryClient, Value, ddl, pg_query,
};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_postgres::NoTls;

fn database_url(test: &str) -> Option<String> {
    dotenvy::dotenv().ok();
    match std::env::var("DATABASE_URL") {
        Ok(v) => Some(v),
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            None
        }
    }
}

fn unique_table(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    format!("{prefix}_{}_{nanos}", std::process::id())
}

async fn connect(url: &str) -> PgResult<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(url, NoTls)
        .await
        .map_err(PgError::from_db_error)?;
    tokio::spawn(async move {
        let _ = connection.await;
    });
    Ok(client)
}

async fn current_database<C: QueryClient>(client: &C) -> PgResult<String> {
    let rows = pgkit::extract_rows(
        pg_query(client, "SELECT current_database() AS name", Params::Omitted).await?,
    )?;
    match rows[0].try_get("name")? {
        Value::Text(name) => Ok(name.clone()),
        other => Err(PgError::Other(format!("unexpected database name {other:?}"))),
    }
}

#[tokio::test]
async fn create_insert_and_introspect() -> PgResult<()> {
    let Some(url) = database_url("create_insert_and_introspect") else {
        return Ok(());
    };
    let client = connect(&url).await?;
    let db = current_database(&client).await?;
    let table = unique_table("pgkit_tags");

    let rows = ddl::create_table(
        &client,
        &table,
        &[
            "id serial".to_string(),
            format!("name {} NOT NULL", ddl::var_char(64)),
            ddl::primary_key(&["id"]),
            ddl::unique(&["name"]),
        ],
    )
    .await?;
    assert!(rows.is_empty());

    let tables = pgkit::list_tables(&db, &client).await?;
    assert!(
        tables
            .iter()
            .any(|r| r.get("table_name") == Some(&Value::from(table.as_str())))
    );

    let columns = pgkit::list_columns(&db, &client, &table).await?;
    assert_eq!(columns.len(), 2);

    let schema = pgkit::load_table_schema(&db, &client, &table).await?;
    assert_eq!(schema.get("id").map(|c| &c.kind), Some(&ColumnKind::Integer));
    assert_eq!(schema.get("name").map(|c| &c.kind), Some(&ColumnKind::String));

    let input = pgkit::validate_prop_vals_for_input(
        &schema,
        &["name", "not_a_column"],
        vec![Value::from("rust"), Value::from(1)],
    )?;
    let insert = InsertQuery::from_input(&table, input);

    let first = pgkit::insert_or_select_batch(&client, &[insert.clone()], &["id"]).await?;
    let again = pgkit::insert_or_select_batch(&client, &[insert], &["id"]).await?;
    assert_eq!(first, again);

    let sql = format!("SELECT id, name FROM {table} WHERE name = $1");
    let params = [Value::from("rust")];
    let streamed: Vec<pgkit::Row> = pgkit::query_stream(&client, &sql, &params)
        .try_collect()
        .await?;
    assert_eq!(streamed.len(), 1);
    assert_eq!(streamed[0].get("id"), first.first());

    pg_query(&client, &format!("DROP TABLE {table}"), Params::Omitted).await?;
    Ok(())
}

#[cfg(feature = "pool")]
#[tokio::test]
async fn pooled_checkout_runs_queries() -> PgResult<()> {
    let Some(url) = database_url("pooled_checkout_runs_queries") else {
        return Ok(());
    };
    let pool = pgkit::create_pool_with_config(&url, 2)?;

    let mut clients = pgkit::get_client_from(&pool);
    let checkout = clients
        .next()
        .await
        .ok_or_else(|| PgError::Other("pool stream ended without a client".into()))??;
    assert!(clients.next().await.is_none());

    let result = pg_query(&checkout, "SELECT $1::int8 AS n", Params::Bound(&[Value::Int(42)])).await?;
    let rows = pgkit::extract_rows(result)?;
    assert_eq!(rows[0].get("n"), Some(&Value::Int(42)));

    checkout.release();
    assert_eq!(pool.status().size, 1);
    Ok(())
}
