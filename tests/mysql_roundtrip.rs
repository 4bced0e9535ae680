//! Round trip against a live MySQL database.
//!
//! Run with: DATABASE_URL="mysql://root@127.0.0.1/dbrest" cargo test --test mysql_roundtrip -- --ignored

use dbrest::{CrudService, Database, MySqlDatabase, TableDescriptor};
use std::collections::HashMap;
use serde_json::json;
use sqlx::mysql::MySqlPoolOptions;

async fn database() -> MySqlDatabase {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
    let pool = MySqlPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("failed to connect to test database");
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS dbrest_roundtrip (id INT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(64), note TEXT NULL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    MySqlDatabase::from_pool(pool)
}

#[tokio::test]
#[ignore]
async fn insert_select_delete_count() {
    let db = database().await;
    let tables = db.tables().await.unwrap();
    let by_name: HashMap<String, TableDescriptor> =
        tables.iter().map(|t| (t.name.clone(), t.clone())).collect();
    let table = by_name.get("dbrest_roundtrip").expect("table introspected");
    assert_eq!(table.primary_keys, vec!["id".to_string()]);
    assert!(table.columns[0].is_auto_increment);

    let empty = json!({}).as_object().cloned().unwrap();
    let before = CrudService::count(&db, &by_name, table, &empty).await.unwrap();

    let name = format!("ada-{}", uuid::Uuid::new_v4());
    let row = json!({"name": name}).as_object().cloned().unwrap();
    let id = CrudService::insert(&db, &by_name, table, &row).await.unwrap();
    assert!(id > 0);

    let rows = CrudService::select(&db, &by_name, table, &row).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id"), Some(&id.to_string()));
    assert_eq!(rows[0].get("note").map(String::as_str), Some(""));

    let by_id = json!({"id": id}).as_object().cloned().unwrap();
    assert_eq!(CrudService::delete(&db, &by_name, table, &by_id).await.unwrap(), 1);
    assert_eq!(CrudService::count(&db, &by_name, table, &empty).await.unwrap(), before);
}

#[tokio::test]
#[ignore]
async fn rollback_and_dropped_transaction_leave_no_rows() {
    let db = database().await;
    let count_sql = "SELECT COUNT(*) AS n FROM dbrest_roundtrip";
    let count = |rows: Vec<dbrest::service::Row>| rows[0]["n"].parse::<i64>().unwrap();

    let mut reader = db.session().await.unwrap();
    let before = count(reader.query(count_sql, &[]).await.unwrap());

    let mut session = db.session().await.unwrap();
    session.begin().await.unwrap();
    session
        .exec("INSERT INTO dbrest_roundtrip (name) VALUES (?)", &["rolled-back".into()])
        .await
        .unwrap();
    session.rollback().await.unwrap();
    assert_eq!(count(session.query(count_sql, &[]).await.unwrap()), before);
    drop(session);

    let mut session = db.session().await.unwrap();
    session.begin().await.unwrap();
    session
        .exec("INSERT INTO dbrest_roundtrip (name) VALUES (?)", &["dropped".into()])
        .await
        .unwrap();
    drop(session);

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(count(reader.query(count_sql, &[]).await.unwrap()), before);
}
