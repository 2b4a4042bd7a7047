//! Failure envelopes that need no running server.
//!
//! Nothing listens on 127.0.0.1:1, so every connect is refused. The pool
//! connect deadline is shortened to keep the tests fast.

use mysql_mcp_server::config::{ConnectionResolver, ENV_PASSWORD, PoolSettings, StaticDefaults};
use mysql_mcp_server::db::PoolRegistry;
use mysql_mcp_server::models::ConnectionOverrides;
use mysql_mcp_server::tools::{
    ExecuteInput, QueryInput, QueryToolHandler, SchemaInput, SchemaToolHandler, WriteToolHandler,
};
use std::sync::Arc;
use std::time::Duration;

const PASSWORD: &str = "s3cret-pw";
const CONNECTION: &str = "root@127.0.0.1:1/(no database)";
const REFUSED_HINT: &str = "Check that MySQL is running and the host/port are correct.";

fn setup() -> (Arc<PoolRegistry>, Arc<ConnectionResolver>) {
    let registry = Arc::new(PoolRegistry::with_settings(PoolSettings {
        connect_timeout: Duration::from_secs(1),
        ..PoolSettings::default()
    }));
    let resolver = Arc::new(ConnectionResolver::new(Arc::new(
        StaticDefaults::new().with(ENV_PASSWORD, PASSWORD),
    )));
    (registry, resolver)
}

fn unreachable() -> ConnectionOverrides {
    ConnectionOverrides {
        host: Some("127.0.0.1".to_string()),
        port: Some(1),
        ..Default::default()
    }
}

fn schema_input(action: &str) -> SchemaInput {
    serde_json::from_value(serde_json::json!({
        "action": action,
        "host": "127.0.0.1",
        "port": 1,
    }))
    .unwrap()
}

#[tokio::test]
async fn query_reports_refused_connection() {
    let (registry, resolver) = setup();
    let handler = QueryToolHandler::new(registry, resolver);

    let err = handler
        .query(QueryInput {
            sql: "SELECT 1".to_string(),
            connection: unreachable(),
        })
        .await
        .unwrap_err();

    assert!(
        err.error.starts_with(&format!("Connection failed to {CONNECTION}: ")),
        "unexpected error: {}",
        err.error
    );
    assert_eq!(err.hint.as_deref(), Some(REFUSED_HINT));
    assert_eq!(err.code.as_deref(), Some("ECONNREFUSED"));
    assert_eq!(err.connection, CONNECTION);

    let rendered = serde_json::to_string(&err).unwrap();
    assert!(!rendered.contains(PASSWORD));
}

#[tokio::test]
async fn execute_reports_refused_connection() {
    let (registry, resolver) = setup();
    let handler = WriteToolHandler::new(registry, resolver);

    let err = handler
        .execute(ExecuteInput {
            sql: "DELETE FROM t".to_string(),
            connection: unreachable(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.hint.as_deref(), Some(REFUSED_HINT));
    assert_eq!(err.connection, CONNECTION);
    assert!(!serde_json::to_string(&err).unwrap().contains(PASSWORD));
}

#[tokio::test]
async fn schema_reports_refused_connection() {
    let (registry, resolver) = setup();
    let handler = SchemaToolHandler::new(registry, resolver);

    let err = handler
        .schema(schema_input("list_databases"))
        .await
        .unwrap_err();

    assert_eq!(err.hint.as_deref(), Some(REFUSED_HINT));
    assert_eq!(err.connection, CONNECTION);
}

#[tokio::test]
async fn validation_happens_before_connecting() {
    let (registry, resolver) = setup();
    let handler = QueryToolHandler::new(registry.clone(), resolver);

    let err = handler
        .query(QueryInput {
            sql: "DROP TABLE users".to_string(),
            connection: unreachable(),
        })
        .await
        .unwrap_err();

    assert!(err.error.contains("Use mysql_execute"));
    assert!(err.hint.is_none());
    assert_eq!(err.connection, CONNECTION);
    assert_eq!(registry.pool_count().await, 0);
}

#[tokio::test]
async fn list_tables_without_database_is_structured() {
    let (registry, resolver) = setup();
    let handler = SchemaToolHandler::new(registry.clone(), resolver);

    let err = handler
        .schema(schema_input("list_tables"))
        .await
        .unwrap_err();

    assert_eq!(
        err.error,
        "No database specified. Provide the \"database\" parameter or set MYSQL_DATABASE env var."
    );
    assert_eq!(registry.pool_count().await, 0);
}

#[tokio::test]
async fn describe_table_without_table_is_structured() {
    let (registry, resolver) = setup();
    let handler = SchemaToolHandler::new(registry.clone(), resolver);

    let mut input = schema_input("describe_table");
    input.database = Some("shop".to_string());
    let err = handler.schema(input).await.unwrap_err();

    assert_eq!(
        err.error,
        "The \"table\" parameter is required for describe_table action."
    );
    assert_eq!(err.connection, "root@127.0.0.1:1/shop");
    assert_eq!(registry.pool_count().await, 0);
}
