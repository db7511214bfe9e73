//! Read-only MySQL tools exposed to the agent.
//!
//! Every tool returns errors as ordinary data in its declared return shape.
//! The consumer is an autonomous agent that can only recover by reading the
//! returned value and deciding to retry or rephrase; it cannot catch an
//! exception. A database failure must therefore never abort the tool call,
//! it has to materialize in the payload.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Row};

use crate::errors::{ToolError, ToolResult};
use crate::models::{Tool, ToolCall};
use crate::toolsets::Toolset;

const DEFAULT_LIMIT: u32 = 100;
const SAMPLE_ROWS: u32 = 3;

const INSTRUCTIONS: &str = "\
You are a database assistant. Build appropriate SQL for the user's question \
and fetch the data for them.

When the user asks about the database:
1. Use list_tables first to see which tables exist
2. Use get_table_schema to understand the relevant tables
3. Fetch data with safe_query_mysql (preferred) or query_mysql (advanced \
queries only)
4. Explain the results in plain language

Only run safe queries. If a query has a syntax error, correct it and run it \
again.";

/// Connection parameters for the MySQL schema the tools read from.
#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "scout".to_string(),
        }
    }
}

/// Structured input for `safe_query_mysql`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct QuerySpec {
    pub table_name: String,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub where_clause: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Assemble the constrained SELECT statement for a [`QuerySpec`].
///
/// `SELECT <cols> FROM <table> [WHERE <filter>] LIMIT <limit-or-100>`.
pub fn build_select(spec: &QuerySpec) -> String {
    let cols = match &spec.columns {
        Some(columns) if !columns.is_empty() => columns.join(", "),
        _ => "*".to_string(),
    };

    let mut query = format!("SELECT {} FROM {}", cols, spec.table_name);
    if let Some(clause) = &spec.where_clause {
        query.push_str(" WHERE ");
        query.push_str(clause);
    }
    query.push_str(&format!(" LIMIT {}", spec.limit.unwrap_or(DEFAULT_LIMIT)));
    query
}

pub struct DatabaseToolset {
    config: DbConfig,
    tools: Vec<Tool>,
}

impl DatabaseToolset {
    pub fn new(config: DbConfig) -> Self {
        let list_tables = Tool::new(
            "list_tables",
            "List all tables in the database.",
            json!({
                "type": "object",
                "required": [],
                "properties": {}
            }),
        );

        let get_table_schema = Tool::new(
            "get_table_schema",
            "Get the column definitions and a few sample rows for a table.",
            json!({
                "type": "object",
                "required": ["table_name"],
                "properties": {
                    "table_name": {
                        "type": "string",
                        "description": "Name of the table to describe."
                    }
                }
            }),
        );

        let query_mysql = Tool::new(
            "query_mysql",
            "Run a raw SQL query and return the rows. Use only when \
             safe_query_mysql cannot express the query.",
            json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The SQL query to run."
                    }
                }
            }),
        );

        let safe_query_mysql = Tool::new(
            "safe_query_mysql",
            "Run a constrained SELECT built from a table name, optional \
             columns, an optional WHERE clause and an optional row limit \
             (default 100). Preferred over query_mysql.",
            json!({
                "type": "object",
                "required": ["table_name"],
                "properties": {
                    "table_name": {
                        "type": "string",
                        "description": "Table to query."
                    },
                    "columns": {
                        "type": "array",
                        "items": {"type": "string"},
                        "default": null,
                        "description": "Columns to fetch. All columns when omitted."
                    },
                    "where_clause": {
                        "type": "string",
                        "default": null,
                        "description": "Filter clause, without the WHERE keyword."
                    },
                    "limit": {
                        "type": "integer",
                        "default": null,
                        "description": "Maximum rows to return. 100 when omitted."
                    }
                }
            }),
        );

        Self {
            config,
            tools: vec![list_tables, get_table_schema, query_mysql, safe_query_mysql],
        }
    }

    /// Open a fresh connection. One per tool call; closed (or dropped, which
    /// also releases the socket) before the call returns.
    async fn connect(&self) -> sqlx::Result<MySqlConnection> {
        MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .database(&self.config.database)
            .connect()
            .await
    }

    async fn fetch_rows(&self, query: &str) -> sqlx::Result<Vec<Value>> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query(query).fetch_all(&mut conn).await?;
        conn.close().await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn fetch_tables(&self) -> sqlx::Result<Vec<String>> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query("SHOW TABLES").fetch_all(&mut conn).await?;
        conn.close().await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.try_get::<String, _>(0).ok())
            .collect())
    }

    /// All table names, or `["error: ..."]` on failure.
    async fn list_tables(&self) -> Value {
        match self.fetch_tables().await {
            Ok(tables) => json!(tables),
            Err(err) => json!([format!("error: {err}")]),
        }
    }

    /// Column definitions plus up to three sample rows, or `{"error": ...}`.
    async fn get_table_schema(&self, table_name: &str) -> Value {
        let describe = format!("DESCRIBE {table_name}");
        let sample = format!("SELECT * FROM {table_name} LIMIT {SAMPLE_ROWS}");

        let columns = match self.fetch_rows(&describe).await {
            Ok(columns) => columns,
            Err(err) => return json!({"error": err.to_string()}),
        };
        let sample_data = match self.fetch_rows(&sample).await {
            Ok(rows) => rows,
            Err(err) => return json!({"error": err.to_string()}),
        };

        json!({
            "table_name": table_name,
            "columns": columns,
            "sample_data": sample_data,
        })
    }

    /// Rows for a raw query, or `[{"error": ...}]` on failure.
    async fn query_mysql(&self, query: &str) -> Value {
        match self.fetch_rows(query).await {
            Ok(rows) => json!(rows),
            Err(err) => json!([{"error": err.to_string()}]),
        }
    }

    /// Rows for a template-built SELECT, same error shape as `query_mysql`.
    async fn safe_query_mysql(&self, spec: &QuerySpec) -> Value {
        self.query_mysql(&build_select(spec)).await
    }
}

#[async_trait]
impl Toolset for DatabaseToolset {
    fn name(&self) -> &str {
        "database"
    }

    fn description(&self) -> &str {
        "Read-only access to a MySQL schema"
    }

    fn instructions(&self) -> &str {
        INSTRUCTIONS
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> ToolResult<Value> {
        match tool_call.name.as_str() {
            "list_tables" => Ok(self.list_tables().await),
            "get_table_schema" => {
                let table_name = tool_call
                    .arguments
                    .get("table_name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        ToolError::InvalidParameters("table_name is required".to_string())
                    })?;
                Ok(self.get_table_schema(table_name).await)
            }
            "query_mysql" => {
                let query = tool_call
                    .arguments
                    .get("query")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        ToolError::InvalidParameters("query is required".to_string())
                    })?;
                Ok(self.query_mysql(query).await)
            }
            "safe_query_mysql" => {
                let spec: QuerySpec = serde_json::from_value(tool_call.arguments)
                    .map_err(|err| ToolError::InvalidParameters(err.to_string()))?;
                Ok(self.safe_query_mysql(&spec).await)
            }
            _ => Err(ToolError::NotFound(tool_call.name)),
        }
    }
}

/// Decode a row into a JSON object, column by column. MySQL types that do
/// not map cleanly land as strings; anything undecodable becomes null.
fn row_to_json(row: &MySqlRow) -> Value {
    let mut object = Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        let value = if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<String>, _>(index) {
            v.map(Value::from).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(index) {
            v.map(|dt| Value::from(dt.to_string())).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(index) {
            v.map(|d| Value::from(d.to_string())).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(index) {
            v.map(|bytes| Value::from(String::from_utf8_lossy(&bytes).into_owned()))
                .unwrap_or(Value::Null)
        } else {
            Value::Null
        };
        object.insert(column.name().to_string(), value);
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(table: &str) -> QuerySpec {
        QuerySpec {
            table_name: table.to_string(),
            columns: None,
            where_clause: None,
            limit: None,
        }
    }

    #[test]
    fn test_build_select_defaults_to_limit_100() {
        assert_eq!(
            build_select(&spec("customers")),
            "SELECT * FROM customers LIMIT 100"
        );
    }

    #[test]
    fn test_build_select_with_explicit_limit() {
        let mut spec = spec("customers");
        spec.limit = Some(5);
        assert_eq!(build_select(&spec), "SELECT * FROM customers LIMIT 5");
    }

    #[test]
    fn test_build_select_with_columns_and_filter() {
        let spec = QuerySpec {
            table_name: "orders".to_string(),
            columns: Some(vec!["id".to_string(), "total".to_string()]),
            where_clause: Some("total > 100".to_string()),
            limit: Some(10),
        };
        assert_eq!(
            build_select(&spec),
            "SELECT id, total FROM orders WHERE total > 100 LIMIT 10"
        );
    }

    #[test]
    fn test_build_select_empty_columns_means_all() {
        let mut spec = spec("orders");
        spec.columns = Some(vec![]);
        assert_eq!(build_select(&spec), "SELECT * FROM orders LIMIT 100");
    }

    #[test]
    fn test_declares_all_four_tools() {
        let toolset = DatabaseToolset::new(DbConfig::default());
        let names: Vec<&str> = toolset.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "list_tables",
                "get_table_schema",
                "query_mysql",
                "safe_query_mysql"
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let toolset = DatabaseToolset::new(DbConfig::default());
        let result = toolset
            .call(ToolCall::new("drop_everything", json!({})))
            .await;
        assert_eq!(
            result,
            Err(ToolError::NotFound("drop_everything".to_string()))
        );
    }

    #[tokio::test]
    async fn test_missing_required_argument_is_invalid() {
        let toolset = DatabaseToolset::new(DbConfig::default());
        let result = toolset
            .call(ToolCall::new("get_table_schema", json!({})))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParameters(_))));
    }

    #[test]
    fn test_query_spec_deserializes_with_optional_fields_absent() {
        let spec: QuerySpec = serde_json::from_value(json!({"table_name": "t"})).unwrap();
        assert_eq!(spec.columns, None);
        assert_eq!(spec.where_clause, None);
        assert_eq!(spec.limit, None);
    }

    #[tokio::test]
    async fn test_connection_failure_is_data_not_error() {
        // Port 1 refuses connections, so every tool exercises its error
        // shape without a real server.
        let config = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..DbConfig::default()
        };
        let toolset = DatabaseToolset::new(config);

        let tables = toolset.call(ToolCall::new("list_tables", json!({}))).await;
        let tables = tables.expect("tool call itself must not fail");
        let first = tables.as_array().unwrap()[0].as_str().unwrap();
        assert!(first.starts_with("error: "));

        let schema = toolset
            .call(ToolCall::new("get_table_schema", json!({"table_name": "t"})))
            .await
            .unwrap();
        assert!(schema.get("error").is_some());

        let rows = toolset
            .call(ToolCall::new("query_mysql", json!({"query": "SELECT 1"})))
            .await
            .unwrap();
        assert!(rows.as_array().unwrap()[0].get("error").is_some());

        let safe = toolset
            .call(ToolCall::new("safe_query_mysql", json!({"table_name": "t"})))
            .await
            .unwrap();
        assert!(safe.as_array().unwrap()[0].get("error").is_some());
    }
}
