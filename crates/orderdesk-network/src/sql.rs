//! Order lookups served directly from a SQLite database.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use orderdesk_core::{LookupMode, RawRecord, UpstreamError};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags};
use serde_json::{Number, Value};
use tracing::{debug, info};

use crate::OrderSource;

/// Reads whole order rows from `table`, one read-only connection per lookup.
pub struct SqlOrderSource {
    path: PathBuf,
    mode: LookupMode,
    sql: String,
}

impl SqlOrderSource {
    pub fn new(path: &Path, table: &str, mode: LookupMode) -> Self {
        info!(
            "SqlOrderSource: path={}, table={}, lookup={}",
            path.display(),
            table,
            mode
        );
        Self {
            path: path.to_path_buf(),
            mode,
            sql: lookup_sql(table, mode),
        }
    }
}

#[async_trait]
impl OrderSource for SqlOrderSource {
    async fn fetch(&self, customer: &str) -> Result<Option<RawRecord>, UpstreamError> {
        let path = self.path.clone();
        let sql = self.sql.clone();
        let mode = self.mode;
        let customer = customer.to_string();

        tokio::task::spawn_blocking(move || query_order(&path, &sql, mode, &customer))
            .await
            .map_err(|e| UpstreamError::Database(e.to_string()))?
            .map_err(|e| UpstreamError::Database(e.to_string()))
    }
}

fn lookup_sql(table: &str, mode: LookupMode) -> String {
    let table = quote_identifier(table);
    match mode {
        LookupMode::Exact => format!(
            r#"SELECT * FROM {table} WHERE "customerName" = ?1 ORDER BY rowid DESC LIMIT 1"#
        ),
        LookupMode::Fuzzy => format!(
            r#"SELECT * FROM {table} WHERE "customerName" LIKE ?1 ESCAPE '\'
               ORDER BY ("customerName" = ?2 COLLATE NOCASE) DESC, rowid DESC LIMIT 1"#
        ),
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Substring pattern for `LIKE ... ESCAPE '\'`.
fn like_pattern(customer: &str) -> String {
    let mut pattern = String::with_capacity(customer.len() + 2);
    pattern.push('%');
    for c in customer.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn query_order(
    path: &Path,
    sql: &str,
    mode: LookupMode,
    customer: &str,
) -> Result<Option<RawRecord>, rusqlite::Error> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = match mode {
        LookupMode::Exact => stmt.query(params![customer])?,
        LookupMode::Fuzzy => stmt.query(params![like_pattern(customer), customer])?,
    };

    let Some(row) = rows.next()? else {
        debug!("No order row for {:?}", customer);
        return Ok(None);
    };

    let mut record = RawRecord::new();
    for (idx, column) in columns.iter().enumerate() {
        record.insert(column.clone(), column_value(row.get_ref(idx)?));
    }
    Ok(Some(record))
}

fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn seed() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE orders (
                "customerName" TEXT,
                "orderDate" TEXT,
                "mountPrice",
                "balance",
                "pickupDate" TEXT,
                "photo" BLOB
            );
            INSERT INTO orders VALUES ('Ada Lovelace', '2024-01-02', '150.00', 12.5, NULL, x'00ff');
            INSERT INTO orders VALUES ('Ada Lovelace', '2024-06-30', '', 40, '', NULL);
            INSERT INTO orders VALUES ('Charles Babbage', '2024-02-11', 'tbd', NULL, NULL, NULL);
            INSERT INTO orders VALUES ('100%_Pure', '2024-03-03', 10, 0, NULL, NULL);
            "#,
        )
        .unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_exact_lookup_returns_latest_full_row() {
        let (_dir, path) = seed();
        let source = SqlOrderSource::new(&path, "orders", LookupMode::Exact);

        let record = source.fetch("Ada Lovelace").await.unwrap().unwrap();
        assert_eq!(record.len(), 6);
        assert_eq!(record.get("orderDate"), Some(&json!("2024-06-30")));
        assert_eq!(record.get("mountPrice"), Some(&json!("")));
        assert_eq!(record.get("balance"), Some(&json!(40)));
        assert_eq!(record.get("photo"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_exact_lookup_is_strict() {
        let (_dir, path) = seed();
        let source = SqlOrderSource::new(&path, "orders", LookupMode::Exact);
        assert_eq!(source.fetch("ada lovelace").await.unwrap(), None);
        assert_eq!(source.fetch("Babbage").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fuzzy_lookup_matches_substring() {
        let (_dir, path) = seed();
        let source = SqlOrderSource::new(&path, "orders", LookupMode::Fuzzy);

        let record = source.fetch("babb").await.unwrap().unwrap();
        assert_eq!(record.get("customerName"), Some(&json!("Charles Babbage")));
        assert_eq!(record.get("mountPrice"), Some(&json!("tbd")));
        assert_eq!(record.get("balance"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_fuzzy_lookup_escapes_wildcards() {
        let (_dir, path) = seed();
        let source = SqlOrderSource::new(&path, "orders", LookupMode::Fuzzy);

        let record = source.fetch("0%_p").await.unwrap().unwrap();
        assert_eq!(record.get("customerName"), Some(&json!("100%_Pure")));
        assert_eq!(source.fetch("%").await.unwrap().unwrap().get("customerName"), Some(&json!("100%_Pure")));
        assert_eq!(source.fetch("Ada_Lovelace").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_database_is_database_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqlOrderSource::new(&dir.path().join("absent.db"), "orders", LookupMode::Exact);
        assert!(matches!(source.fetch("Ada").await, Err(UpstreamError::Database(_))));
    }

    #[tokio::test]
    async fn test_missing_table_is_database_error() {
        let (_dir, path) = seed();
        let source = SqlOrderSource::new(&path, "invoices", LookupMode::Exact);
        assert!(matches!(source.fetch("Ada").await, Err(UpstreamError::Database(_))));
    }

    #[test]
    fn test_like_pattern_escaping() {
        assert_eq!(like_pattern("ada"), "%ada%");
        assert_eq!(like_pattern(r"50%_\"), r"%50\%\_\\%");
    }
}
