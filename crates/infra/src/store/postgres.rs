//! Postgres-backed document collection.
//!
//! All collections share one table:
//!
//! ```sql
//! CREATE TABLE documents (
//!     collection TEXT  NOT NULL,
//!     id         UUID  NOT NULL,
//!     body       JSONB NOT NULL,
//!     PRIMARY KEY (collection, id)
//! );
//! ```
//!
//! Filters and sorts are rendered to SQL over `jsonb` path expressions with
//! bound parameters, mirroring the in-memory evaluation rules of
//! `devcamper-query`. Field paths are bound as `text[]`, never spliced.
//!
//! ## Error Mapping
//!
//! | SQLx error                         | StoreError  |
//! |------------------------------------|-------------|
//! | Database, code `23505` (unique)    | `Duplicate` |
//! | Any other                          | `Backend`   |
//!
//! ## Timestamps
//!
//! Strings that are full RFC 3339 timestamps compare chronologically. The
//! `devcamper_rfc3339` SQL function (created by [`migrate`]) yields the
//! timestamp or NULL, so other strings, even ones that merely start like a
//! date, fall back to text comparison instead of failing the cast.
//!
//! ## Uniqueness
//!
//! Writes take a transaction-scoped advisory lock per collection, then check
//! the schema's unique key sets before inserting or replacing.

use chrono::DateTime;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use tracing::instrument;

use devcamper_core::DocumentId;
use devcamper_query::{Condition, Document, Filter, FindQuery, Operator, Scalar, Schema, SortDirection, SortKey};

use super::collection::{DocumentCollection, StoreError, document_id, duplicate, unique_key};

pub const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT  NOT NULL,
    id         UUID  NOT NULL,
    body       JSONB NOT NULL,
    PRIMARY KEY (collection, id)
)
"#;

pub const CREATE_RFC3339_FUNCTION: &str = r#"
CREATE OR REPLACE FUNCTION devcamper_rfc3339(value TEXT) RETURNS TIMESTAMPTZ
LANGUAGE plpgsql STABLE AS $$
BEGIN
    IF value !~ '^\d{4}-\d{2}-\d{2}[Tt ]\d{2}:\d{2}:\d{2}(\.\d+)?([Zz]|[+-]\d{2}:\d{2})$' THEN
        RETURN NULL;
    END IF;
    RETURN value::timestamptz;
EXCEPTION WHEN others THEN
    RETURN NULL;
END
$$
"#;

/// Create the backing table and helper function when absent.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    for statement in [CREATE_TABLE, CREATE_RFC3339_FUNCTION] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PostgresCollection {
    pool: PgPool,
    schema: Schema,
}

impl PostgresCollection {
    pub fn new(pool: PgPool, schema: Schema) -> Self {
        Self { pool, schema }
    }

    async fn begin_locked(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(self.schema.collection)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("advisory_lock", e))?;
        Ok(tx)
    }

    async fn check_unique(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: DocumentId,
        doc: &Document,
    ) -> Result<(), StoreError> {
        for fields in self.schema.unique {
            let Some(key) = unique_key(doc, fields) else {
                continue;
            };
            let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM documents WHERE collection = ");
            qb.push_bind(self.schema.collection);
            qb.push(" AND id <> ");
            qb.push_bind(*id.as_uuid());
            for (field, value) in fields.iter().zip(key) {
                qb.push(" AND body -> ");
                qb.push_bind(*field);
                qb.push(" = ");
                qb.push_bind(value.clone());
            }
            qb.push(" LIMIT 1");

            let clash = qb
                .build()
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("check_unique", e))?;
            if clash.is_some() {
                return Err(duplicate(&self.schema, fields));
            }
        }
        Ok(())
    }

    async fn insert_in(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: DocumentId,
        doc: Document,
    ) -> Result<(), StoreError> {
        self.check_unique(tx, id, &doc).await?;
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(self.schema.collection)
            .bind(*id.as_uuid())
            .bind(Value::Object(doc))
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate {
                        collection: self.schema.collection.to_string(),
                        fields: vec!["id".to_string()],
                    }
                } else {
                    map_sqlx_error("insert", e)
                }
            })?;
        Ok(())
    }

    fn select(&self, head: &str) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(head);
        qb.push(" FROM documents WHERE collection = ");
        qb.push_bind(self.schema.collection);
        qb
    }
}

#[async_trait::async_trait]
impl DocumentCollection for PostgresCollection {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    #[instrument(skip(self, doc), fields(collection = self.schema.collection), err)]
    async fn insert(&self, doc: Document) -> Result<(), StoreError> {
        let id = document_id(&doc)?;
        let mut tx = self.begin_locked().await?;
        self.insert_in(&mut tx, id, doc).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self, doc, guard), fields(collection = self.schema.collection), err)]
    async fn insert_unless(&self, doc: Document, guard: &Filter) -> Result<bool, StoreError> {
        let id = document_id(&doc)?;
        let mut tx = self.begin_locked().await?;

        let mut qb = self.select("SELECT 1");
        push_filter(&mut qb, guard);
        qb.push(" LIMIT 1");
        let matched = qb
            .build()
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_guard", e))?;
        if matched.is_some() {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(false);
        }

        self.insert_in(&mut tx, id, doc).await?;
        tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(true)
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(self.schema.collection)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;
        row.map(|r| body_of(&r)).transpose()
    }

    #[instrument(skip(self, doc), fields(collection = self.schema.collection), err)]
    async fn replace(&self, doc: Document) -> Result<(), StoreError> {
        let id = document_id(&doc)?;
        let mut tx = self.begin_locked().await?;
        self.check_unique(&mut tx, id, &doc).await?;

        let updated = sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
            .bind(self.schema.collection)
            .bind(*id.as_uuid())
            .bind(Value::Object(doc))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("replace", e))?;
        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::NotFound {
                collection: self.schema.collection.to_string(),
                id,
            });
        }

        tx.commit().await.map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn delete(&self, id: DocumentId) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(self.schema.collection)
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        Ok(deleted.rows_affected() > 0)
    }

    #[instrument(skip(self, query), fields(collection = self.schema.collection), err)]
    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        let mut qb = self.select("SELECT body");
        push_filter(&mut qb, &query.filter);
        push_order(&mut qb, &query.sort);
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if query.skip > 0 {
            qb.push(" OFFSET ");
            qb.push_bind(i64::try_from(query.skip).unwrap_or(i64::MAX));
        }

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find", e))?;
        rows.iter().map(body_of).collect()
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut qb = self.select("SELECT COUNT(*) AS n");
        push_filter(&mut qb, filter);
        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;
        let n: i64 = row.try_get("n").map_err(|e| map_sqlx_error("count", e))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM documents WHERE collection = ");
        qb.push_bind(self.schema.collection);
        push_filter(&mut qb, filter);
        let deleted = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_many", e))?;
        Ok(deleted.rows_affected())
    }
}

fn body_of(row: &sqlx::postgres::PgRow) -> Result<Document, StoreError> {
    match row.try_get::<Value, _>("body") {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Malformed("stored body is not an object".to_string())),
        Err(e) => Err(map_sqlx_error("decode_body", e)),
    }
}

fn push_path(qb: &mut QueryBuilder<'static, Postgres>, segments: &[String]) {
    qb.push("(body #> ");
    qb.push_bind(segments.to_vec());
    qb.push(")");
}

/// The field as a timestamp, NULL unless it is an RFC 3339 string.
fn push_timestamp(qb: &mut QueryBuilder<'static, Postgres>, segments: &[String]) {
    qb.push("devcamper_rfc3339(");
    push_path(qb, segments);
    qb.push(" #>> '{}')");
}

fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    for condition in filter.conditions() {
        qb.push(" AND ");
        push_condition(qb, condition);
    }
}

fn push_condition(qb: &mut QueryBuilder<'static, Postgres>, c: &Condition) {
    let segments = c.field.segments();
    match c.op {
        Operator::Eq | Operator::In => {
            // Missing field matches `= null`.
            let wants_null = c.op == Operator::Eq && c.values.iter().any(|v| v.typed.is_null());
            qb.push("(");
            if wants_null {
                push_path(qb, segments);
                qb.push(" IS NULL OR ");
            }
            push_equals_any(qb, |qb| push_path(qb, segments), &c.values);
            // CASE keeps jsonb_array_elements away from non-arrays.
            qb.push(" OR CASE WHEN jsonb_typeof");
            push_path(qb, segments);
            qb.push(" = 'array' THEN EXISTS (SELECT 1 FROM jsonb_array_elements");
            push_path(qb, segments);
            qb.push(" AS e(v) WHERE ");
            push_equals_any(qb, |qb| {
                qb.push("e.v");
            }, &c.values);
            qb.push(") ELSE FALSE END)");
        }
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            let sql_op = match c.op {
                Operator::Gt => " > ",
                Operator::Gte => " >= ",
                Operator::Lt => " < ",
                _ => " <= ",
            };
            let Some(operand) = c.values.first() else {
                qb.push("FALSE");
                return;
            };
            push_range(qb, segments, sql_op, operand);
        }
    }
}

/// `value` equals one of the operands, strings compared against the raw text.
fn push_equals_any<F>(qb: &mut QueryBuilder<'static, Postgres>, value: F, operands: &[Scalar])
where
    F: Fn(&mut QueryBuilder<'static, Postgres>),
{
    qb.push("(");
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push("(jsonb_typeof(");
        value(qb);
        qb.push(") = 'string' AND (");
        value(qb);
        qb.push(" #>> '{}') = ");
        qb.push_bind(operand.raw.clone());
        qb.push(") OR (jsonb_typeof(");
        value(qb);
        qb.push(") <> 'string' AND ");
        value(qb);
        qb.push(" = ");
        qb.push_bind(operand.typed.clone());
        qb.push(")");
    }
    if operands.is_empty() {
        qb.push("FALSE");
    }
    qb.push(")");
}

fn push_range(qb: &mut QueryBuilder<'static, Postgres>, segments: &[String], sql_op: &str, operand: &Scalar) {
    qb.push("(");
    if operand.typed.is_number() {
        qb.push("(jsonb_typeof");
        push_path(qb, segments);
        qb.push(" = 'number' AND (");
        push_path(qb, segments);
        qb.push(")::numeric");
        qb.push(sql_op);
        qb.push_bind(operand.typed.as_f64().unwrap_or_default());
        qb.push("::numeric) OR ");
    }
    qb.push("(jsonb_typeof");
    push_path(qb, segments);
    qb.push(" = 'string' AND ");
    if DateTime::parse_from_rfc3339(&operand.raw).is_ok() {
        // Chronological against stored timestamps, textual otherwise.
        qb.push("CASE WHEN ");
        push_timestamp(qb, segments);
        qb.push(" IS NOT NULL THEN ");
        push_timestamp(qb, segments);
        qb.push(sql_op);
        qb.push_bind(operand.raw.clone());
        qb.push("::timestamptz ELSE (");
        push_path(qb, segments);
        qb.push(" #>> '{}')");
        qb.push(sql_op);
        qb.push_bind(operand.raw.clone());
        qb.push(" END");
    } else {
        qb.push("(");
        push_path(qb, segments);
        qb.push(" #>> '{}')");
        qb.push(sql_op);
        qb.push_bind(operand.raw.clone());
    }
    qb.push("))");
}

/// Missing/null first, then booleans, numbers, strings, arrays, objects;
/// timestamps chronologically.
fn push_order(qb: &mut QueryBuilder<'static, Postgres>, sort: &[SortKey]) {
    if sort.is_empty() {
        return;
    }
    qb.push(" ORDER BY ");
    for (i, key) in sort.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        let dir = match key.direction {
            SortDirection::Asc => " ASC",
            SortDirection::Desc => " DESC",
        };
        let segments = key.field.segments();

        qb.push("CASE jsonb_typeof");
        push_path(qb, segments);
        qb.push(" WHEN 'boolean' THEN 1 WHEN 'number' THEN 2 WHEN 'string' THEN 3 WHEN 'array' THEN 4 WHEN 'object' THEN 5 ELSE 0 END");
        qb.push(dir);

        qb.push(", CASE WHEN jsonb_typeof");
        push_path(qb, segments);
        qb.push(" = 'string' THEN ");
        push_timestamp(qb, segments);
        qb.push(" END");
        qb.push(dir);

        qb.push(", ");
        push_path(qb, segments);
        qb.push(dir);
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcamper_query::{ListQuery, QueryOptions};

    const SCHEMA: Schema = Schema {
        collection: "bootcamps",
        fields: &["name", "averageCost", "location", "createdAt"],
        hidden: &[],
        unique: &[],
    };

    fn rendered(params: &[(&str, &str)]) -> String {
        let q = ListQuery::parse(params.iter().copied(), &SCHEMA, &QueryOptions::default()).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT body FROM documents WHERE collection = ");
        qb.push_bind("bootcamps");
        push_filter(&mut qb, &q.filter);
        push_order(&mut qb, &q.to_find().sort);
        qb.sql().to_string()
    }

    #[test]
    fn values_and_paths_are_bound_not_spliced() {
        let sql = rendered(&[("location.city", "Boston'; DROP TABLE documents; --")]);
        assert!(!sql.contains("Boston"));
        assert!(!sql.contains("city"));
        assert!(sql.contains("(body #> $2)"));
    }

    #[test]
    fn range_filters_compare_numerically() {
        let sql = rendered(&[("averageCost[lte]", "10000")]);
        assert!(sql.contains("::numeric <= "));
        assert!(!sql.contains("::timestamptz <= "));
    }

    #[test]
    fn timestamp_filters_compare_chronologically() {
        let sql = rendered(&[("createdAt[gte]", "2024-01-01T00:00:00Z")]);
        assert!(sql.contains("::timestamptz ELSE "));
        assert!(sql.contains("devcamper_rfc3339("));
        assert!(!sql.contains("::numeric"));
    }

    #[test]
    fn stored_strings_are_never_cast_directly() {
        let sql = rendered(&[("sort", "name"), ("createdAt[lt]", "2024-01-01T00:00:00Z")]);
        assert!(!sql.contains("#>> '{}')::timestamptz"));
    }

    #[test]
    fn sort_keys_end_with_id_tiebreak() {
        let sql = rendered(&[("sort", "-name")]);
        let order = sql.split(" ORDER BY ").nth(1).unwrap();
        assert_eq!(order.matches(" DESC").count(), 3);
        assert!(order.ends_with(" ASC"));
    }
}
