//! The Rows core: a per-kind relational table holding every field of an
//! item except its blob, with the same append/get/setitem/delitem/
//! transaction surface as Files core.

use std::sync::Arc;

use conveyor_digest::Digest;
use conveyor_enum_cache::Cache;
use conveyor_item::{Chain, Item, Mask, Part, Query as ItemQuery, Reserver, Value, Word};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row as _};
use tokio::sync::Mutex;

use crate::row::{self, BoundValue};
use crate::table;
use crate::Error;

/// Either the process pool, or a shared transaction handle. Enum interning
/// and schema migration always go through the pool even when row data goes
/// through a transaction: interning is append-only and commutative, so a
/// value interned outside a transaction that later rolls back is merely
/// orphaned, never incorrect.
#[derive(Clone)]
enum Conn {
    Pool(PgPool),
    Txn(Arc<Mutex<sqlx::Transaction<'static, Postgres>>>),
}

impl Conn {
    async fn execute(&self, sql: &str, values: Vec<BoundValue>) -> Result<u64, Error> {
        let query = row::bind_all(sqlx::query(sql), values);
        match self {
            Conn::Pool(pool) => Ok(query.execute(pool).await?.rows_affected()),
            Conn::Txn(txn) => {
                let mut guard = txn.lock().await;
                Ok(query.execute(&mut **guard).await?.rows_affected())
            }
        }
    }

    async fn fetch_all(&self, sql: &str, values: Vec<BoundValue>) -> Result<Vec<PgRow>, Error> {
        let query = row::bind_all(sqlx::query(sql), values);
        match self {
            Conn::Pool(pool) => Ok(query.fetch_all(pool).await?),
            Conn::Txn(txn) => {
                let mut guard = txn.lock().await;
                Ok(query.fetch_all(&mut **guard).await?)
            }
        }
    }
}

#[derive(Clone)]
pub struct RowsCore {
    pool: PgPool,
    cache: Arc<Cache>,
    conn: Conn,
}

impl RowsCore {
    pub fn new(pool: PgPool, cache: Arc<Cache>) -> Self {
        RowsCore {
            pool: pool.clone(),
            cache,
            conn: Conn::Pool(pool),
        }
    }

    pub fn is_transactional(&self) -> bool {
        matches!(self.conn, Conn::Txn(_))
    }

    /// Opens a transaction, or returns a handle sharing the existing one if
    /// this core is already transactional — nested transactions reuse their
    /// parent's handle rather than nesting a Postgres transaction.
    pub async fn transaction(&self) -> Result<RowsCore, Error> {
        let conn = match &self.conn {
            Conn::Pool(pool) => Conn::Txn(Arc::new(Mutex::new(pool.begin().await?))),
            Conn::Txn(txn) => Conn::Txn(txn.clone()),
        };
        Ok(RowsCore {
            pool: self.pool.clone(),
            cache: self.cache.clone(),
            conn,
        })
    }

    /// Commits the transaction once every handle sharing it has been
    /// dropped. A caller still holding a sibling clone causes this to be a
    /// harmless no-op — whichever clone drops last performs the commit.
    pub async fn commit_transaction(&self) -> Result<(), Error> {
        match &self.conn {
            Conn::Pool(_) => Ok(()),
            Conn::Txn(txn) => match Arc::try_unwrap(txn.clone()) {
                Ok(mutex) => Ok(mutex.into_inner().commit().await?),
                Err(_) => Ok(()),
            },
        }
    }

    #[tracing::instrument(skip(self, item), fields(kind = %kind))]
    pub async fn append(&self, kind: &Word, item: &Item) -> Result<(), Error> {
        let table = table::table_name(kind);
        table::migrate(&self.pool, &table, &table::required_fields(item)).await?;

        let columns = row::columns_for_item(kind, item, &self.cache, &self.pool).await?;
        let placeholders = (1..=columns.names.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.names.join(", ")
        );
        self.conn.execute(&sql, columns.values).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, query), fields(kind = %kind))]
    pub async fn get(&self, kind: &Word, query: &ItemQuery) -> Result<Vec<Part>, Error> {
        let table = table::table_name(kind);
        if !table::table_exists(&self.pool, &table).await? {
            return Ok(Vec::new());
        }

        let columns = table::existing_columns(&self.pool, &table).await?;
        let metadata_columns = columns
            .into_iter()
            .filter(|(name, _)| !table::BASE_FIELDS.contains(&name.as_str()))
            .collect::<Vec<_>>();

        let mut select_cols = table::BASE_FIELDS.to_vec();
        select_cols.extend(metadata_columns.iter().map(|(name, _)| name.as_str()));
        let select_list = select_cols.join(", ");

        let where_clause = crate::query::build(kind, &query.mask, &self.cache, &self.pool, 1).await?;
        let mut values = where_clause.values;
        let mut sql = format!("SELECT {select_list} FROM {table} WHERE {}", where_clause.sql);
        if let Some(limit) = query.limit {
            values.push(BoundValue::Integer(limit as i64));
            sql.push_str(&format!(" LIMIT ${}", values.len()));
        }

        let rows = self.conn.fetch_all(&sql, values).await?;
        let mut parts = Vec::with_capacity(rows.len());
        for row in &rows {
            parts.push(self.part_from_row(kind, row, &metadata_columns).await?);
        }
        Ok(parts)
    }

    async fn part_from_row(
        &self,
        kind: &Word,
        row: &PgRow,
        metadata_columns: &[(String, String)],
    ) -> Result<Part, Error> {
        let status_value: i32 = row.try_get("status")?;
        let status_table = table::enum_table_name(kind, "status");
        let status = self.cache.resolve(&status_table, status_value, &self.pool).await?;

        let digest_str: String = row.try_get("digest")?;
        let digest = Digest::from_base64(&digest_str)?;
        let chain_str: String = row.try_get("chain")?;
        let created: chrono::NaiveDateTime = row.try_get("created")?;
        let reserver: Option<String> = row.try_get("reserver")?;

        let mut pairs = Vec::with_capacity(metadata_columns.len());
        for (name, data_type) in metadata_columns {
            if let Some(value) = self.decode_metadata_column(kind, name, data_type, row).await? {
                pairs.push((Word::new(name).expect("column name is a valid word"), value));
            }
        }

        Ok(Part {
            kind: Some(kind.clone()),
            status: Some(Word::new(status.as_str()).expect("interned status is a valid word")),
            digest: Some(digest),
            data: None,
            metadata: Some(conveyor_item::Metadata::from_pairs(pairs)?),
            chain: Some(Chain::new(chain_str)),
            created: Some(created),
            reserver: Some(Reserver(reserver)),
        })
    }

    async fn decode_metadata_column(
        &self,
        kind: &Word,
        name: &str,
        data_type: &str,
        row: &PgRow,
    ) -> Result<Option<Value>, Error> {
        Ok(match data_type.to_lowercase().as_str() {
            "smallint" => match row.try_get::<Option<i32>, _>(name)? {
                None => None,
                Some(v) => {
                    let table = table::enum_table_name(kind, name);
                    Some(Value::Enumerable(self.cache.resolve(&table, v, &self.pool).await?))
                }
            },
            "character varying" => row.try_get::<Option<String>, _>(name)?.map(Value::String),
            "bigint" => row.try_get::<Option<i64>, _>(name)?.map(Value::Integer),
            "double precision" => row.try_get::<Option<f64>, _>(name)?.map(Value::Float),
            t if t.starts_with("timestamp") => {
                row.try_get::<Option<chrono::NaiveDateTime>, _>(name)?.map(Value::Timestamp)
            }
            _ => None,
        })
    }

    /// Applies a partial update. Exactly one row must match `mask`, else
    /// [`Error::NotFound`] — the reservation protocol relies on this
    /// affected-row-count check as its linearization point.
    #[tracing::instrument(skip(self, mask, part), fields(kind = %kind))]
    pub async fn setitem(&self, kind: &Word, mask: &Mask, part: &Part) -> Result<(), Error> {
        let table = table::table_name(kind);
        if let Some(metadata) = &part.metadata {
            let fields = table::fields_for_metadata(metadata);
            if !fields.is_empty() {
                table::migrate(&self.pool, &table, &fields).await?;
            }
        }

        let set_columns = row::columns_for_part(kind, part, &self.cache, &self.pool).await?;
        if set_columns.names.is_empty() {
            return Ok(());
        }
        let set_sql = set_columns
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{name} = ${}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");

        let where_clause =
            crate::query::build(kind, mask, &self.cache, &self.pool, set_columns.values.len() + 1).await?;
        let sql = format!("UPDATE {table} SET {set_sql} WHERE {}", where_clause.sql);

        let mut values = set_columns.values;
        values.extend(where_clause.values);
        let affected = self.conn.execute(&sql, values).await?;
        if affected != 1 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, mask), fields(kind = %kind))]
    pub async fn delitem(&self, kind: &Word, mask: &Mask) -> Result<(), Error> {
        let table = table::table_name(kind);
        if !table::table_exists(&self.pool, &table).await? {
            return Err(Error::NotFound);
        }
        let where_clause = crate::query::build(kind, mask, &self.cache, &self.pool, 1).await?;
        let sql = format!("DELETE FROM {table} WHERE {}", where_clause.sql);
        let affected = self.conn.execute(&sql, where_clause.values).await?;
        if affected == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    pub async fn contains(&self, kind: &Word, mask: &Mask) -> Result<bool, Error> {
        let table = table::table_name(kind);
        if !table::table_exists(&self.pool, &table).await? {
            return Ok(false);
        }
        let where_clause = crate::query::build(kind, mask, &self.cache, &self.pool, 1).await?;
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE {}) AS present", where_clause.sql);
        let rows = self.conn.fetch_all(&sql, where_clause.values).await?;
        Ok(rows
            .first()
            .map(|r| r.try_get::<bool, _>("present"))
            .transpose()?
            .unwrap_or(false))
    }

    pub async fn len(&self, kind: &Word) -> Result<u64, Error> {
        let table = table::table_name(kind);
        if !table::table_exists(&self.pool, &table).await? {
            return Ok(0);
        }
        let sql = format!("SELECT COUNT(*) AS n FROM {table}");
        let rows = self.conn.fetch_all(&sql, Vec::new()).await?;
        Ok(rows
            .first()
            .map(|r| r.try_get::<i64, _>("n"))
            .transpose()?
            .unwrap_or(0) as u64)
    }

    pub async fn clear(&self, kind: &Word) -> Result<(), Error> {
        let table = table::table_name(kind);
        if !table::table_exists(&self.pool, &table).await? {
            return Ok(());
        }
        self.conn.execute(&format!("TRUNCATE TABLE {table}"), Vec::new()).await?;
        Ok(())
    }
}
