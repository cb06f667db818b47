use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use conveyor_item::Enumerable;
use sqlx::Row;

use crate::bimap::Bimap;
use crate::Error;

/// Per-enum-table bimap, guarded by its own lock so that interning one
/// table never blocks readers of another.
struct TableCache {
    snapshot: RwLock<Arc<Bimap>>,
}

impl TableCache {
    fn new() -> Self {
        TableCache {
            snapshot: RwLock::new(Arc::new(Bimap::default())),
        }
    }

    fn snapshot(&self) -> Arc<Bimap> {
        self.snapshot.read().expect("enum cache lock poisoned").clone()
    }

    fn replace(&self, bimap: Bimap) {
        *self.snapshot.write().expect("enum cache lock poisoned") = Arc::new(bimap);
    }
}

/// One partition of the process-wide enum cache. Obtained via [`crate::init`]
/// and keyed by `cache_id`.
pub struct Cache {
    tables: RwLock<HashMap<String, Arc<TableCache>>>,
}

impl Cache {
    pub(crate) fn new() -> Self {
        Cache {
            tables: RwLock::new(HashMap::new()),
        }
    }

    fn table(&self, table: &str) -> Arc<TableCache> {
        if let Some(t) = self.tables.read().expect("enum cache lock poisoned").get(table) {
            return t.clone();
        }
        self.tables
            .write()
            .expect("enum cache lock poisoned")
            .entry(table.to_string())
            .or_insert_with(|| Arc::new(TableCache::new()))
            .clone()
    }

    /// Reads all rows of `table` and replaces its bimap wholesale.
    #[tracing::instrument(skip(self, pool))]
    pub async fn load(&self, table: &str, pool: &sqlx::PgPool) -> Result<(), Error> {
        let sql = format!("SELECT value, description FROM {table}");
        let rows = sqlx::query(&sql).fetch_all(pool).await?;
        let pairs = rows
            .into_iter()
            .map(|r| (r.get::<i32, _>("value"), r.get::<String, _>("description")))
            .collect::<Vec<_>>();
        self.table(table).replace(Bimap::from_rows(pairs));
        Ok(())
    }

    /// Interns `enumerable`, returning its integer value. Creates the table
    /// on first use; never renames or reuses a previously assigned value.
    #[tracing::instrument(skip(self, pool))]
    pub async fn intern(
        &self,
        table: &str,
        enumerable: &Enumerable,
        pool: &sqlx::PgPool,
    ) -> Result<i32, Error> {
        let cached = self.table(table).snapshot();
        if let Some(v) = cached.value_of(enumerable.as_str()) {
            return Ok(v);
        }

        self.load(table, pool).await.ok();
        if let Some(v) = self.table(table).snapshot().value_of(enumerable.as_str()) {
            return Ok(v);
        }

        match self.try_insert(table, enumerable, pool).await {
            Ok(value) => {
                self.load(table, pool).await?;
                Ok(value)
            }
            Err(Error::Database(sqlx::Error::Database(db_err)))
                if db_err.code().as_deref() == Some("42P01") /* undefined_table */ =>
            {
                self.create_table(table, pool).await?;
                let value = self.try_insert(table, enumerable, pool).await?;
                self.load(table, pool).await?;
                Ok(value)
            }
            Err(e) => Err(e),
        }
    }

    async fn try_insert(
        &self,
        table: &str,
        enumerable: &Enumerable,
        pool: &sqlx::PgPool,
    ) -> Result<i32, Error> {
        // `ON CONFLICT DO NOTHING` loses a race to another writer cleanly;
        // the caller reloads and reads back the winner's value.
        let sql = format!(
            "INSERT INTO {table} (description) VALUES ($1) \
             ON CONFLICT (description) DO UPDATE SET description = EXCLUDED.description \
             RETURNING value"
        );
        let row = sqlx::query(&sql)
            .bind(enumerable.as_str())
            .fetch_one(pool)
            .await?;
        Ok(row.get::<i32, _>("value"))
    }

    async fn create_table(&self, table: &str, pool: &sqlx::PgPool) -> Result<(), Error> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {table} ( \
                value SMALLSERIAL PRIMARY KEY, \
                description TEXT UNIQUE NOT NULL \
            )"
        );
        sqlx::query(&sql).execute(pool).await?;
        Ok(())
    }

    /// Resolves an interned integer back to its enumerable description.
    #[tracing::instrument(skip(self, pool))]
    pub async fn resolve(
        &self,
        table: &str,
        value: i32,
        pool: &sqlx::PgPool,
    ) -> Result<Enumerable, Error> {
        for attempt in 0..2 {
            if let Some(d) = self.table(table).snapshot().description_of(value) {
                return Ok(Enumerable::from(d.to_string()));
            }
            if attempt == 0 {
                self.load(table, pool).await?;
            }
        }
        Err(Error::NotFound(value, table.to_string()))
    }
}
