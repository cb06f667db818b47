//! Translating an [`Item`]/[`Part`] into bound SQL column values, interning
//! `status` and any `Enumerable` metadata through the enum cache before
//! binding them.

use conveyor_enum_cache::Cache;
use conveyor_item::{Enumerable, Item, Part, Value, Word};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};

use crate::table;
use crate::Error;

#[derive(Clone, Debug)]
pub enum BoundValue {
    SmallInt(i32),
    NullableSmallInt(Option<i32>),
    VarChar(String),
    NullableVarChar(Option<String>),
    Integer(i64),
    NullableInteger(Option<i64>),
    Double(f64),
    NullableDouble(Option<f64>),
    Timestamp(chrono::NaiveDateTime),
    NullableTimestamp(Option<chrono::NaiveDateTime>),
}

pub fn bind<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: BoundValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        BoundValue::SmallInt(v) => query.bind(v),
        BoundValue::NullableSmallInt(v) => query.bind(v),
        BoundValue::VarChar(v) => query.bind(v),
        BoundValue::NullableVarChar(v) => query.bind(v),
        BoundValue::Integer(v) => query.bind(v),
        BoundValue::NullableInteger(v) => query.bind(v),
        BoundValue::Double(v) => query.bind(v),
        BoundValue::NullableDouble(v) => query.bind(v),
        BoundValue::Timestamp(v) => query.bind(v),
        BoundValue::NullableTimestamp(v) => query.bind(v),
    }
}

pub fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    values: Vec<BoundValue>,
) -> Query<'q, Postgres, PgArguments> {
    for value in values {
        query = bind(query, value);
    }
    query
}

/// A named, typed set of columns ready to bind into an `INSERT` or
/// `UPDATE` statement.
#[derive(Default)]
pub struct Columns {
    pub names: Vec<String>,
    pub values: Vec<BoundValue>,
}

impl Columns {
    fn push(&mut self, name: impl Into<String>, value: BoundValue) {
        self.names.push(name.into());
        self.values.push(value);
    }
}

async fn intern_metadata_value(
    kind: &Word,
    key: &Word,
    value: &Value,
    cache: &Cache,
    pool: &PgPool,
) -> Result<BoundValue, Error> {
    Ok(match value {
        Value::String(s) => BoundValue::NullableVarChar(Some(s.clone())),
        Value::Integer(i) => BoundValue::NullableInteger(Some(*i)),
        Value::Float(f) => BoundValue::NullableDouble(Some(*f)),
        Value::Timestamp(t) => BoundValue::NullableTimestamp(Some(*t)),
        Value::Enumerable(e) => {
            let table = table::enum_table_name(kind, key.as_str());
            let v = cache.intern(&table, e, pool).await?;
            BoundValue::NullableSmallInt(Some(v))
        }
    })
}

/// Builds the full column set for inserting `item` into `conveyor_<kind>`,
/// interning `status` and any Enumerable metadata value along the way.
pub async fn columns_for_item(
    kind: &Word,
    item: &Item,
    cache: &Cache,
    pool: &PgPool,
) -> Result<Columns, Error> {
    let mut columns = Columns::default();

    let status_table = table::enum_table_name(kind, "status");
    let status_value = cache
        .intern(&status_table, &Enumerable::from(item.status.as_str().to_string()), pool)
        .await?;
    columns.push("status", BoundValue::SmallInt(status_value));
    columns.push("digest", BoundValue::VarChar(item.data.digest().string()));
    columns.push("chain", BoundValue::VarChar(item.chain.as_str().to_string()));
    columns.push("created", BoundValue::Timestamp(item.created));
    columns.push(
        "reserver",
        BoundValue::NullableVarChar(item.reserver.as_deref().map(|s| s.to_string())),
    );

    for (key, value) in item.metadata.iter() {
        let bound = intern_metadata_value(kind, key, value, cache, pool).await?;
        columns.push(key.as_str().to_string(), bound);
    }

    Ok(columns)
}

/// Builds the `SET` column set for a partial update, interning only the
/// fields `part` actually carries — mirrors the original `Row.sub()`
/// per-field diff rather than rewriting every column on every update.
pub async fn columns_for_part(
    kind: &Word,
    part: &Part,
    cache: &Cache,
    pool: &PgPool,
) -> Result<Columns, Error> {
    let mut columns = Columns::default();

    if let Some(status) = &part.status {
        let status_table = table::enum_table_name(kind, "status");
        let v = cache
            .intern(&status_table, &Enumerable::from(status.as_str().to_string()), pool)
            .await?;
        columns.push("status", BoundValue::SmallInt(v));
    }
    if let Some(chain) = &part.chain {
        columns.push("chain", BoundValue::VarChar(chain.as_str().to_string()));
    }
    if let Some(created) = &part.created {
        columns.push("created", BoundValue::Timestamp(*created));
    }
    if let Some(reserver) = &part.reserver {
        columns.push(
            "reserver",
            BoundValue::NullableVarChar(reserver.as_deref().map(|s| s.to_string())),
        );
    }
    if let Some(metadata) = &part.metadata {
        for (key, value) in metadata.iter() {
            let bound = intern_metadata_value(kind, key, value, cache, pool).await?;
            columns.push(key.as_str().to_string(), bound);
        }
    }

    Ok(columns)
}
