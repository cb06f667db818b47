//! Per-kind relational schema with live migration: new metadata keys widen
//! a `conveyor_<kind>` table with `ALTER TABLE ADD COLUMN` rather than
//! requiring an offline migration.

use std::collections::HashMap;

use conveyor_item::{Item, Value, Word};
use conveyor_transform::{DbEnumName, Transform};
use sqlx::PgPool;
use sqlx::Row as _;

use crate::Error;

pub fn table_name(kind: &Word) -> String {
    format!("conveyor_{}", kind.as_str().to_lowercase())
}

/// `_conveyor_enum_<kind>__<key>`, the lookup table backing one interned
/// column.
pub fn enum_table_name(kind: &Word, key: &str) -> String {
    let suffix = DbEnumName::new(key).apply(kind.as_str().to_lowercase()).expect("infallible");
    format!("_conveyor_enum_{suffix}")
}

/// The fixed columns every `conveyor_<kind>` table carries, beyond whatever
/// metadata-derived columns an item's shape adds.
pub const BASE_FIELDS: [&str; 5] = ["status", "digest", "chain", "created", "reserver"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Interned enum reference — used for `status` and any Enumerable
    /// metadata value.
    SmallIntEnum,
    VarChar(u32),
    Integer,
    DoublePrecision,
    Timestamp,
}

impl ColumnType {
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::SmallIntEnum => "SMALLINT".to_string(),
            ColumnType::VarChar(n) => format!("VARCHAR({n})"),
            ColumnType::Integer => "BIGINT".to_string(),
            ColumnType::DoublePrecision => "DOUBLE PRECISION".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    /// Matches this column type against what `information_schema.columns`
    /// reports for `data_type`.
    fn matches_reported(&self, reported: &str) -> bool {
        let reported = reported.to_lowercase();
        match self {
            ColumnType::SmallIntEnum => reported == "smallint",
            ColumnType::VarChar(_) => reported == "character varying",
            ColumnType::Integer => reported == "bigint",
            ColumnType::DoublePrecision => reported == "double precision",
            ColumnType::Timestamp => reported.starts_with("timestamp"),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ColumnType::SmallIntEnum => "enumerable",
            ColumnType::VarChar(_) => "string",
            ColumnType::Integer => "integer",
            ColumnType::DoublePrecision => "float",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl Field {
    fn index_name(&self) -> String {
        format!("index__{}", self.name)
    }
}

pub fn value_column_type(value: &Value) -> ColumnType {
    match value {
        Value::String(_) => ColumnType::VarChar(255),
        Value::Integer(_) => ColumnType::Integer,
        Value::Float(_) => ColumnType::DoublePrecision,
        Value::Timestamp(_) => ColumnType::Timestamp,
        Value::Enumerable(_) => ColumnType::SmallIntEnum,
    }
}

/// The columns a partial metadata update would need, absent the fixed
/// fields — used to migrate in new metadata-derived columns on `setitem`
/// without requiring a full [`Item`].
pub fn fields_for_metadata(metadata: &conveyor_item::metadata::Metadata) -> Vec<Field> {
    metadata
        .iter()
        .map(|(key, value)| Field {
            name: key.as_str().to_string(),
            column_type: value_column_type(value),
            nullable: true,
        })
        .collect()
}

/// The full set of columns required to store `item`, fixed columns first.
pub fn required_fields(item: &Item) -> Vec<Field> {
    let mut fields = vec![
        Field {
            name: "status".to_string(),
            column_type: ColumnType::SmallIntEnum,
            nullable: false,
        },
        Field {
            name: "digest".to_string(),
            column_type: ColumnType::VarChar(127),
            nullable: false,
        },
        Field {
            name: "chain".to_string(),
            column_type: ColumnType::VarChar(127),
            nullable: false,
        },
        Field {
            name: "created".to_string(),
            column_type: ColumnType::Timestamp,
            nullable: false,
        },
        Field {
            name: "reserver".to_string(),
            column_type: ColumnType::VarChar(31),
            nullable: true,
        },
    ];
    for (key, value) in item.metadata.iter() {
        fields.push(Field {
            name: key.as_str().to_string(),
            column_type: value_column_type(value),
            nullable: true,
        });
    }
    fields
}

pub(crate) async fn table_exists(pool: &PgPool, table: &str) -> Result<bool, Error> {
    let row = sqlx::query(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = $1) AS present",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;
    Ok(row.get::<bool, _>("present"))
}

pub(crate) async fn existing_columns(pool: &PgPool, table: &str) -> Result<HashMap<String, String>, Error> {
    let rows = sqlx::query(
        "SELECT column_name, data_type FROM information_schema.columns WHERE table_name = $1",
    )
    .bind(table)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|r| (r.get::<String, _>("column_name"), r.get::<String, _>("data_type")))
        .collect())
}

/// Ensures `conveyor_<kind>` exists and carries every column `fields`
/// names, creating the table or `ALTER TABLE ADD COLUMN`-ing missing
/// columns as needed. Dropping columns and narrowing types are both
/// forbidden by spec — an existing column with an incompatible type is a
/// [`Error::SchemaConflict`].
#[tracing::instrument(skip(pool, fields))]
pub async fn migrate(pool: &PgPool, table: &str, fields: &[Field]) -> Result<(), Error> {
    if !table_exists(pool, table).await? {
        create_table(pool, table, fields).await?;
        return Ok(());
    }

    let current = existing_columns(pool, table).await?;
    for field in fields {
        match current.get(&field.name) {
            None => add_column(pool, table, field).await?,
            Some(reported) if field.column_type.matches_reported(reported) => {}
            Some(reported) => {
                return Err(Error::SchemaConflict {
                    key: field.name.clone(),
                    existing: leak_label(reported),
                    attempted: field.column_type.label(),
                })
            }
        }
    }
    Ok(())
}

fn leak_label(reported: &str) -> &'static str {
    // `data_type` strings from information_schema aren't one of our known
    // labels; surface them without allocating a `String` in the error by
    // matching the handful of reports we can see in practice.
    match reported.to_lowercase().as_str() {
        "smallint" => "enumerable",
        "character varying" => "string",
        "bigint" => "integer",
        "double precision" => "float",
        s if s.starts_with("timestamp") => "timestamp",
        _ => "unknown",
    }
}

async fn create_table(pool: &PgPool, table: &str, fields: &[Field]) -> Result<(), Error> {
    let columns_sql = fields
        .iter()
        .map(|f| {
            format!(
                "{} {} {}",
                f.name,
                f.column_type.sql_type(),
                if f.nullable { "NULL" } else { "NOT NULL" }
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("CREATE TABLE {table} ({columns_sql})");
    sqlx::query(&sql).execute(pool).await?;

    for field in fields {
        create_index(pool, table, field).await?;
    }
    Ok(())
}

async fn add_column(pool: &PgPool, table: &str, field: &Field) -> Result<(), Error> {
    let sql = format!(
        "ALTER TABLE {table} ADD COLUMN {} {} {}",
        field.name,
        field.column_type.sql_type(),
        if field.nullable { "NULL" } else { "NOT NULL" }
    );
    sqlx::query(&sql).execute(pool).await?;
    create_index(pool, table, field).await?;
    Ok(())
}

async fn create_index(pool: &PgPool, table: &str, field: &Field) -> Result<(), Error> {
    let sql = format!(
        "CREATE INDEX IF NOT EXISTS {} ON {table} ({})",
        field.index_name(),
        field.name
    );
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}
