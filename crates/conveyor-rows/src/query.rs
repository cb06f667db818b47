//! Translating a [`Mask`] into a SQL `WHERE` clause, interning any
//! Enumerable mask value the same way a row insert does so the comparison
//! lands on the same integer the stored row carries.

use conveyor_enum_cache::Cache;
use conveyor_item::{Enumerable, Mask, Word};
use sqlx::PgPool;

use crate::row::BoundValue;
use crate::table;
use crate::Error;

/// A `WHERE` fragment (no leading `WHERE` keyword) plus the values it binds,
/// numbered starting at `start_index` so it can be appended after an
/// `UPDATE ... SET` clause's own placeholders.
pub struct WhereClause {
    pub sql: String,
    pub values: Vec<BoundValue>,
}

pub async fn build(
    kind: &Word,
    mask: &Mask,
    cache: &Cache,
    pool: &PgPool,
    start_index: usize,
) -> Result<WhereClause, Error> {
    let mut conditions = Vec::new();
    let mut values = Vec::new();
    let mut next = start_index;

    if let Some(status) = &mask.status {
        let table = table::enum_table_name(kind, "status");
        let v = cache
            .intern(&table, &Enumerable::from(status.as_str().to_string()), pool)
            .await?;
        conditions.push(format!("status = ${next}"));
        values.push(BoundValue::SmallInt(v));
        next += 1;
    }
    if let Some(digest) = &mask.digest {
        conditions.push(format!("digest = ${next}"));
        values.push(BoundValue::VarChar(digest.string()));
        next += 1;
    }
    if let Some(chain) = &mask.chain {
        conditions.push(format!("chain = ${next}"));
        values.push(BoundValue::VarChar(chain.as_str().to_string()));
        next += 1;
    }
    if let Some(created) = &mask.created {
        conditions.push(format!("created = ${next}"));
        values.push(BoundValue::Timestamp(*created));
        next += 1;
    }
    if let Some(reserver) = &mask.reserver {
        match reserver.as_deref() {
            None => conditions.push("reserver IS NULL".to_string()),
            Some(token) => {
                conditions.push(format!("reserver = ${next}"));
                values.push(BoundValue::VarChar(token.to_string()));
                next += 1;
            }
        }
    }
    for (key, value) in &mask.metadata {
        let table = table::enum_table_name(kind, key.as_str());
        let bound = match value {
            conveyor_item::Value::String(s) => BoundValue::VarChar(s.clone()),
            conveyor_item::Value::Integer(i) => BoundValue::Integer(*i),
            conveyor_item::Value::Float(f) => BoundValue::Double(*f),
            conveyor_item::Value::Timestamp(t) => BoundValue::Timestamp(*t),
            conveyor_item::Value::Enumerable(e) => {
                let v = cache.intern(&table, e, pool).await?;
                BoundValue::SmallInt(v)
            }
        };
        conditions.push(format!("{} = ${next}", key.as_str()));
        values.push(bound);
        next += 1;
    }

    let sql = if conditions.is_empty() {
        "TRUE".to_string()
    } else {
        conditions.join(" AND ")
    };
    Ok(WhereClause { sql, values })
}
