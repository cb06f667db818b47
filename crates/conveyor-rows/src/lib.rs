//! Table manager and Rows core: the relational half of a Conveyor
//! repository. Stores everything about an item except its blob, evolving
//! each kind's table schema live as new metadata shapes appear.

mod core;
mod error;
mod query;
mod row;
mod table;

pub use core::RowsCore;
pub use error::Error;
pub use table::{enum_table_name, table_name};
