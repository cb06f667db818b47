//! The immutable `Item` record and the supporting types used to query and
//! partially assemble it across repository parts.

mod error;
mod item;
mod mask;
pub mod metadata;
mod part;

pub use conveyor_digest::Word;
pub use error::Error;
pub use item::{Chain, Created, Item, Reserver};
pub use mask::{Mask, Query};
pub use metadata::{Enumerable, Metadata, Value};
pub use part::Part;
