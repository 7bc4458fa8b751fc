//! Schema model and DDL schema builder

mod builder;
mod catalog;

pub use builder::SchemaBuilder;
pub use catalog::{
    Capability, ColumnDef, DatabaseDef, ForeignKeyDef, IndexDef, IndexKind, Named,
    ReferentialAction, TableDef, PRIMARY_INDEX_NAME,
};
