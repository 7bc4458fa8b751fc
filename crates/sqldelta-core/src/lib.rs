//! sqldelta-core: structural diffs between SQL schema snapshots
//!
//! Schemas are read from MySQL DDL with [`SchemaBuilder`] (or deserialized
//! from JSON snapshots) and compared with [`DatabaseComparator`], which
//! yields a [`DatabaseDiff`] tree of table, column, index and foreign key
//! differences. Dialect defaults such as the server charset are normalized
//! away so only intentional changes show up.

pub mod compare;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod schema;
pub mod types;

pub use compare::{
    CharsetScope, ColumnComparator, DatabaseComparator, Defaults, IndexComparator,
    RelationComparator, TableComparator,
};
pub use dialect::SqlDialect;
pub use diff::{
    Changes, ColumnDiff, DatabaseDiff, Diff, DiffKind, IndexDiff, RelationDiff, TableDiff,
};
pub use error::{Diagnostic, DiagnosticKind, Severity, Span};
pub use schema::{
    ColumnDef, DatabaseDef, ForeignKeyDef, IndexDef, IndexKind, Named, ReferentialAction,
    SchemaBuilder, TableDef,
};
pub use types::{DeclaredType, SqlType, TypeError};
