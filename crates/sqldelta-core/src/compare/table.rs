//! Table comparison

use indexmap::IndexMap;
use tracing::debug;

use super::{differs_from_default, CharsetScope, ColumnComparator, Defaults};
use super::{IndexComparator, RelationComparator};
use crate::diff::{Changes, TableChanges, TableDiff};
use crate::schema::TableDef;

/// Compares tables and their columns, indexes and foreign keys
#[derive(Debug, Clone, Copy, Default)]
pub struct TableComparator {
    indexes: IndexComparator,
    relations: RelationComparator,
}

impl TableComparator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff two tables.
    ///
    /// Engine, charset and collation equal to `defaults` count as unset, and
    /// columns inherit the charset and collation of their own table.
    pub fn diff(&self, left: &TableDef, right: &TableDef, defaults: &Defaults) -> Option<TableDiff> {
        let columns = ColumnComparator::scoped(scope(left, defaults), scope(right, defaults));

        let changes = TableChanges {
            name: left.name != right.name,
            engine: differs_from_default(
                left.engine.as_deref(),
                right.engine.as_deref(),
                &defaults.engine,
            ),
            charset: differs_from_default(
                left.charset.as_deref(),
                right.charset.as_deref(),
                &defaults.charset,
            ),
            collate: differs_from_default(
                left.collation.as_deref(),
                right.collation.as_deref(),
                &defaults.collation,
            ),
            columns: columns.hash_diff(&left.columns, &right.columns),
            indexes: self.indexes.hash_diff(left, right),
            relations: self
                .relations
                .hash_diff(&left.foreign_keys, &right.foreign_keys),
        };

        let diff = TableDiff::modified(left.clone(), right.clone(), changes);
        if let Some(diff) = &diff {
            debug!(
                table = %left.name,
                changes = ?diff.changes().names(),
                columns = diff.columns().len(),
                indexes = diff.indexes().len(),
                relations = diff.relations().len(),
                "table modified"
            );
        }
        diff
    }

    /// Diff two name-keyed table maps
    pub fn hash_diff(
        &self,
        left: &IndexMap<String, TableDef>,
        right: &IndexMap<String, TableDef>,
        defaults: &Defaults,
    ) -> Vec<TableDiff> {
        super::hash_diff(left, right, |l, r| self.diff(l, r, defaults))
    }
}

/// Charset and collation the table's columns inherit.
///
/// A table that names a charset but no collation only inherits the ambient
/// collation when its charset is the ambient one.
fn scope(table: &TableDef, defaults: &Defaults) -> CharsetScope {
    let charset = table
        .charset
        .clone()
        .unwrap_or_else(|| defaults.charset.clone());
    let collation = match &table.collation {
        Some(collation) => Some(collation.clone()),
        None if charset == defaults.charset => Some(defaults.collation.clone()),
        None => None,
    };
    CharsetScope {
        charset: Some(charset),
        collation,
    }
}
