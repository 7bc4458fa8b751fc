//! Index comparison

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::diff::{Changes, IndexChanges, IndexDiff};
use crate::schema::{IndexDef, IndexKind, TableDef};

/// Compares indexes, and the index lists of two tables
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexComparator;

impl IndexComparator {
    pub fn new() -> Self {
        Self
    }

    /// Fields are compared as sets
    pub fn diff(&self, left: &IndexDef, right: &IndexDef) -> Option<IndexDiff> {
        let left_fields: HashSet<&str> = left.fields.iter().map(String::as_str).collect();
        let right_fields: HashSet<&str> = right.fields.iter().map(String::as_str).collect();

        let changes = IndexChanges {
            name: left.name != right.name,
            kind: left.kind != right.kind,
            fields: left_fields != right_fields,
        };

        let diff = IndexDiff::modified(left.clone(), right.clone(), changes);
        if diff.is_some() {
            debug!(index = %left.name, changes = ?changes.names(), "index modified");
        }
        diff
    }

    /// Diff the indexes of two tables, keyed by index name.
    ///
    /// Indexes the server creates on its own are skipped when unmatched: the
    /// primary key over a single autoincrement column, and an index sharing
    /// its name with a foreign key of the same table.
    pub fn hash_diff(&self, left: &TableDef, right: &TableDef) -> Vec<IndexDiff> {
        let mut diffs = Vec::new();

        for source in &left.indexes {
            match right.get_index(&source.name) {
                Some(target) => diffs.extend(self.diff(source, target)),
                None if is_implicit(source, left) => {}
                None => {
                    debug!(table = %left.name, index = %source.name, "index only in source");
                    diffs.push(IndexDiff::created(source.clone()));
                }
            }
        }

        for target in &right.indexes {
            if left.get_index(&target.name).is_some() || is_implicit(target, right) {
                continue;
            }
            debug!(table = %right.name, index = %target.name, "index only in target");
            diffs.push(IndexDiff::deleted(target.clone()));
        }

        diffs
    }
}

fn is_implicit(index: &IndexDef, table: &TableDef) -> bool {
    if is_autoincrement_primary(index, table) {
        trace!(table = %table.name, index = %index.name, "skipping autoincrement primary key");
        return true;
    }
    if table.get_foreign_key(&index.name).is_some() {
        trace!(table = %table.name, index = %index.name, "skipping foreign key index");
        return true;
    }
    false
}

fn is_autoincrement_primary(index: &IndexDef, table: &TableDef) -> bool {
    if index.kind != IndexKind::Primary {
        return false;
    }
    let [field] = index.fields.as_slice() else {
        return false;
    };
    table
        .get_column(field)
        .and_then(|column| column.autoincrement().supported())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, ForeignKeyDef};
    use crate::types::SqlType;

    fn named(name: &str) -> Option<String> {
        Some(name.to_string())
    }

    #[test]
    fn test_same_fields_any_order() {
        let left = IndexDef::key(["a", "b"], named("ab"));
        let right = IndexDef::key(["b", "a"], named("ab"));
        assert!(IndexComparator::new().diff(&left, &right).is_none());
    }

    #[test]
    fn test_field_sets_differ_both_ways() {
        let comparator = IndexComparator::new();
        let narrow = IndexDef::key(["a"], named("k"));
        let wide = IndexDef::key(["a", "b"], named("k"));

        let diff = comparator.diff(&narrow, &wide).unwrap();
        assert_eq!(diff.changes().names(), vec!["fields"]);
        assert!(comparator.diff(&wide, &narrow).is_some());
    }

    #[test]
    fn test_kind_change() {
        let left = IndexDef::key(["email"], named("email"));
        let right = IndexDef::unique(["email"], named("email"));
        let diff = IndexComparator::new().diff(&left, &right).unwrap();
        assert_eq!(diff.changes().names(), vec!["type"]);
    }

    #[test]
    fn test_autoincrement_primary_suppressed() {
        let left = TableDef::new("t")
            .with_column(ColumnDef::new("id", SqlType::Int).auto_increment())
            .with_index(IndexDef::primary(["id"]));
        let right = TableDef::new("t").with_column(ColumnDef::new("id", SqlType::Int));

        let comparator = IndexComparator::new();
        assert!(comparator.hash_diff(&left, &right).is_empty());
        assert!(comparator.hash_diff(&right, &left).is_empty());
    }

    #[test]
    fn test_plain_primary_not_suppressed() {
        let left = TableDef::new("t")
            .with_column(ColumnDef::new("id", SqlType::Int))
            .with_index(IndexDef::primary(["id"]));
        let right = TableDef::new("t").with_column(ColumnDef::new("id", SqlType::Int));

        let diffs = IndexComparator::new().hash_diff(&left, &right);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].kind().is_new());
    }

    #[test]
    fn test_primary_on_missing_column_not_suppressed() {
        let left = TableDef::new("t").with_index(IndexDef::primary(["id"]));
        let right = TableDef::new("t");
        assert_eq!(IndexComparator::new().hash_diff(&left, &right).len(), 1);
    }

    #[test]
    fn test_foreign_key_index_suppressed() {
        let table = TableDef::new("tbl2")
            .with_index(IndexDef::key(["tbl1_id"], named("tbl2_to_tbl1")))
            .with_foreign_key(ForeignKeyDef::new("tbl2_to_tbl1", "tbl1_id", "tbl1", "id"));
        let bare = TableDef::new("tbl2")
            .with_foreign_key(ForeignKeyDef::new("tbl2_to_tbl1", "tbl1_id", "tbl1", "id"));

        let comparator = IndexComparator::new();
        assert!(comparator.hash_diff(&table, &bare).is_empty());
        assert!(comparator.hash_diff(&bare, &table).is_empty());
    }

    #[test]
    fn test_hash_diff_order() {
        let left = TableDef::new("t")
            .with_index(IndexDef::key(["a"], named("k1")))
            .with_index(IndexDef::key(["b"], named("k2")));
        let right = TableDef::new("t")
            .with_index(IndexDef::key(["c"], named("k3")))
            .with_index(IndexDef::key(["x"], named("k1")));

        let diffs = IndexComparator::new().hash_diff(&left, &right);
        let summary: Vec<(char, &str)> = diffs
            .iter()
            .map(|d| (d.kind().symbol(), d.name()))
            .collect();
        assert_eq!(summary, vec![('~', "k1"), ('+', "k2"), ('-', "k3")]);
    }
}
