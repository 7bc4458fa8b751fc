//! Diff model - the result tree produced by the comparators
//!
//! A [`DatabaseDiff`] holds [`TableDiff`]s, which in turn hold column, index and
//! relation diffs. Every diff is built once by a comparator and is read-only
//! afterwards.

use serde::Serialize;

use crate::schema::{ColumnDef, DatabaseDef, ForeignKeyDef, IndexDef, Named, TableDef};

/// How an entity differs between the source (left) and target (right) schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Present only in the source
    New,
    /// Present only in the target
    Deleted,
    /// Present in both with at least one differing attribute
    Modified,
}

impl DiffKind {
    pub fn is_new(&self) -> bool {
        matches!(self, DiffKind::New)
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, DiffKind::Deleted)
    }

    pub fn is_modified(&self) -> bool {
        matches!(self, DiffKind::Modified)
    }

    /// One-character marker used in listings
    pub fn symbol(&self) -> char {
        match self {
            DiffKind::New => '+',
            DiffKind::Deleted => '-',
            DiffKind::Modified => '~',
        }
    }
}

/// Per-attribute change flags of one entity kind
pub trait Changes: Default {
    /// Whether any attribute, or any nested member, differs
    fn any(&self) -> bool;

    /// Names of the differing scalar attributes, in declaration order
    fn names(&self) -> Vec<&'static str>;
}

/// Difference between two snapshots of one entity.
///
/// New diffs carry only a source, deleted diffs only a target, and both carry
/// cleared change flags. Modified diffs carry both sides and at least one flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diff<T, C> {
    kind: DiffKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<T>,
    changes: C,
}

impl<T, C: Changes> Diff<T, C> {
    pub fn created(source: T) -> Self {
        Self {
            kind: DiffKind::New,
            source: Some(source),
            target: None,
            changes: C::default(),
        }
    }

    pub fn deleted(target: T) -> Self {
        Self {
            kind: DiffKind::Deleted,
            source: None,
            target: Some(target),
            changes: C::default(),
        }
    }

    /// Modified diff, or `None` when no flag is set
    pub fn modified(source: T, target: T, changes: C) -> Option<Self> {
        if !changes.any() {
            return None;
        }
        Some(Self {
            kind: DiffKind::Modified,
            source: Some(source),
            target: Some(target),
            changes,
        })
    }

    pub fn kind(&self) -> DiffKind {
        self.kind
    }

    pub fn source(&self) -> Option<&T> {
        self.source.as_ref()
    }

    pub fn target(&self) -> Option<&T> {
        self.target.as_ref()
    }

    pub fn changes(&self) -> &C {
        &self.changes
    }
}

impl<T: Named, C> Diff<T, C> {
    /// Name of the compared entity; the source name for modified diffs
    pub fn name(&self) -> &str {
        match (&self.source, &self.target) {
            (Some(source), _) => source.name(),
            (None, Some(target)) => target.name(),
            (None, None) => "",
        }
    }
}

pub type ColumnDiff = Diff<ColumnDef, ColumnChanges>;
pub type IndexDiff = Diff<IndexDef, IndexChanges>;
pub type RelationDiff = Diff<ForeignKeyDef, RelationChanges>;
pub type TableDiff = Diff<TableDef, TableChanges>;
pub type DatabaseDiff = Diff<DatabaseDef, DatabaseChanges>;

fn flagged(flags: &[(bool, &'static str)]) -> Vec<&'static str> {
    flags
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, name)| *name)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColumnChanges {
    pub name: bool,
    #[serde(rename = "type")]
    pub data_type: bool,
    pub nullable: bool,
    pub default: bool,
    pub comment: bool,
    pub autoincrement: bool,
    pub binary: bool,
    pub charset: bool,
    pub collate: bool,
    pub precision: bool,
    pub scale: bool,
    pub default_timestamp: bool,
    pub on_update_timestamp: bool,
    pub options: bool,
    pub size: bool,
    pub unsigned: bool,
    pub zerofill: bool,
}

impl Changes for ColumnChanges {
    fn any(&self) -> bool {
        !self.names().is_empty()
    }

    fn names(&self) -> Vec<&'static str> {
        flagged(&[
            (self.name, "name"),
            (self.data_type, "type"),
            (self.nullable, "nullable"),
            (self.default, "default"),
            (self.comment, "comment"),
            (self.autoincrement, "autoincrement"),
            (self.binary, "binary"),
            (self.charset, "charset"),
            (self.collate, "collate"),
            (self.precision, "precision"),
            (self.scale, "scale"),
            (self.default_timestamp, "default_timestamp"),
            (self.on_update_timestamp, "on_update_timestamp"),
            (self.options, "options"),
            (self.size, "size"),
            (self.unsigned, "unsigned"),
            (self.zerofill, "zerofill"),
        ])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexChanges {
    pub name: bool,
    #[serde(rename = "type")]
    pub kind: bool,
    pub fields: bool,
}

impl Changes for IndexChanges {
    fn any(&self) -> bool {
        self.name || self.kind || self.fields
    }

    fn names(&self) -> Vec<&'static str> {
        flagged(&[
            (self.name, "name"),
            (self.kind, "type"),
            (self.fields, "fields"),
        ])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationChanges {
    pub name: bool,
    pub source_field: bool,
    pub target_table: bool,
    pub target_field: bool,
    pub on_delete_action: bool,
    pub on_update_action: bool,
}

impl Changes for RelationChanges {
    fn any(&self) -> bool {
        !self.names().is_empty()
    }

    fn names(&self) -> Vec<&'static str> {
        flagged(&[
            (self.name, "name"),
            (self.source_field, "source_field"),
            (self.target_table, "target_table"),
            (self.target_field, "target_field"),
            (self.on_delete_action, "on_delete_action"),
            (self.on_update_action, "on_update_action"),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableChanges {
    pub name: bool,
    pub engine: bool,
    pub charset: bool,
    pub collate: bool,
    pub columns: Vec<ColumnDiff>,
    pub indexes: Vec<IndexDiff>,
    pub relations: Vec<RelationDiff>,
}

impl TableChanges {
    pub fn is_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn is_indexes(&self) -> bool {
        !self.indexes.is_empty()
    }

    pub fn is_relations(&self) -> bool {
        !self.relations.is_empty()
    }
}

impl Changes for TableChanges {
    fn any(&self) -> bool {
        self.name
            || self.engine
            || self.charset
            || self.collate
            || self.is_columns()
            || self.is_indexes()
            || self.is_relations()
    }

    fn names(&self) -> Vec<&'static str> {
        flagged(&[
            (self.name, "name"),
            (self.engine, "engine"),
            (self.charset, "charset"),
            (self.collate, "collate"),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatabaseChanges {
    pub name: bool,
    pub default_engine: bool,
    pub default_charset: bool,
    pub default_collate: bool,
    pub tables: Vec<TableDiff>,
}

impl DatabaseChanges {
    pub fn is_tables(&self) -> bool {
        !self.tables.is_empty()
    }
}

impl Changes for DatabaseChanges {
    fn any(&self) -> bool {
        self.name
            || self.default_engine
            || self.default_charset
            || self.default_collate
            || self.is_tables()
    }

    fn names(&self) -> Vec<&'static str> {
        flagged(&[
            (self.name, "name"),
            (self.default_engine, "default_engine"),
            (self.default_charset, "default_charset"),
            (self.default_collate, "default_collate"),
        ])
    }
}

impl TableDiff {
    pub fn columns(&self) -> &[ColumnDiff] {
        &self.changes.columns
    }

    pub fn indexes(&self) -> &[IndexDiff] {
        &self.changes.indexes
    }

    pub fn relations(&self) -> &[RelationDiff] {
        &self.changes.relations
    }

    pub fn is_columns(&self) -> bool {
        self.changes.is_columns()
    }

    pub fn is_indexes(&self) -> bool {
        self.changes.is_indexes()
    }

    pub fn is_relations(&self) -> bool {
        self.changes.is_relations()
    }
}

impl DatabaseDiff {
    pub fn tables(&self) -> &[TableDiff] {
        &self.changes.tables
    }

    pub fn is_tables(&self) -> bool {
        self.changes.is_tables()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;

    #[test]
    fn test_modified_requires_a_flag() {
        let a = ColumnDef::new("id", SqlType::Int);
        let b = a.clone();
        assert!(ColumnDiff::modified(a.clone(), b.clone(), ColumnChanges::default()).is_none());

        let changes = ColumnChanges {
            nullable: true,
            ..ColumnChanges::default()
        };
        let diff = ColumnDiff::modified(a, b, changes).unwrap();
        assert!(diff.kind().is_modified());
        assert_eq!(diff.changes().names(), vec!["nullable"]);
    }

    #[test]
    fn test_created_and_deleted_shapes() {
        let column = ColumnDef::new("id", SqlType::Int);

        let created = ColumnDiff::created(column.clone());
        assert!(created.kind().is_new());
        assert!(created.target().is_none());
        assert!(!created.changes().any());
        assert_eq!(created.name(), "id");

        let deleted = ColumnDiff::deleted(column);
        assert!(deleted.kind().is_deleted());
        assert!(deleted.source().is_none());
        assert!(!deleted.changes().any());
        assert_eq!(deleted.name(), "id");
    }

    #[test]
    fn test_table_changes_count_nested_lists() {
        let mut changes = TableChanges::default();
        assert!(!changes.any());

        changes
            .relations
            .push(RelationDiff::created(ForeignKeyDef::new("fk", "a", "t", "id")));
        assert!(changes.any());
        assert!(changes.names().is_empty());
        assert!(changes.is_relations());
    }
}
