//! Column comparison

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::diff::{Changes, ColumnChanges, ColumnDiff};
use crate::schema::{Capability, ColumnDef};
use crate::types::SqlType;

/// Charset and collation a column inherits from its table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharsetScope {
    pub charset: Option<String>,
    pub collation: Option<String>,
}

impl CharsetScope {
    pub fn new(charset: impl Into<String>, collation: impl Into<String>) -> Self {
        Self {
            charset: Some(charset.into()),
            collation: Some(collation.into()),
        }
    }
}

/// Compares column definitions attribute by attribute.
///
/// Optional attributes are read through the column's capability set, so an
/// attribute one side's type cannot carry always differs from one the other
/// side's type can, even when both are empty.
#[derive(Debug, Clone, Default)]
pub struct ColumnComparator {
    scope: Option<(CharsetScope, CharsetScope)>,
}

impl ColumnComparator {
    /// Comparator that reads charset and collation as declared
    pub fn new() -> Self {
        Self::default()
    }

    /// Comparator that resolves an unset column charset or collation to the
    /// one inherited on its own side
    pub fn scoped(left: CharsetScope, right: CharsetScope) -> Self {
        Self {
            scope: Some((left, right)),
        }
    }

    pub fn diff(&self, left: &ColumnDef, right: &ColumnDef) -> Option<ColumnDiff> {
        let same_bool = bool_equivalent(left, right);
        if same_bool {
            trace!(column = %left.name, "bool and tinyint(1) treated as one type");
        }

        let (left_scope, right_scope) = match &self.scope {
            Some((l, r)) => (Some(l), Some(r)),
            None => (None, None),
        };

        let changes = ColumnChanges {
            name: left.name != right.name,
            data_type: !same_bool && left.data_type != right.data_type,
            nullable: left.nullable != right.nullable,
            default: left.default != right.default,
            comment: left.comment != right.comment,
            autoincrement: !same_bool && left.autoincrement() != right.autoincrement(),
            binary: left.is_binary() != right.is_binary(),
            charset: charset(left, left_scope) != charset(right, right_scope),
            collate: collation(left, left_scope) != collation(right, right_scope),
            precision: left.precision() != right.precision(),
            scale: left.scale() != right.scale(),
            default_timestamp: left.is_default_timestamp() != right.is_default_timestamp(),
            on_update_timestamp: left.is_on_update_timestamp() != right.is_on_update_timestamp(),
            options: options_differ(left, right),
            size: !same_bool && left.size() != right.size(),
            unsigned: !same_bool && left.is_unsigned() != right.is_unsigned(),
            zerofill: !same_bool && left.is_zerofill() != right.is_zerofill(),
        };

        let diff = ColumnDiff::modified(left.clone(), right.clone(), changes);
        if diff.is_some() {
            debug!(column = %left.name, changes = ?changes.names(), "column modified");
        }
        diff
    }

    /// Diff two name-keyed column maps
    pub fn hash_diff(
        &self,
        left: &IndexMap<String, ColumnDef>,
        right: &IndexMap<String, ColumnDef>,
    ) -> Vec<ColumnDiff> {
        super::hash_diff(left, right, |l, r| self.diff(l, r))
    }
}

/// A `tinyint(1)` that is neither unsigned, zerofill nor autoincrement
fn is_bool_like(column: &ColumnDef) -> bool {
    column.data_type == SqlType::TinyInt
        && column.size == Some(1)
        && !column.unsigned
        && !column.zerofill
        && !column.autoincrement
}

fn bool_equivalent(left: &ColumnDef, right: &ColumnDef) -> bool {
    (left.data_type == SqlType::Bool && is_bool_like(right))
        || (right.data_type == SqlType::Bool && is_bool_like(left))
}

/// Effective charset: the column's own, else the inherited one
fn charset<'a>(
    column: &'a ColumnDef,
    scope: Option<&'a CharsetScope>,
) -> Capability<Option<&'a str>> {
    column
        .charset()
        .map(|value| value.or_else(|| scope.and_then(|s| s.charset.as_deref())))
}

/// Effective collation. The inherited collation only applies while the column
/// keeps the inherited charset.
fn collation<'a>(
    column: &'a ColumnDef,
    scope: Option<&'a CharsetScope>,
) -> Capability<Option<&'a str>> {
    column.collation().map(|value| {
        value.or_else(|| {
            let scope = scope?;
            match column.charset.as_deref() {
                Some(own) if scope.charset.as_deref() != Some(own) => None,
                _ => scope.collation.as_deref(),
            }
        })
    })
}

/// Left options missing from the right; order and extra right options are ignored
fn options_differ(left: &ColumnDef, right: &ColumnDef) -> bool {
    match (left.options(), right.options()) {
        (Capability::Supported(l), Capability::Supported(r)) => {
            l.iter().any(|option| !r.contains(option))
        }
        (l, r) => l != r,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(diff: &ColumnDiff) -> Vec<&'static str> {
        diff.changes().names()
    }

    #[test]
    fn test_identical_columns() {
        let column = ColumnDef::new("email", SqlType::VarChar)
            .with_size(255)
            .not_null()
            .with_charset("utf8mb4")
            .with_comment("login");
        assert!(ColumnComparator::new().diff(&column, &column.clone()).is_none());
    }

    #[test]
    fn test_size_change() {
        let left = ColumnDef::new("id", SqlType::Int).with_size(11);
        let right = ColumnDef::new("id", SqlType::Int).with_size(10);
        let diff = ColumnComparator::new().diff(&left, &right).unwrap();
        assert!(diff.kind().is_modified());
        assert_eq!(flags(&diff), vec!["size"]);
    }

    #[test]
    fn test_bool_matches_tinyint_one() {
        let bool_col = ColumnDef::new("t_bool", SqlType::Bool);
        let tiny = ColumnDef::new("t_bool", SqlType::TinyInt).with_size(1);
        let comparator = ColumnComparator::new();
        assert!(comparator.diff(&bool_col, &tiny).is_none());
        assert!(comparator.diff(&tiny, &bool_col).is_none());
    }

    #[test]
    fn test_bool_equivalence_keeps_other_attributes() {
        let bool_col = ColumnDef::new("t_bool", SqlType::Bool).not_null();
        let tiny = ColumnDef::new("t_bool", SqlType::TinyInt).with_size(1);
        let diff = ColumnComparator::new().diff(&bool_col, &tiny).unwrap();
        assert_eq!(flags(&diff), vec!["nullable"]);
    }

    #[test]
    fn test_bool_vs_wider_tinyint() {
        let bool_col = ColumnDef::new("t_bool", SqlType::Bool);
        let tiny = ColumnDef::new("t_bool", SqlType::TinyInt).with_size(2);
        let diff = ColumnComparator::new().diff(&bool_col, &tiny).unwrap();
        assert_eq!(
            flags(&diff),
            vec!["type", "autoincrement", "size", "unsigned", "zerofill"]
        );
    }

    #[test]
    fn test_unsigned_tinyint_is_not_bool() {
        let bool_col = ColumnDef::new("t_bool", SqlType::Bool);
        let tiny = ColumnDef::new("t_bool", SqlType::TinyInt)
            .with_size(1)
            .unsigned();
        assert!(ColumnComparator::new().diff(&bool_col, &tiny).is_some());
    }

    #[test]
    fn test_options_one_directional() {
        let comparator = ColumnComparator::new();
        let xyz = ColumnDef::new("state", SqlType::Enum).with_options(["x", "y", "z"]);
        let abc = ColumnDef::new("state", SqlType::Enum).with_options(["a", "b", "c"]);
        assert_eq!(flags(&comparator.diff(&xyz, &abc).unwrap()), vec!["options"]);

        let zyx = ColumnDef::new("state", SqlType::Enum).with_options(["z", "y", "x"]);
        assert!(comparator.diff(&xyz, &zyx).is_none());

        // extra options on the right only
        let wider = ColumnDef::new("state", SqlType::Enum).with_options(["x", "y", "z", "w"]);
        assert!(comparator.diff(&xyz, &wider).is_none());
        assert!(comparator.diff(&wider, &xyz).is_some());
    }

    #[test]
    fn test_unsupported_attribute_differs_from_empty() {
        let text = ColumnDef::new("body", SqlType::Text);
        let json = ColumnDef::new("body", SqlType::Json);
        let diff = ColumnComparator::new().diff(&text, &json).unwrap();
        assert_eq!(flags(&diff), vec!["type", "binary", "charset", "collate"]);
    }

    #[test]
    fn test_unsupported_attributes_ignored() {
        // size is stored but a date column cannot carry it
        let left = ColumnDef::new("born", SqlType::Date).with_size(4);
        let right = ColumnDef::new("born", SqlType::Date);
        assert!(ColumnComparator::new().diff(&left, &right).is_none());
    }

    #[test]
    fn test_scoped_charset() {
        let left = ColumnDef::new("name", SqlType::VarChar)
            .with_size(64)
            .with_charset("latin1")
            .with_collation("latin1_swedish_ci");
        let right = ColumnDef::new("name", SqlType::VarChar).with_size(64);

        assert!(ColumnComparator::new().diff(&left, &right).is_some());

        let scope = CharsetScope::new("latin1", "latin1_swedish_ci");
        let scoped = ColumnComparator::scoped(scope.clone(), scope);
        assert!(scoped.diff(&left, &right).is_none());

        // explicit latin1 in a utf8mb4 table equals inherited latin1
        let scoped = ColumnComparator::scoped(
            CharsetScope::new("utf8mb4", "utf8mb4_general_ci"),
            CharsetScope::new("latin1", "latin1_swedish_ci"),
        );
        assert!(scoped.diff(&left, &right).is_none());

        let utf8 = ColumnDef::new("name", SqlType::VarChar)
            .with_size(64)
            .with_charset("utf8mb4");
        let latin = ColumnDef::new("name", SqlType::VarChar)
            .with_size(64)
            .with_charset("latin1");
        let scoped = ColumnComparator::scoped(
            CharsetScope::new("utf8mb4", "utf8mb4_general_ci"),
            CharsetScope::new("latin1", "latin1_swedish_ci"),
        );
        let diff = scoped.diff(&utf8, &latin).unwrap();
        assert_eq!(flags(&diff), vec!["charset", "collate"]);
    }

    #[test]
    fn test_hash_diff_order() {
        let mut left = IndexMap::new();
        let mut right = IndexMap::new();
        for (name, size) in [("id", 11), ("nickname2", 32)] {
            left.insert(
                name.to_string(),
                ColumnDef::new(name, SqlType::Int).with_size(size),
            );
        }
        for (name, size) in [("id", 10), ("nickname", 32)] {
            right.insert(
                name.to_string(),
                ColumnDef::new(name, SqlType::Int).with_size(size),
            );
        }

        let diffs = ColumnComparator::new().hash_diff(&left, &right);
        let summary: Vec<(char, &str)> = diffs
            .iter()
            .map(|d| (d.kind().symbol(), d.name()))
            .collect();
        assert_eq!(summary, vec![('~', "id"), ('+', "nickname2"), ('-', "nickname")]);
    }

    #[test]
    fn test_hash_diff_created_and_deleted() {
        let mut only = IndexMap::new();
        only.insert("a".to_string(), ColumnDef::new("a", SqlType::Int));
        let empty = IndexMap::new();
        let comparator = ColumnComparator::new();

        let created = comparator.hash_diff(&only, &empty);
        assert_eq!(created.len(), 1);
        assert!(created[0].kind().is_new());
        assert!(created[0].target().is_none());
        assert!(!created[0].changes().any());

        let deleted = comparator.hash_diff(&empty, &only);
        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].kind().is_deleted());
        assert!(deleted[0].source().is_none());
    }
}
