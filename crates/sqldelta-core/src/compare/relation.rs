//! Foreign key comparison

use indexmap::IndexMap;
use tracing::debug;

use crate::diff::{Changes, RelationChanges, RelationDiff};
use crate::schema::{ForeignKeyDef, ReferentialAction};

/// Compares foreign keys by source field, target and referential actions
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationComparator;

impl RelationComparator {
    pub fn new() -> Self {
        Self
    }

    pub fn diff(&self, left: &ForeignKeyDef, right: &ForeignKeyDef) -> Option<RelationDiff> {
        let changes = RelationChanges {
            name: left.name != right.name,
            source_field: left.source_field != right.source_field,
            target_table: left.target_table != right.target_table,
            target_field: left.target_field != right.target_field,
            on_delete_action: effective(left.on_delete) != effective(right.on_delete),
            on_update_action: effective(left.on_update) != effective(right.on_update),
        };

        let diff = RelationDiff::modified(left.clone(), right.clone(), changes);
        if diff.is_some() {
            debug!(foreign_key = %left.name, changes = ?changes.names(), "foreign key modified");
        }
        diff
    }

    /// Diff two foreign key maps keyed by constraint name
    pub fn hash_diff(
        &self,
        left: &IndexMap<String, ForeignKeyDef>,
        right: &IndexMap<String, ForeignKeyDef>,
    ) -> Vec<RelationDiff> {
        super::hash_diff(left, right, |l, r| self.diff(l, r))
    }
}

/// `RESTRICT` is what the server does when no action is given
fn effective(action: Option<ReferentialAction>) -> Option<ReferentialAction> {
    action.filter(|a| *a != ReferentialAction::Restrict)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fk() -> ForeignKeyDef {
        ForeignKeyDef::new("tbl2_to_tbl1", "tbl1_id", "tbl1", "id")
    }

    #[test]
    fn test_identical() {
        assert!(RelationComparator::new().diff(&fk(), &fk()).is_none());
    }

    #[test]
    fn test_restrict_equals_unset() {
        let comparator = RelationComparator::new();
        let restrict = fk()
            .on_delete(ReferentialAction::Restrict)
            .on_update(ReferentialAction::Restrict);
        assert!(comparator.diff(&restrict, &fk()).is_none());
        assert!(comparator.diff(&fk(), &restrict).is_none());
    }

    #[test]
    fn test_action_change() {
        let cascade = fk().on_delete(ReferentialAction::Cascade);
        let diff = RelationComparator::new().diff(&fk(), &cascade).unwrap();
        assert_eq!(diff.changes().names(), vec!["on_delete_action"]);

        // NO ACTION is spelled out, so it is not folded into unset
        let no_action = fk().on_update(ReferentialAction::NoAction);
        let diff = RelationComparator::new().diff(&no_action, &fk()).unwrap();
        assert_eq!(diff.changes().names(), vec!["on_update_action"]);
    }

    #[test]
    fn test_target_change() {
        let other = ForeignKeyDef::new("tbl2_to_tbl1", "tbl1_id", "tbl3", "uid");
        let diff = RelationComparator::new().diff(&fk(), &other).unwrap();
        assert_eq!(diff.changes().names(), vec!["target_table", "target_field"]);
    }

    #[test]
    fn test_hash_diff() {
        let mut left = IndexMap::new();
        left.insert("a".to_string(), ForeignKeyDef::new("a", "x", "t", "id"));
        let mut right = IndexMap::new();
        right.insert("b".to_string(), ForeignKeyDef::new("b", "x", "t", "id"));

        let diffs = RelationComparator::new().hash_diff(&left, &right);
        assert_eq!(diffs.len(), 2);
        assert!(diffs[0].kind().is_new());
        assert_eq!(diffs[0].name(), "a");
        assert!(diffs[1].kind().is_deleted());
        assert_eq!(diffs[1].name(), "b");
    }
}
