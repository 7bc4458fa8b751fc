//! Comparators - decide whether two schema snapshots differ, and how
//!
//! Each comparator works on one entity kind and composes the comparators of
//! the entities it contains. All of them are pure: they only read their
//! inputs and build a fresh diff tree.

mod column;
mod database;
mod index;
mod relation;
mod table;

pub use column::{CharsetScope, ColumnComparator};
pub use database::DatabaseComparator;
pub use index::IndexComparator;
pub use relation::RelationComparator;
pub use table::TableComparator;

use indexmap::IndexMap;
use tracing::debug;

use crate::diff::{Changes, Diff};
use crate::dialect::SqlDialect;
use crate::schema::Named;

/// Engine, charset and collation a server applies when a definition omits them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub engine: String,
    pub charset: String,
    pub collation: String,
}

impl Defaults {
    pub fn new(engine: &str, charset: &str, collation: &str) -> Self {
        Self {
            engine: engine.to_string(),
            charset: charset.to_string(),
            collation: collation.to_string(),
        }
    }
}

impl Default for Defaults {
    fn default() -> Self {
        SqlDialect::default().server_defaults()
    }
}

/// Treat an explicit value equal to the ambient default as unset
pub(crate) fn normalized<'a>(value: Option<&'a str>, default: &str) -> Option<&'a str> {
    value.filter(|v| *v != default)
}

/// Whether two optional values differ once defaults are normalized away
pub(crate) fn differs_from_default(left: Option<&str>, right: Option<&str>, default: &str) -> bool {
    normalized(left, default) != normalized(right, default)
}

/// Walk two name-keyed collections.
///
/// Left entries come first in their own order, as New or as the result of
/// `diff`; unmatched right entries follow as Deleted.
pub(crate) fn hash_diff<T, C, F>(
    left: &IndexMap<String, T>,
    right: &IndexMap<String, T>,
    mut diff: F,
) -> Vec<Diff<T, C>>
where
    T: Clone + Named,
    C: Changes,
    F: FnMut(&T, &T) -> Option<Diff<T, C>>,
{
    let mut diffs = Vec::new();

    for (name, source) in left {
        match right.get(name) {
            Some(target) => diffs.extend(diff(source, target)),
            None => {
                debug!(name = %source.name(), "only in source");
                diffs.push(Diff::created(source.clone()));
            }
        }
    }

    for (name, target) in right {
        if !left.contains_key(name) {
            debug!(name = %target.name(), "only in target");
            diffs.push(Diff::deleted(target.clone()));
        }
    }

    diffs
}
