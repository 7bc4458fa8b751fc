//! Database comparison

use tracing::{debug, info};

use super::{differs_from_default, Defaults, TableComparator};
use crate::diff::{Changes, DatabaseChanges, DatabaseDiff};
use crate::schema::DatabaseDef;

/// Entry point of a schema comparison
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseComparator {
    tables: TableComparator,
}

impl DatabaseComparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diff(
        &self,
        left: &DatabaseDef,
        right: &DatabaseDef,
        defaults: &Defaults,
    ) -> Option<DatabaseDiff> {
        debug!(
            source = %left.name,
            target = %right.name,
            engine = %defaults.engine,
            charset = %defaults.charset,
            collation = %defaults.collation,
            "comparing databases"
        );

        let changes = DatabaseChanges {
            name: left.name != right.name,
            default_engine: differs_from_default(
                left.default_engine.as_deref(),
                right.default_engine.as_deref(),
                &defaults.engine,
            ),
            default_charset: differs_from_default(
                left.default_charset.as_deref(),
                right.default_charset.as_deref(),
                &defaults.charset,
            ),
            default_collate: differs_from_default(
                left.default_collation.as_deref(),
                right.default_collation.as_deref(),
                &defaults.collation,
            ),
            tables: self.tables.hash_diff(&left.tables, &right.tables, defaults),
        };

        let diff = DatabaseDiff::modified(left.clone(), right.clone(), changes);
        match &diff {
            Some(diff) => info!(
                changes = ?diff.changes().names(),
                tables = diff.tables().len(),
                "databases differ"
            ),
            None => info!("databases are equivalent"),
        }
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, TableDef};
    use crate::types::SqlType;

    fn shop() -> DatabaseDef {
        DatabaseDef::new("shop")
            .with_table(
                TableDef::new("users").with_column(ColumnDef::new("id", SqlType::Int).not_null()),
            )
            .with_table(TableDef::new("orders"))
    }

    #[test]
    fn test_identical_databases() {
        let defaults = Defaults::default();
        assert!(DatabaseComparator::new()
            .diff(&shop(), &shop(), &defaults)
            .is_none());
    }

    #[test]
    fn test_default_normalization() {
        let defaults = Defaults::new("InnoDB", "latin1", "latin1_swedish_ci");
        let explicit = shop()
            .with_default_engine("InnoDB")
            .with_default_charset("latin1");
        assert!(DatabaseComparator::new()
            .diff(&explicit, &shop(), &defaults)
            .is_none());

        let utf8 = shop().with_default_charset("utf8mb4");
        let diff = DatabaseComparator::new()
            .diff(&utf8, &shop(), &defaults)
            .unwrap();
        assert_eq!(diff.changes().names(), vec!["default_charset"]);
        assert!(!diff.is_tables());
    }

    #[test]
    fn test_name_change_only() {
        let renamed = DatabaseDef {
            name: "shop_v2".to_string(),
            ..shop()
        };
        let diff = DatabaseComparator::new()
            .diff(&shop(), &renamed, &Defaults::default())
            .unwrap();
        assert_eq!(diff.changes().names(), vec!["name"]);
    }

    #[test]
    fn test_tables_in_order() {
        let mut right = shop();
        right.tables.shift_remove("orders");
        right.add_table(TableDef::new("audit"));

        let diff = DatabaseComparator::new()
            .diff(&shop(), &right, &Defaults::default())
            .unwrap();
        let summary: Vec<(char, &str)> = diff
            .tables()
            .iter()
            .map(|d| (d.kind().symbol(), d.name()))
            .collect();
        assert_eq!(summary, vec![('+', "orders"), ('-', "audit")]);
    }
}
