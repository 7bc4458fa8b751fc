//! SQL dialect support

use sqlparser::dialect::{Dialect, MySqlDialect};
use std::str::FromStr;

use crate::compare::Defaults;

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    MySQL,
    MySQL57,
    MariaDB,
}

impl SqlDialect {
    /// Get the sqlparser dialect for parsing
    pub fn parser_dialect(&self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::MySQL | SqlDialect::MySQL57 | SqlDialect::MariaDB => {
                Box::new(MySqlDialect {})
            }
        }
    }

    /// Engine, charset and collation a server of this dialect applies when none is given
    pub fn server_defaults(&self) -> Defaults {
        match self {
            SqlDialect::MySQL => Defaults::new("InnoDB", "utf8mb4", "utf8mb4_0900_ai_ci"),
            SqlDialect::MySQL57 | SqlDialect::MariaDB => {
                Defaults::new("InnoDB", "latin1", "latin1_swedish_ci")
            }
        }
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mysql8" => Ok(SqlDialect::MySQL),
            "mysql57" | "mysql5.7" | "mysql5" => Ok(SqlDialect::MySQL57),
            "mariadb" => Ok(SqlDialect::MariaDB),
            "postgresql" | "postgres" | "pg" => Err(
                "PostgreSQL schemas are not supported. Supported dialects: mysql, mysql57, mariadb."
                    .to_string(),
            ),
            _ => Err(format!(
                "Unknown dialect: '{}'. Supported dialects: mysql, mysql57, mariadb.",
                s
            )),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::MySQL => write!(f, "mysql"),
            SqlDialect::MySQL57 => write!(f, "mysql57"),
            SqlDialect::MariaDB => write!(f, "mariadb"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dialect() {
        assert_eq!("MySQL8".parse::<SqlDialect>(), Ok(SqlDialect::MySQL));
        assert_eq!("mariadb".parse::<SqlDialect>(), Ok(SqlDialect::MariaDB));
        assert!("pg".parse::<SqlDialect>().is_err());
        assert!("oracle".parse::<SqlDialect>().is_err());
    }

    #[test]
    fn test_server_defaults() {
        let defaults = SqlDialect::MySQL57.server_defaults();
        assert_eq!(defaults.engine, "InnoDB");
        assert_eq!(defaults.charset, "latin1");
        assert_eq!(defaults.collation, "latin1_swedish_ci");
    }
}
