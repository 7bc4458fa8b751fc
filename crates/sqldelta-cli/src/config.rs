//! Configuration file handling

use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use sqldelta_core::{Defaults, SqlDialect};
use std::path::{Path, PathBuf};

use crate::args::OutputFormat;

/// Name of the configuration file looked up from the working directory
pub const CONFIG_FILE: &str = "sqldelta.toml";

/// Configuration for sqldelta
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Database name given to schemas read from DDL
    #[serde(default)]
    pub name: Option<String>,

    /// SQL dialect (mysql, mysql57, mariadb)
    #[serde(default)]
    pub dialect: Option<String>,

    /// Output format (human, json)
    #[serde(default)]
    pub format: Option<String>,

    /// Server defaults; unset entries come from the dialect
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        let config: Config = toml::from_str(&contents).into_diagnostic()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Try to find and load sqldelta.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let current_dir = std::env::current_dir().into_diagnostic()?;
        Self::find_from(current_dir)
    }

    fn find_from(mut dir: PathBuf) -> Result<Option<Self>> {
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Ok(Some(Self::from_file(&config_path)?));
            }

            // Try parent directory
            if !dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Merge CLI arguments into configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(
        mut self,
        dialect: &Option<String>,
        format: &Option<OutputFormat>,
        engine: &Option<String>,
        charset: &Option<String>,
        collation: &Option<String>,
    ) -> Self {
        if dialect.is_some() {
            self.dialect = dialect.clone();
        }

        if let Some(fmt) = format {
            self.format = Some(format!("{:?}", fmt).to_lowercase());
        }

        if engine.is_some() {
            self.defaults.engine = engine.clone();
        }

        if charset.is_some() {
            self.defaults.charset = charset.clone();
        }

        if collation.is_some() {
            self.defaults.collation = collation.clone();
        }

        self
    }

    pub fn dialect(&self) -> Result<SqlDialect> {
        match &self.dialect {
            Some(name) => name.parse().map_err(|e: String| miette::miette!(e)),
            None => Ok(SqlDialect::default()),
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.format.as_deref() {
            Some("json") => OutputFormat::Json,
            _ => OutputFormat::Human,
        }
    }

    /// Configured defaults, completed with the dialect's server defaults
    pub fn resolve_defaults(&self, dialect: SqlDialect) -> Defaults {
        let server = dialect.server_defaults();
        Defaults {
            engine: self.defaults.engine.clone().unwrap_or(server.engine),
            charset: self.defaults.charset.clone().unwrap_or(server.charset),
            collation: self.defaults.collation.clone().unwrap_or(server.collation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
            name = "shop"
            dialect = "mysql57"
            format = "json"

            [defaults]
            charset = "utf8"
            "#,
        )
        .unwrap();

        assert_eq!(config.name.as_deref(), Some("shop"));
        assert_eq!(config.dialect().unwrap(), SqlDialect::MySQL57);
        assert_eq!(config.output_format(), OutputFormat::Json);

        let defaults = config.resolve_defaults(SqlDialect::MySQL57);
        assert_eq!(defaults.engine, "InnoDB");
        assert_eq!(defaults.charset, "utf8");
        assert_eq!(defaults.collation, "latin1_swedish_ci");
    }

    #[test]
    fn test_args_take_precedence() {
        let config = Config {
            dialect: Some("mariadb".to_string()),
            format: Some("json".to_string()),
            ..Config::default()
        }
        .merge_with_args(
            &Some("mysql".to_string()),
            &Some(OutputFormat::Human),
            &None,
            &Some("utf8mb4".to_string()),
            &None,
        );

        assert_eq!(config.dialect().unwrap(), SqlDialect::MySQL);
        assert_eq!(config.output_format(), OutputFormat::Human);
        assert_eq!(config.defaults.charset.as_deref(), Some("utf8mb4"));
        assert!(config.defaults.engine.is_none());
    }

    #[test]
    fn test_unknown_dialect() {
        let config = Config {
            dialect: Some("oracle".to_string()),
            ..Config::default()
        };
        assert!(config.dialect().is_err());
    }

    #[test]
    fn test_find_in_parent_directory() {
        let root = std::env::temp_dir().join(format!("sqldelta-config-{}", std::process::id()));
        let nested = root.join("migrations").join("v2");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(CONFIG_FILE), "dialect = \"mariadb\"\n").unwrap();

        let config = Config::find_from(nested).unwrap().unwrap();
        assert_eq!(config.dialect().unwrap(), SqlDialect::MariaDB);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
