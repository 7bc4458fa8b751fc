//! Loading schema snapshots from DDL files, directories and JSON

use std::fs;
use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result, WrapErr};
use sqldelta_core::schema::SchemaBuilder;
use sqldelta_core::{DatabaseDef, SqlDialect};

use crate::output::OutputFormatter;

pub struct SnapshotLoader<'a> {
    dialect: SqlDialect,
    name: Option<&'a str>,
    formatter: &'a OutputFormatter,
    quiet: bool,
}

impl<'a> SnapshotLoader<'a> {
    pub fn new(dialect: SqlDialect, formatter: &'a OutputFormatter) -> Self {
        Self {
            dialect,
            name: None,
            formatter,
            quiet: false,
        }
    }

    /// Database name for schemas read from DDL without `CREATE DATABASE`
    pub fn with_name(mut self, name: Option<&'a str>) -> Self {
        self.name = name;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Load one side of a comparison
    pub fn load(&self, path: &Path) -> Result<DatabaseDef> {
        if is_json(path) {
            return self.load_json(path);
        }
        self.load_sql(&sql_files(path)?)
    }

    fn load_json(&self, path: &Path) -> Result<DatabaseDef> {
        let content = fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        let database: DatabaseDef = serde_json::from_str(&content)
            .into_diagnostic()
            .wrap_err_with(|| format!("invalid schema snapshot {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            tables = database.tables.len(),
            "loaded JSON snapshot"
        );
        Ok(database)
    }

    /// Build one schema from DDL files, applied in order
    pub fn load_sql(&self, files: &[PathBuf]) -> Result<DatabaseDef> {
        let mut builder = SchemaBuilder::with_dialect(self.dialect);
        if let Some(name) = self.name {
            builder = builder.with_name(name);
        }

        for file in files {
            let content = fs::read_to_string(file)
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to read {}", file.display()))?;
            let file_name = file.display().to_string();

            if let Err(diagnostics) = builder.parse(&content) {
                self.formatter
                    .print_diagnostics(&file_name, &diagnostics, &content);
                miette::bail!("failed to parse schema file {}", file_name);
            }

            let warnings = builder.take_diagnostics();
            if !warnings.is_empty() && !self.quiet {
                self.formatter
                    .print_diagnostics(&file_name, &warnings, &content);
            }
            tracing::debug!(file = %file_name, warnings = warnings.len(), "loaded schema file");
        }

        let (database, _) = builder.build();
        Ok(database)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// A file as given, or every `.sql` file below a directory in sorted order
pub fn sql_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let pattern = format!("{}/**/*.sql", path.display());
    let mut files: Vec<PathBuf> = glob::glob(&pattern).into_diagnostic()?.flatten().collect();
    files.sort();

    if files.is_empty() {
        miette::bail!("No .sql files found in {}", path.display());
    }
    Ok(files)
}
