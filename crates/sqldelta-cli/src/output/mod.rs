//! Output formatting

use std::fmt::Write;
use std::io::IsTerminal;

use miette::{IntoDiagnostic, Result};
use sqldelta_core::{
    Changes, DatabaseDef, DatabaseDiff, Diagnostic, Diff, DiffKind, Named, Severity,
};

use crate::args::OutputFormat;

/// Output formatter for diffs, schemas and diagnostics
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a database diff; `None` means the schemas are equivalent
    pub fn print_diff(&self, diff: Option<&DatabaseDiff>) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                match diff {
                    Some(diff) => {
                        print!("{}", render_diff(diff, std::io::stdout().is_terminal()));
                        eprintln!();
                        eprintln!("Found {} table change(s)", diff.tables().len());
                    }
                    None => eprintln!("Schemas are equivalent"),
                }
                Ok(())
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "equivalent": diff.is_none(),
                    "diff": diff,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output).into_diagnostic()?
                );
                Ok(())
            }
        }
    }

    /// Print a parsed schema
    pub fn print_schema(&self, database: &DatabaseDef) -> Result<()> {
        match self.format {
            OutputFormat::Human => print!("{}", render_schema(database)),
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(database).into_diagnostic()?
            ),
        }
        Ok(())
    }

    /// Print diagnostics in the configured format.
    ///
    /// Diagnostics always go to stderr; stdout carries the diff.
    pub fn print_diagnostics(&self, file_name: &str, diagnostics: &[Diagnostic], source: &str) {
        match self.format {
            OutputFormat::Human => print_human(file_name, diagnostics, source),
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "file": file_name,
                    "diagnostics": diagnostics
                });
                match serde_json::to_string_pretty(&output) {
                    Ok(json) => eprintln!("{}", json),
                    Err(e) => tracing::error!(error = %e, "failed to serialize diagnostics"),
                }
            }
        }
    }
}

fn print_human(file_name: &str, diagnostics: &[Diagnostic], source: &str) {
    for diag in diagnostics {
        let severity_str = match diag.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        eprintln!("{}[{}]: {}", severity_str, diag.code(), diag.message);

        if let Some(span) = &diag.span {
            let (line, col) = offset_to_line_col(source, span.offset);
            eprintln!("  --> {}:{}:{}", file_name, line, col);

            if let Some(source_line) = get_source_line(source, line) {
                eprintln!("   |");
                eprintln!("{:>3} | {}", line, source_line);

                let padding = " ".repeat(col.saturating_sub(1));
                let available = (source_line.len() + 1).saturating_sub(col);
                let underline = "^".repeat(span.length.min(available).max(1));
                eprintln!("   | {}{}", padding, underline);
            }
        }

        if let Some(help) = &diag.help {
            eprintln!("   = help: {}", help);
        }

        eprintln!();
    }
}

/// Render a diff as an indented tree of `+`/`-`/`~` entries
pub fn render_diff(diff: &DatabaseDiff, color: bool) -> String {
    let mut out = String::new();
    write_entry(&mut out, 0, "database", diff, |_| String::new(), color);

    for table in diff.tables() {
        write_entry(&mut out, 1, "table", table, |_| String::new(), color);
        for column in table.columns() {
            write_entry(
                &mut out,
                2,
                "column",
                column,
                |c| {
                    let mut text = c.declared_type().to_string();
                    if !c.nullable {
                        text.push_str(" NOT NULL");
                    }
                    text
                },
                color,
            );
        }
        for index in table.indexes() {
            write_entry(
                &mut out,
                2,
                "index",
                index,
                |i| format!("{} ({})", i.kind, i.fields.join(", ")),
                color,
            );
        }
        for relation in table.relations() {
            write_entry(
                &mut out,
                2,
                "foreign key",
                relation,
                |fk| {
                    format!(
                        "({}) -> {} ({})",
                        fk.source_field, fk.target_table, fk.target_field
                    )
                },
                color,
            );
        }
    }

    out
}

fn write_entry<T: Named, C: Changes>(
    out: &mut String,
    depth: usize,
    noun: &str,
    diff: &Diff<T, C>,
    describe: fn(&T) -> String,
    color: bool,
) {
    let kind = diff.kind();
    let marker = if color {
        let code = match kind {
            DiffKind::New => "32",
            DiffKind::Deleted => "31",
            DiffKind::Modified => "33",
        };
        format!("\x1b[{}m{}\x1b[0m", code, kind.symbol())
    } else {
        kind.symbol().to_string()
    };

    let detail = match (kind, diff.source(), diff.target()) {
        (DiffKind::Modified, Some(source), Some(target)) => {
            let names = diff.changes().names();
            let mut detail = if names.is_empty() {
                String::new()
            } else {
                format!(": {}", names.join(", "))
            };
            let (before, after) = (describe(source), describe(target));
            if before != after {
                let _ = write!(detail, " ({} -> {})", before, after);
            }
            detail
        }
        (_, Some(entity), _) | (_, None, Some(entity)) => {
            let text = describe(entity);
            if text.is_empty() {
                text
            } else {
                format!(" {}", text)
            }
        }
        (_, None, None) => String::new(),
    };

    let _ = writeln!(
        out,
        "{}{} {} {}{}",
        "  ".repeat(depth),
        marker,
        noun,
        diff.name(),
        detail
    );
}

/// Render a schema as a plain listing
pub fn render_schema(database: &DatabaseDef) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Schema Information:");
    let _ = writeln!(out, "==================");
    let name = if database.name.is_empty() {
        "(unnamed)"
    } else {
        database.name.as_str()
    };
    let _ = writeln!(out, "\nDatabase: {}", name);

    for (table_name, table) in &database.tables {
        let mut options = Vec::new();
        if let Some(engine) = &table.engine {
            options.push(format!("engine={}", engine));
        }
        if let Some(charset) = &table.charset {
            options.push(format!("charset={}", charset));
        }
        if let Some(collation) = &table.collation {
            options.push(format!("collate={}", collation));
        }
        if options.is_empty() {
            let _ = writeln!(out, "  Table: {}", table_name);
        } else {
            let _ = writeln!(out, "  Table: {} ({})", table_name, options.join(", "));
        }

        for (col_name, col) in &table.columns {
            let nullable = if col.nullable { "NULL" } else { "NOT NULL" };
            let mut line = format!("    - {} {} {}", col_name, col.declared_type(), nullable);
            if col.autoincrement {
                line.push_str(" AUTO_INCREMENT");
            }
            if let Some(default) = &col.default {
                let _ = write!(line, " DEFAULT '{}'", default);
            } else if col.default_timestamp {
                line.push_str(" DEFAULT CURRENT_TIMESTAMP");
            }
            let _ = writeln!(out, "{}", line);
        }
        for index in &table.indexes {
            let _ = writeln!(
                out,
                "    {} {} ({})",
                index.kind,
                index.name,
                index.fields.join(", ")
            );
        }
        for fk in table.foreign_keys.values() {
            let _ = writeln!(
                out,
                "    FOREIGN KEY {} ({}) REFERENCES {} ({})",
                fk.name, fk.source_field, fk.target_table, fk.target_field
            );
        }
    }

    out
}

/// Convert byte offset to line and column (1-indexed)
fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Get a specific line from source (1-indexed)
fn get_source_line(source: &str, line: usize) -> Option<&str> {
    source.lines().nth(line.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqldelta_core::{
        ColumnDef, DatabaseComparator, Defaults, ForeignKeyDef, IndexDef, SqlType, TableDef,
    };

    fn users(email_size: u32) -> TableDef {
        TableDef::new("users")
            .with_column(ColumnDef::new("id", SqlType::Int).with_size(11).not_null())
            .with_column(ColumnDef::new("email", SqlType::VarChar).with_size(email_size))
    }

    #[test]
    fn test_render_diff_tree() {
        let left = DatabaseDef::new("app")
            .with_table(users(255).with_index(IndexDef::unique(["email"], None)))
            .with_table(TableDef::new("orders"));
        let right = DatabaseDef::new("app")
            .with_table(users(128).with_foreign_key(ForeignKeyDef::new(
                "fk_self", "id", "users", "id",
            )))
            .with_table(TableDef::new("audit"));

        let diff = DatabaseComparator::new()
            .diff(&left, &right, &Defaults::default())
            .unwrap();

        assert_eq!(
            render_diff(&diff, false),
            "~ database app\n\
             \x20 ~ table users\n\
             \x20   ~ column email: size (varchar(255) -> varchar(128))\n\
             \x20   + index email UNIQUE KEY (email)\n\
             \x20   - foreign key fk_self (id) -> users (id)\n\
             \x20 + table orders\n\
             \x20 - table audit\n"
        );
    }

    #[test]
    fn test_render_schema() {
        let database = DatabaseDef::new("app").with_table(
            users(64)
                .with_engine("InnoDB")
                .with_index(IndexDef::primary(["id"])),
        );
        let text = render_schema(&database);

        assert!(text.contains("Database: app"));
        assert!(text.contains("  Table: users (engine=InnoDB)"));
        assert!(text.contains("    - id int(11) NOT NULL"));
        assert!(text.contains("    - email varchar(64) NULL"));
        assert!(text.contains("    PRIMARY KEY PRIMARY (id)"));
    }

    #[test]
    fn test_offset_to_line_col() {
        let source = "CREATE TABLE t (\n  a INT\n);";
        assert_eq!(offset_to_line_col(source, 0), (1, 1));
        assert_eq!(offset_to_line_col(source, 19), (2, 3));
        assert_eq!(get_source_line(source, 2), Some("  a INT"));
    }
}
